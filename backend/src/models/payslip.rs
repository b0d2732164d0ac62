//! PaySlip model
//!
//! Employee-facing projection of one `EmployeePayrollDetail`, shaped for
//! display: an earnings section, a deductions section, and the headline
//! numbers. Owned by the run; immutable once created except for the
//! payment-status transition flipped by finance approval.
//!
//! CRITICAL: All money values are i64 (cents)

use serde::{Deserialize, Serialize};

use super::detail::EmployeePayrollDetail;

/// Payment status of a single payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaySlipPaymentStatus {
    Pending,
    Paid,
}

/// Earnings section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsDetails {
    pub base_salary: i64,
    pub allowances: i64,
    pub overtime: i64,
    pub bonus: i64,
    pub benefit: i64,
    pub refunds: i64,
}

/// Deductions section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionsDetails {
    pub tax: i64,
    pub insurance: i64,
    pub penalties: i64,
}

/// One payslip, derived from a calculation record.
///
/// # Example
/// ```
/// use payroll_engine_core_rs::models::detail::EmployeePayrollDetail;
/// use payroll_engine_core_rs::models::payslip::{PaySlip, PaySlipPaymentStatus};
///
/// let detail = EmployeePayrollDetail::degenerate(
///     "E-1".to_string(),
///     "PR-2025-06-0001".to_string(),
///     0,
///     "CONTRACT_INACTIVE_OR_EXPIRED".to_string(),
/// );
/// let slip = PaySlip::from_detail(&detail);
/// assert_eq!(slip.payment_status(), PaySlipPaymentStatus::Pending);
/// assert_eq!(slip.net_pay, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaySlip {
    /// Payslip id (UUID)
    pub id: String,

    pub employee_id: String,
    pub run_id: String,

    pub earnings: EarningsDetails,
    pub deductions: DeductionsDetails,

    /// Prorated gross plus the post-gross earnings (overtime, bonus,
    /// benefit, refunds)
    pub total_gross: i64,

    /// tax + insurance + penalties
    pub total_deductions: i64,

    /// Copied from the detail's final net pay (clamps included)
    pub net_pay: i64,

    payment_status: PaySlipPaymentStatus,
}

impl PaySlip {
    /// Project a calculation record into its employee-facing shape.
    pub fn from_detail(detail: &EmployeePayrollDetail) -> Self {
        let earnings = EarningsDetails {
            base_salary: detail.base_salary,
            allowances: detail.allowances,
            overtime: detail.overtime.amount,
            bonus: detail.bonus,
            benefit: detail.benefit,
            refunds: detail.refunds,
        };
        let deductions = DeductionsDetails {
            tax: detail.deductions.tax,
            insurance: detail.deductions.insurance,
            penalties: detail.penalties.total,
        };
        let total_gross = detail.gross_pay
            + detail.overtime.amount
            + detail.bonus
            + detail.benefit
            + detail.refunds;
        let total_deductions = deductions.tax + deductions.insurance + deductions.penalties;

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: detail.employee_id.clone(),
            run_id: detail.run_id.clone(),
            earnings,
            deductions,
            total_gross,
            total_deductions,
            net_pay: detail.net_pay,
            payment_status: PaySlipPaymentStatus::Pending,
        }
    }

    pub fn payment_status(&self) -> PaySlipPaymentStatus {
        self.payment_status
    }

    /// Flip PENDING → PAID. Idempotent.
    pub(crate) fn mark_paid(&mut self) {
        self.payment_status = PaySlipPaymentStatus::Paid;
    }
}
