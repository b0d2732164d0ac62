//! EmployeePayrollDetail model
//!
//! Full calculation record for one employee in one run: every element that
//! entered the net-pay computation is stored alongside the result, so a
//! reviewer can reconstruct the number without re-running anything.
//!
//! Created once per (employee, run) and never mutated afterwards;
//! reprocessing a run that already has details is rejected upstream.
//!
//! CRITICAL: All money values are i64 (cents)

use serde::{Deserialize, Serialize};

/// Bank linkage status captured at calculation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankStatus {
    Valid,
    Missing,
}

/// Tax/insurance deduction lines, each with the rule that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeductionsBreakdown {
    pub tax: i64,

    /// Which tax rule fired, and through which match path
    pub tax_reason: Option<String>,

    pub insurance: i64,
    pub insurance_reason: Option<String>,

    /// Total of all penalty lines (mirrored from the penalties breakdown)
    pub penalties: i64,

    /// Unpaid leave days already handled through day proration
    pub unpaid_leave_days: u32,
    pub unpaid_leave_note: Option<String>,

    /// tax + insurance + penalties
    pub total: i64,
}

/// Penalty lines, each individually reasoned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltiesBreakdown {
    /// From the external misconduct-penalty ledger
    pub misconduct: i64,
    pub misconduct_reason: Option<String>,

    /// Missing-work minutes priced at the hourly rate
    pub missing_work: i64,
    pub missing_work_reason: Option<String>,

    /// Lateness minutes priced at 50% of the hourly rate
    pub lateness: i64,
    pub lateness_reason: Option<String>,

    pub total: i64,
}

/// Overtime earned from attendance, priced at 150% of the hourly rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OvertimeDetails {
    pub minutes: i64,
    pub amount: i64,
    pub reason: Option<String>,
}

/// The attendance numbers the calculation actually used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSnapshot {
    pub actual_work_minutes: i64,
    pub scheduled_work_minutes: i64,
    pub missing_work_minutes: i64,
    pub overtime_minutes: i64,
    pub lateness_minutes: i64,
    pub working_days: u32,
    pub unpaid_leave_days: u32,
}

/// Calculation record for one employee in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeePayrollDetail {
    /// Record id (UUID)
    pub id: String,

    pub employee_id: String,
    pub run_id: String,

    /// Resolved base salary (pay grade / override / minimum wage / default)
    pub base_salary: i64,

    /// Resolved allowance sum
    pub allowances: i64,

    /// Prorated gross: (base + allowances) scaled by the proration ratio
    pub gross_pay: i64,

    pub deductions: DeductionsBreakdown,
    pub penalties: PenaltiesBreakdown,
    pub overtime: OvertimeDetails,
    pub attendance: AttendanceSnapshot,

    pub refunds: i64,

    /// Signing bonus claimed this run
    pub bonus: i64,

    /// Termination/resignation benefit claimed this run
    pub benefit: i64,

    /// gross_pay - (tax + insurance)
    pub net_salary: i64,

    /// net_salary - penalties + overtime + refunds + bonus + benefit,
    /// after the wage-floor / non-negative clamps
    pub net_pay: i64,

    pub bank_status: BankStatus,

    /// Pipe-joined issue notes; populated when anything went wrong or was
    /// flagged for this employee
    pub exceptions: Option<String>,
}

impl EmployeePayrollDetail {
    /// Record written when the calculation itself failed.
    ///
    /// Amounts are zeroed, the bank status is MISSING, and the error text
    /// lands in `exceptions`. The run keeps going; this row is what the
    /// exception counter counts.
    pub fn degenerate(
        employee_id: String,
        run_id: String,
        base_salary: i64,
        error: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id,
            run_id,
            base_salary,
            allowances: 0,
            gross_pay: 0,
            deductions: DeductionsBreakdown::default(),
            penalties: PenaltiesBreakdown::default(),
            overtime: OvertimeDetails::default(),
            attendance: AttendanceSnapshot::default(),
            refunds: 0,
            bonus: 0,
            benefit: 0,
            net_salary: 0,
            net_pay: 0,
            bank_status: BankStatus::Missing,
            exceptions: Some(error),
        }
    }

    /// Whether this row counts toward the run's exception total.
    pub fn has_exceptions(&self) -> bool {
        self.exceptions.as_deref().map(|e| !e.is_empty()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_detail_is_zeroed_and_flagged() {
        let d = EmployeePayrollDetail::degenerate(
            "E-1".to_string(),
            "PR-2025-06-0001".to_string(),
            600_000,
            "CONTRACT_INACTIVE_OR_EXPIRED".to_string(),
        );
        assert_eq!(d.net_pay, 0);
        assert_eq!(d.gross_pay, 0);
        assert_eq!(d.bank_status, BankStatus::Missing);
        assert!(d.has_exceptions());
        assert_eq!(d.base_salary, 600_000);
    }
}
