//! Employee payroll calculator
//!
//! Turns one employee, one period, the configuration snapshot, and the
//! external summaries into exactly one `EmployeePayrollDetail` and one
//! `PaySlip`. The steps are strictly ordered: tax and insurance depend on
//! proration, penalties and overtime depend on attendance, net pay depends
//! on everything before it.
//!
//! The calculator knows nothing about the run state machine. A failure here
//! is a `CalculationError` for the aggregator to isolate; the only variant
//! that escalates run-wide is a provider outage.
//!
//! CRITICAL: All money values are i64 (cents)

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::{ConfigurationSnapshot, TaxMatch};
use crate::models::detail::{
    AttendanceSnapshot, BankStatus, DeductionsBreakdown, EmployeePayrollDetail, OvertimeDetails,
    PenaltiesBreakdown,
};
use crate::models::employee::Employee;
use crate::models::payslip::PaySlip;
use crate::models::sidefund::{SideFund, SideFundError, SideFundKind};
use crate::providers::{AttendanceProvider, LeaveProvider, PenaltyLedger, ProviderError};
use crate::store::PayrollStore;

pub mod proration;
pub mod rates;

pub use rates::{HourlyRateCalculator, PayRateCalculator};

use proration::{month_end, month_start, prorate};

/// Base-salary increase versus the prior run that gets flagged, in percent.
pub const SALARY_SPIKE_THRESHOLD_PCT: i64 = 25;

/// Per-employee calculation failure.
///
/// Everything except `Provider` is isolated by the aggregator into a
/// degenerate detail row; a provider outage aborts the whole submission.
#[derive(Debug, Error)]
pub enum CalculationError {
    #[error("employee {employee_id} has an inactive or expired contract")]
    InactiveEmployee { employee_id: String },

    #[error("inconsistent employee record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("side-fund claim failed: {0}")]
    SideFund(#[from] SideFundError),
}

/// A side-fund flipped to PAID during this calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedSideFund {
    pub side_fund_id: String,
    pub kind: SideFundKind,
    pub amount: i64,
}

/// Everything one successful calculation produced.
#[derive(Debug)]
pub struct CalculationOutcome {
    pub detail: EmployeePayrollDetail,
    pub payslip: PaySlip,

    /// Human-readable anomalies for the run-level irregularity list
    pub irregularities: Vec<String>,

    pub claims: Vec<ClaimedSideFund>,

    /// Side-fund ids auto-created from a mid-period hire/termination
    pub auto_created_side_funds: Vec<String>,
}

fn scale(amount: i64, ratio: f64) -> i64 {
    (amount as f64 * ratio).round() as i64
}

fn pct(amount: i64, rate_pct: f64) -> i64 {
    (amount as f64 * rate_pct / 100.0).round() as i64
}

/// The per-employee calculation.
///
/// Borrows the configuration snapshot and providers for the duration of one
/// run; mutable store access is needed only for side-fund/refund claims and
/// the idempotent side-fund auto-creation.
pub struct PayrollCalculator<'a> {
    config: &'a ConfigurationSnapshot,
    attendance: &'a dyn AttendanceProvider,
    leave: &'a dyn LeaveProvider,
    penalty_ledger: &'a dyn PenaltyLedger,
    rates: &'a dyn PayRateCalculator,
}

impl<'a> PayrollCalculator<'a> {
    pub fn new(
        config: &'a ConfigurationSnapshot,
        attendance: &'a dyn AttendanceProvider,
        leave: &'a dyn LeaveProvider,
        penalty_ledger: &'a dyn PenaltyLedger,
        rates: &'a dyn PayRateCalculator,
    ) -> Self {
        Self {
            config,
            attendance,
            leave,
            penalty_ledger,
            rates,
        }
    }

    /// Run the calculation steps for one employee.
    pub fn calculate(
        &self,
        employee: &Employee,
        run_id: &str,
        period: NaiveDate,
        store: &mut PayrollStore,
    ) -> Result<CalculationOutcome, CalculationError> {
        // Step 1: eligibility
        if !employee.is_active() {
            return Err(CalculationError::InactiveEmployee {
                employee_id: employee.id.clone(),
            });
        }
        if let (Some(hire), Some(term)) = (employee.hire_date, employee.termination_date) {
            if term < hire {
                return Err(CalculationError::InvalidRecord(format!(
                    "employee {}: termination date {term} precedes hire date {hire}",
                    employee.id
                )));
            }
        }

        let mut irregularities = Vec::new();
        let mut exception_codes: Vec<&'static str> = Vec::new();
        let mut auto_created = Vec::new();

        // Step 2: base compensation
        let (base_salary, salary_source) = self.config.resolve_base_salary(employee);
        let allowances = self.config.allowances_for(&employee.id);
        tracing::debug!(
            employee_id = %employee.id,
            base_salary,
            source = ?salary_source,
            "resolved base compensation"
        );

        // Step 3: day proration and side-fund auto-creation
        let start = month_start(period);
        let end = month_end(period);
        let unpaid_days = self.leave.unpaid_days(&employee.id, start, end)?;
        let proration = prorate(employee.hire_date, employee.termination_date, period, unpaid_days);

        if proration.hired_mid_period {
            if let Some(offer) = employee.signing_bonus_offer {
                if !store.has_side_fund(&employee.id, SideFundKind::SigningBonus) {
                    let id = store.insert_side_fund(SideFund::new(
                        SideFundKind::SigningBonus,
                        employee.id.clone(),
                        offer,
                    ));
                    auto_created.push(id);
                }
            }
        }
        if proration.terminated_mid_period {
            if let Some(benefit) = employee.termination_benefit {
                if !store.has_side_fund(&employee.id, SideFundKind::TerminationBenefit) {
                    let id = store.insert_side_fund(SideFund::new(
                        SideFundKind::TerminationBenefit,
                        employee.id.clone(),
                        benefit,
                    ));
                    auto_created.push(id);
                }
            }
        }

        // Step 4: gross pay; work-ratio proration wins over the day ratio
        let summary = self.attendance.for_period(&employee.id, start, end)?;
        let ratio = match &summary {
            Some(s) if s.scheduled_work_minutes > 0 => {
                (s.actual_work_minutes as f64 / s.scheduled_work_minutes as f64).min(1.0)
            }
            _ => proration.day_ratio(),
        };
        let gross_pay = scale(base_salary + allowances, ratio);

        // Step 5: tax on base salary
        let (tax, tax_reason) = match self.config.match_tax_rule(base_salary) {
            TaxMatch::Band(rule) => (
                pct(base_salary, rule.rate_pct),
                Some(format!(
                    "rule '{}' at {}% (salary band match)",
                    rule.name, rule.rate_pct
                )),
            ),
            TaxMatch::FirstApproved(rule) => (
                pct(base_salary, rule.rate_pct),
                Some(format!(
                    "rule '{}' at {}% (no band matched; first approved rule)",
                    rule.name, rule.rate_pct
                )),
            ),
            TaxMatch::None => (0, None),
        };

        // Step 6: insurance on prorated gross
        let (insurance, insurance_reason) = match self.config.match_insurance_bracket(base_salary) {
            Some(bracket) => (
                pct(gross_pay, bracket.employee_rate_pct),
                Some(format!(
                    "bracket '{}' at {}% of prorated gross",
                    bracket.name, bracket.employee_rate_pct
                )),
            ),
            None => (0, None),
        };

        // Step 7: penalties
        let misconduct_entries = self
            .penalty_ledger
            .misconduct_penalties(&employee.id, start)?;
        let misconduct: i64 = misconduct_entries.iter().map(|p| p.amount).sum();
        let misconduct_reason = if misconduct_entries.is_empty() {
            None
        } else {
            Some(
                misconduct_entries
                    .iter()
                    .map(|p| p.reason.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };

        let att = summary.unwrap_or_default();
        let working_days = att.working_days;

        let missing_work =
            self.rates
                .missing_work_penalty(base_salary, working_days, att.missing_work_minutes);
        let missing_work_reason = (missing_work > 0).then(|| {
            format!(
                "{} missing-work minutes at hourly rate",
                att.missing_work_minutes
            )
        });

        let lateness =
            self.rates
                .lateness_penalty(base_salary, working_days, att.lateness_minutes);
        let lateness_reason = (lateness > 0)
            .then(|| format!("{} lateness minutes at 50% hourly rate", att.lateness_minutes));

        let penalties_total = misconduct + missing_work + lateness;

        // Step 8: overtime
        let overtime_amount =
            self.rates
                .overtime_pay(base_salary, working_days, att.overtime_minutes);
        let overtime = OvertimeDetails {
            minutes: att.overtime_minutes.max(0),
            amount: overtime_amount,
            reason: (overtime_amount > 0).then(|| {
                format!(
                    "{} overtime minutes at 150% hourly rate",
                    att.overtime_minutes
                )
            }),
        };

        // Step 9: refunds, signing bonus, termination benefit. Each found
        // side-fund flips to PAID in the same step that records its amount.
        let refunds = store.claim_refunds(&employee.id, period, run_id);
        let mut claims = Vec::new();
        let bonus = match store.claim_side_fund(&employee.id, SideFundKind::SigningBonus, run_id)? {
            Some((id, amount)) => {
                claims.push(ClaimedSideFund {
                    side_fund_id: id,
                    kind: SideFundKind::SigningBonus,
                    amount,
                });
                amount
            }
            None => 0,
        };
        let benefit =
            match store.claim_side_fund(&employee.id, SideFundKind::TerminationBenefit, run_id)? {
                Some((id, amount)) => {
                    claims.push(ClaimedSideFund {
                        side_fund_id: id,
                        kind: SideFundKind::TerminationBenefit,
                        amount,
                    });
                    amount
                }
                None => 0,
            };

        // Step 10: net
        let net_salary = gross_pay - (tax + insurance);
        let mut net_pay = net_salary - penalties_total + overtime.amount + refunds + bonus + benefit;

        // Step 11: minimum-wage floor, then the non-negative clamp. The
        // floor check returns early, so an employee below both thresholds
        // records only the wage-floor irregularity.
        let prorated_minimum = scale(self.config.minimum_wage, ratio);
        if self.config.minimum_wage > 0 && net_pay < prorated_minimum {
            irregularities.push(format!(
                "employee {}: net pay {} below prorated minimum wage {}; clamped to floor",
                employee.id, net_pay, prorated_minimum
            ));
            exception_codes.push("BELOW_MINIMUM_WAGE");
            net_pay = prorated_minimum;
        } else if net_pay < 0 {
            irregularities.push(format!(
                "employee {}: negative net pay {}; clamped to zero",
                employee.id, net_pay
            ));
            exception_codes.push("NEGATIVE_NET_PAY");
            net_pay = 0;
        }

        // Step 12: bank validation flags, never aborts
        let bank_status = if employee.has_bank_account() {
            BankStatus::Valid
        } else {
            irregularities.push(format!("employee {}: missing bank account", employee.id));
            exception_codes.push("MISSING_BANK_DETAILS");
            BankStatus::Missing
        };

        // Step 13: salary-spike irregularity vs the most recent prior detail
        if let Some(prior) = store.latest_prior_base_salary(&employee.id, period) {
            if prior > 0 && base_salary * 100 > prior * (100 + SALARY_SPIKE_THRESHOLD_PCT) {
                irregularities.push(format!(
                    "employee {}: base salary {} is more than {}% above previous {}",
                    employee.id, base_salary, SALARY_SPIKE_THRESHOLD_PCT, prior
                ));
            }
        }

        // Step 14: assemble the records
        let deductions = DeductionsBreakdown {
            tax,
            tax_reason,
            insurance,
            insurance_reason,
            penalties: penalties_total,
            unpaid_leave_days: proration.unpaid_leave_days,
            unpaid_leave_note: (proration.unpaid_leave_days > 0).then(|| {
                format!(
                    "{} unpaid leave day(s) prorated out of gross",
                    proration.unpaid_leave_days
                )
            }),
            total: tax + insurance + penalties_total,
        };
        let penalties = PenaltiesBreakdown {
            misconduct,
            misconduct_reason,
            missing_work,
            missing_work_reason,
            lateness,
            lateness_reason,
            total: penalties_total,
        };
        let attendance_snapshot = AttendanceSnapshot {
            actual_work_minutes: att.actual_work_minutes,
            scheduled_work_minutes: att.scheduled_work_minutes,
            missing_work_minutes: att.missing_work_minutes,
            overtime_minutes: att.overtime_minutes,
            lateness_minutes: att.lateness_minutes,
            working_days: att.working_days,
            unpaid_leave_days: proration.unpaid_leave_days,
        };

        let detail = EmployeePayrollDetail {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee.id.clone(),
            run_id: run_id.to_string(),
            base_salary,
            allowances,
            gross_pay,
            deductions,
            penalties,
            overtime,
            attendance: attendance_snapshot,
            refunds,
            bonus,
            benefit,
            net_salary,
            net_pay,
            bank_status,
            exceptions: (!exception_codes.is_empty()).then(|| exception_codes.join("|")),
        };
        let payslip = PaySlip::from_detail(&detail);

        Ok(CalculationOutcome {
            detail,
            payslip,
            irregularities,
            claims,
            auto_created_side_funds: auto_created,
        })
    }
}
