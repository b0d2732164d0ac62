//! PayrollRun model
//!
//! One payroll computation cycle for one organizational unit and one
//! calendar month. The run owns:
//! - The lifecycle status (state machine below)
//! - Aggregated counts and money totals written by the aggregator
//! - Approval actor references and timestamps
//!
//! # State machine
//!
//! ```text
//! DRAFT → UNDER_REVIEW → PENDING_FINANCE_APPROVAL → APPROVED → LOCKED ⇄ UNLOCKED
//!   ↓           ↓                    ↓
//! REJECTED  REJECTED             REJECTED
//!   ↓
//! DRAFT (re-edit)
//! ```
//!
//! Any transition outside this table is rejected with an error naming the
//! attempted edge, and the status is left unchanged.
//!
//! CRITICAL: All money values are i64 (cents)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayrollRunStatus {
    /// Created by a payroll specialist; editable, not yet computed
    Draft,

    /// Submitted; computation done, awaiting payroll manager review
    UnderReview,

    /// Manager approved; awaiting finance staff approval
    PendingFinanceApproval,

    /// Finance approved; payslips marked paid
    Approved,

    /// Frozen by a payroll manager
    Locked,

    /// Unfrozen by a payroll manager (reason recorded verbatim)
    Unlocked,

    /// Rejected; superseded by a fresh draft on re-edit
    Rejected,
}

impl PayrollRunStatus {
    /// Human-readable status label used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollRunStatus::Draft => "draft",
            PayrollRunStatus::UnderReview => "under review",
            PayrollRunStatus::PendingFinanceApproval => "pending finance approval",
            PayrollRunStatus::Approved => "approved",
            PayrollRunStatus::Locked => "locked",
            PayrollRunStatus::Unlocked => "unlocked",
            PayrollRunStatus::Rejected => "rejected",
        }
    }

    /// Allowed next states, exactly the transition table.
    pub fn allowed_next(&self) -> &'static [PayrollRunStatus] {
        use PayrollRunStatus::*;
        match self {
            Draft => &[UnderReview, Rejected],
            UnderReview => &[PendingFinanceApproval, Rejected],
            PendingFinanceApproval => &[Approved, Rejected],
            Approved => &[Locked],
            Locked => &[Unlocked],
            Unlocked => &[Locked],
            Rejected => &[Draft],
        }
    }

    /// Check a single edge against the transition table.
    pub fn can_transition_to(&self, next: PayrollRunStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl std::fmt::Display for PayrollRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run-level payment status, flipped by finance approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Illegal lifecycle transition, naming the attempted edge.
#[derive(Debug, Error, PartialEq)]
#[error("invalid payroll run transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: PayrollRunStatus,
    pub to: PayrollRunStatus,
}

/// Aggregated money totals folded from employee payroll details.
///
/// All values i64 cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Prorated gross pay across all processed employees
    pub gross: i64,

    /// Tax + insurance + penalties
    pub deductions: i64,

    pub tax: i64,
    pub insurance: i64,
    pub penalties: i64,
    pub allowances: i64,
    pub base_salary: i64,
    pub overtime: i64,
    pub refunds: i64,
}

/// Cap on the irregularity list carried on the run document.
///
/// The count keeps tracking past the cap; only the list is truncated.
pub const IRREGULARITY_LIST_CAP: usize = 100;

/// One payroll run.
///
/// Fields that participate in invariants (status, totals, counts) are
/// private; lifecycle and aggregation code inside the crate mutates them
/// through dedicated methods.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use payroll_engine_core_rs::models::run::{PayrollRun, PayrollRunStatus};
///
/// let period = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
/// let run = PayrollRun::new(
///     "PR-2025-06-0001".to_string(),
///     period,
///     "Engineering".to_string(),
///     None,
///     "SPEC-1".to_string(),
/// );
/// assert_eq!(run.status(), PayrollRunStatus::Draft);
/// assert_eq!(run.total_net_pay(), 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Human-facing run label, e.g. "PR-2025-06-0001"
    run_id: String,

    /// First day of the target month
    period: NaiveDate,

    status: PayrollRunStatus,

    /// Entity/department display name
    entity: String,

    /// Department id used for employee filtering, when known
    entity_id: Option<String>,

    /// Processed employee count
    employees: u32,

    /// Details that ended up carrying an exception note
    exceptions: u32,

    totals: RunTotals,

    /// Final amount to be disbursed (i64 cents)
    total_net_pay: i64,

    /// Detected irregularities, capped at [`IRREGULARITY_LIST_CAP`]
    irregularities: Vec<String>,

    /// Full irregularity count, including entries past the cap
    irregularities_count: u32,

    payment_status: PaymentStatus,

    /// Creating payroll specialist
    specialist_id: String,

    manager_id: Option<String>,
    finance_id: Option<String>,

    manager_approved_at: Option<DateTime<Utc>>,
    finance_approved_at: Option<DateTime<Utc>>,

    rejection_reason: Option<String>,
    unlock_reason: Option<String>,
}

impl PayrollRun {
    /// Create a new run in DRAFT.
    pub fn new(
        run_id: String,
        period: NaiveDate,
        entity: String,
        entity_id: Option<String>,
        specialist_id: String,
    ) -> Self {
        Self {
            run_id,
            period,
            status: PayrollRunStatus::Draft,
            entity,
            entity_id,
            employees: 0,
            exceptions: 0,
            totals: RunTotals::default(),
            total_net_pay: 0,
            irregularities: Vec::new(),
            irregularities_count: 0,
            payment_status: PaymentStatus::Pending,
            specialist_id,
            manager_id: None,
            finance_id: None,
            manager_approved_at: None,
            finance_approved_at: None,
            rejection_reason: None,
            unlock_reason: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn period(&self) -> NaiveDate {
        self.period
    }

    pub fn status(&self) -> PayrollRunStatus {
        self.status
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn employees(&self) -> u32 {
        self.employees
    }

    pub fn exceptions(&self) -> u32 {
        self.exceptions
    }

    pub fn totals(&self) -> &RunTotals {
        &self.totals
    }

    pub fn total_net_pay(&self) -> i64 {
        self.total_net_pay
    }

    pub fn irregularities(&self) -> &[String] {
        &self.irregularities
    }

    pub fn irregularities_count(&self) -> u32 {
        self.irregularities_count
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn specialist_id(&self) -> &str {
        &self.specialist_id
    }

    pub fn manager_id(&self) -> Option<&str> {
        self.manager_id.as_deref()
    }

    pub fn finance_id(&self) -> Option<&str> {
        self.finance_id.as_deref()
    }

    pub fn manager_approved_at(&self) -> Option<DateTime<Utc>> {
        self.manager_approved_at
    }

    pub fn finance_approved_at(&self) -> Option<DateTime<Utc>> {
        self.finance_approved_at
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn unlock_reason(&self) -> Option<&str> {
        self.unlock_reason.as_deref()
    }

    /// Move along one edge of the transition table.
    ///
    /// On an illegal edge the status is left unchanged and the attempted
    /// edge is named in the error.
    pub(crate) fn transition(&mut self, next: PayrollRunStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Roll back a failed submission to DRAFT, bypassing the table.
    ///
    /// Only the aggregation failure path uses this; the run must never be
    /// left stuck in UNDER_REVIEW with no computed details.
    pub(crate) fn roll_back_to_draft(&mut self) {
        self.status = PayrollRunStatus::Draft;
        self.exceptions = self.exceptions.saturating_add(1);
    }

    pub(crate) fn record_manager_approval(&mut self, manager_id: String, at: DateTime<Utc>) {
        self.manager_id = Some(manager_id);
        self.manager_approved_at = Some(at);
    }

    pub(crate) fn record_finance_approval(&mut self, finance_id: String, at: DateTime<Utc>) {
        self.finance_id = Some(finance_id);
        self.finance_approved_at = Some(at);
        self.payment_status = PaymentStatus::Paid;
    }

    pub(crate) fn record_rejection(&mut self, reason: String) {
        self.rejection_reason = Some(reason);
    }

    pub(crate) fn record_unlock(&mut self, reason: String) {
        self.unlock_reason = Some(reason);
    }

    /// Write aggregation results onto the run document.
    pub(crate) fn apply_aggregation(
        &mut self,
        employees: u32,
        exceptions: u32,
        totals: RunTotals,
        total_net_pay: i64,
        irregularities: Vec<String>,
    ) {
        self.employees = employees;
        self.exceptions = exceptions;
        self.totals = totals;
        self.total_net_pay = total_net_pay;
        self.irregularities_count = irregularities.len() as u32;
        let mut list = irregularities;
        list.truncate(IRREGULARITY_LIST_CAP);
        self.irregularities = list;
    }
}
