//! Persisted payroll state
//!
//! Holds every durable record the engine owns: runs, per-employee payroll
//! details, payslips, side-fund grants, and refund records. Runs are never
//! deleted, only superseded; details are written once per (employee, run)
//! and never rewritten.
//!
//! The whole store serializes through serde, which doubles as the
//! checkpoint format (`to_json_snapshot` / `from_json_snapshot`).
//!
//! # Critical Invariants
//!
//! 1. At most one non-REJECTED run per (entity, calendar month)
//! 2. Details for a run exist only after exactly one successful aggregation
//! 3. A side-fund record is PAID in at most one run, ever

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::detail::EmployeePayrollDetail;
use crate::models::payslip::PaySlip;
use crate::models::run::{PayrollRun, PayrollRunStatus};
use crate::models::sidefund::{SideFund, SideFundError, SideFundKind, SideFundStatus};

/// Refund approved for payout through payroll (from the tracking subsystem).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub id: String,
    pub employee_id: String,

    /// Period the refund belongs to (any day in the target month)
    pub period: NaiveDate,

    /// Refund amount (i64 cents)
    pub amount: i64,

    pub status: RefundStatus,

    pub paid_in_run: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundStatus {
    Approved,
    Paid,
}

/// Saved fund state for aggregation rollback.
#[derive(Debug, Clone)]
pub(crate) struct FundsCheckpoint {
    side_funds: HashMap<String, SideFund>,
    refunds: HashMap<String, RefundRecord>,
}

/// In-process store of all durable payroll records.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PayrollStore {
    runs: HashMap<String, PayrollRun>,

    /// Details keyed by run id
    details: HashMap<String, Vec<EmployeePayrollDetail>>,

    payslips: HashMap<String, PaySlip>,

    /// Payslip ids per run, in insertion order
    payslips_by_run: HashMap<String, Vec<String>>,

    side_funds: HashMap<String, SideFund>,

    refunds: HashMap<String, RefundRecord>,
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

impl PayrollStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    pub(crate) fn insert_run(&mut self, run: PayrollRun) {
        self.runs.insert(run.run_id().to_string(), run);
    }

    pub fn run(&self, run_id: &str) -> Option<&PayrollRun> {
        self.runs.get(run_id)
    }

    pub(crate) fn run_mut(&mut self, run_id: &str) -> Option<&mut PayrollRun> {
        self.runs.get_mut(run_id)
    }

    pub fn runs(&self) -> impl Iterator<Item = &PayrollRun> {
        self.runs.values()
    }

    /// Duplicate-period guard lookup: any run for this entity and calendar
    /// month whose status is not REJECTED.
    pub fn non_rejected_run_in_month(
        &self,
        entity: &str,
        period: NaiveDate,
    ) -> Option<&PayrollRun> {
        self.runs.values().find(|r| {
            r.entity() == entity
                && same_month(r.period(), period)
                && r.status() != PayrollRunStatus::Rejected
        })
    }

    // ------------------------------------------------------------------
    // Details
    // ------------------------------------------------------------------

    /// Idempotency guard lookup for the aggregator.
    pub fn has_details_for_run(&self, run_id: &str) -> bool {
        self.details
            .get(run_id)
            .map(|d| !d.is_empty())
            .unwrap_or(false)
    }

    pub(crate) fn insert_detail(&mut self, detail: EmployeePayrollDetail) {
        self.details
            .entry(detail.run_id.clone())
            .or_default()
            .push(detail);
    }

    pub fn details_for_run(&self, run_id: &str) -> &[EmployeePayrollDetail] {
        self.details.get(run_id).map(|d| d.as_slice()).unwrap_or(&[])
    }

    /// Base salary on the employee's most recent detail from a run whose
    /// period precedes `before_period`. Feeds the salary-spike check.
    pub fn latest_prior_base_salary(
        &self,
        employee_id: &str,
        before_period: NaiveDate,
    ) -> Option<i64> {
        let mut best: Option<(NaiveDate, i64)> = None;
        for (run_id, details) in &self.details {
            let Some(run) = self.runs.get(run_id) else {
                continue;
            };
            if run.period() >= before_period {
                continue;
            }
            for d in details {
                if d.employee_id != employee_id {
                    continue;
                }
                if best.map(|(p, _)| run.period() > p).unwrap_or(true) {
                    best = Some((run.period(), d.base_salary));
                }
            }
        }
        best.map(|(_, salary)| salary)
    }

    // ------------------------------------------------------------------
    // Payslips
    // ------------------------------------------------------------------

    pub(crate) fn insert_payslip(&mut self, payslip: PaySlip) {
        self.payslips_by_run
            .entry(payslip.run_id.clone())
            .or_default()
            .push(payslip.id.clone());
        self.payslips.insert(payslip.id.clone(), payslip);
    }

    /// Drop and re-create the payslips of one run (finance regeneration).
    pub(crate) fn replace_payslips_for_run(&mut self, run_id: &str, payslips: Vec<PaySlip>) {
        if let Some(ids) = self.payslips_by_run.remove(run_id) {
            for id in ids {
                self.payslips.remove(&id);
            }
        }
        for slip in payslips {
            self.insert_payslip(slip);
        }
    }

    pub fn payslip(&self, payslip_id: &str) -> Option<&PaySlip> {
        self.payslips.get(payslip_id)
    }

    pub fn payslips_for_run(&self, run_id: &str) -> Vec<&PaySlip> {
        self.payslips_by_run
            .get(run_id)
            .map(|ids| ids.iter().filter_map(|id| self.payslips.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn employee_payslip(&self, run_id: &str, employee_id: &str) -> Option<&PaySlip> {
        self.payslips_for_run(run_id)
            .into_iter()
            .find(|p| p.employee_id == employee_id)
    }

    /// Flip every payslip of the run to PAID; returns how many were touched.
    pub(crate) fn mark_run_payslips_paid(&mut self, run_id: &str) -> usize {
        let ids = self.payslips_by_run.get(run_id).cloned().unwrap_or_default();
        let mut count = 0;
        for id in ids {
            if let Some(slip) = self.payslips.get_mut(&id) {
                slip.mark_paid();
                count += 1;
            }
        }
        count
    }

    // ------------------------------------------------------------------
    // Side funds
    // ------------------------------------------------------------------

    pub(crate) fn insert_side_fund(&mut self, fund: SideFund) -> String {
        let id = fund.id().to_string();
        self.side_funds.insert(id.clone(), fund);
        id
    }

    pub fn side_fund(&self, id: &str) -> Option<&SideFund> {
        self.side_funds.get(id)
    }

    pub(crate) fn side_fund_mut(&mut self, id: &str) -> Option<&mut SideFund> {
        self.side_funds.get_mut(id)
    }

    pub fn pending_side_funds(&self) -> Vec<&SideFund> {
        self.side_funds
            .values()
            .filter(|f| f.status() == SideFundStatus::Pending)
            .collect()
    }

    /// Whether any record (in any status) exists for this employee/kind.
    /// Auto-creation checks this to stay idempotent.
    pub fn has_side_fund(&self, employee_id: &str, kind: SideFundKind) -> bool {
        self.side_funds
            .values()
            .any(|f| f.employee_id() == employee_id && f.kind() == kind)
    }

    /// Claim the employee's approved grant of `kind`, if one exists.
    ///
    /// The status flip to PAID happens here, in the same step that hands
    /// the amount back for the payslip write. At most one grant per
    /// employee/kind is claimed per call.
    pub(crate) fn claim_side_fund(
        &mut self,
        employee_id: &str,
        kind: SideFundKind,
        run_id: &str,
    ) -> Result<Option<(String, i64)>, SideFundError> {
        let approved_id = self
            .side_funds
            .values()
            .find(|f| {
                f.employee_id() == employee_id
                    && f.kind() == kind
                    && f.status() == SideFundStatus::Approved
            })
            .map(|f| f.id().to_string());

        match approved_id {
            Some(id) => {
                let fund = self
                    .side_funds
                    .get_mut(&id)
                    .ok_or(SideFundError::NotApproved {
                        status: SideFundStatus::Pending,
                    })?;
                let amount = fund.claim_for_payment(run_id)?;
                Ok(Some((id, amount)))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Refunds
    // ------------------------------------------------------------------

    pub(crate) fn insert_refund(&mut self, refund: RefundRecord) -> String {
        let id = refund.id.clone();
        self.refunds.insert(id.clone(), refund);
        id
    }

    pub fn refund(&self, id: &str) -> Option<&RefundRecord> {
        self.refunds.get(id)
    }

    /// Sum and mark paid every approved refund of the employee for the
    /// run's calendar month.
    pub(crate) fn claim_refunds(
        &mut self,
        employee_id: &str,
        period: NaiveDate,
        run_id: &str,
    ) -> i64 {
        let mut total = 0;
        for refund in self.refunds.values_mut() {
            if refund.employee_id == employee_id
                && refund.status == RefundStatus::Approved
                && same_month(refund.period, period)
            {
                refund.status = RefundStatus::Paid;
                refund.paid_in_run = Some(run_id.to_string());
                total += refund.amount;
            }
        }
        total
    }

    // ------------------------------------------------------------------
    // Fund checkpointing
    // ------------------------------------------------------------------

    /// Copy of the mutable fund state (side-funds + refunds), taken before
    /// aggregation so a provider outage mid-run can be undone without
    /// leaving claimed-but-unrecorded money behind.
    pub(crate) fn funds_checkpoint(&self) -> FundsCheckpoint {
        FundsCheckpoint {
            side_funds: self.side_funds.clone(),
            refunds: self.refunds.clone(),
        }
    }

    pub(crate) fn restore_funds(&mut self, checkpoint: FundsCheckpoint) {
        self.side_funds = checkpoint.side_funds;
        self.refunds = checkpoint.refunds;
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Serialize the full store for checkpointing.
    pub fn to_json_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a store from a snapshot produced by [`Self::to_json_snapshot`].
    pub fn from_json_snapshot(snapshot: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(snapshot)
    }
}
