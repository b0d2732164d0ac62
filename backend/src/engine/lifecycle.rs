//! PayrollRun lifecycle
//!
//! The state machine gating when calculation may run and when money may be
//! disbursed. Every mutating operation either returns the updated record or
//! fails with a structured error naming the violated rule, leaving the
//! run's prior state untouched.
//!
//! Role guards: a payroll specialist creates/submits/rejects drafts, a
//! payroll manager approves reviewed runs and freezes/unfreezes, finance
//! staff grant final approval and generate payslips. Approver-identity
//! checks are enforced independently of role: nobody approves a run they
//! created, and the finance approver must differ from the manager approver.

use chrono::{Datelike, NaiveDate, Utc};

use crate::calculator::proration::month_start;
use crate::calculator::rates::{HourlyRateCalculator, PayRateCalculator};
use crate::config::ConfigurationSnapshot;
use crate::events::{EventLog, PayrollEvent};
use crate::models::detail::EmployeePayrollDetail;
use crate::models::payslip::PaySlip;
use crate::models::run::{PaymentStatus, PayrollRun, PayrollRunStatus};
use crate::models::sidefund::{SideFund, SideFundError, SideFundKind};
use crate::providers::{AttendanceProvider, EmployeeDirectory, LeaveProvider, PenaltyLedger};
use crate::store::{PayrollStore, RefundRecord, RefundStatus};

use super::aggregator::{AggregationSummary, RunAggregator};
use super::{Actor, EngineError, Role};

fn side_fund_error(err: SideFundError) -> EngineError {
    match err {
        SideFundError::SelfApproval { .. } => EngineError::Authorization(err.to_string()),
        SideFundError::MissingReason => EngineError::Validation(err.to_string()),
        _ => EngineError::StateConflict(err.to_string()),
    }
}

/// The payroll run processing engine.
///
/// Owns the persisted state, the audit log, and the configuration snapshot;
/// borrows the external world through provider traits.
///
/// # Example
/// ```
/// use payroll_engine_core_rs::config::ConfigurationSnapshot;
/// use payroll_engine_core_rs::engine::PayrollEngine;
/// use payroll_engine_core_rs::providers::{
///     InMemoryAttendance, InMemoryDirectory, InMemoryLeave, InMemoryPenaltyLedger,
/// };
///
/// let engine = PayrollEngine::new(
///     ConfigurationSnapshot::default(),
///     Box::new(InMemoryDirectory::default()),
///     Box::new(InMemoryAttendance::new()),
///     Box::new(InMemoryLeave::new()),
///     Box::new(InMemoryPenaltyLedger::new()),
/// );
/// assert!(engine.list_runs().is_empty());
/// ```
pub struct PayrollEngine {
    config: ConfigurationSnapshot,
    store: PayrollStore,
    events: EventLog,

    directory: Box<dyn EmployeeDirectory>,
    attendance: Box<dyn AttendanceProvider>,
    leave: Box<dyn LeaveProvider>,
    penalty_ledger: Box<dyn PenaltyLedger>,
    rates: Box<dyn PayRateCalculator>,

    run_seq: u32,
}

impl PayrollEngine {
    pub fn new(
        config: ConfigurationSnapshot,
        directory: Box<dyn EmployeeDirectory>,
        attendance: Box<dyn AttendanceProvider>,
        leave: Box<dyn LeaveProvider>,
        penalty_ledger: Box<dyn PenaltyLedger>,
    ) -> Self {
        Self {
            config,
            store: PayrollStore::new(),
            events: EventLog::new(),
            directory,
            attendance,
            leave,
            penalty_ledger,
            rates: Box::new(HourlyRateCalculator),
            run_seq: 0,
        }
    }

    /// Swap in a custom minute-pricing calculator (builder style).
    pub fn with_rate_calculator(mut self, rates: Box<dyn PayRateCalculator>) -> Self {
        self.rates = rates;
        self
    }

    /// Replace the configuration snapshot. Takes effect for runs submitted
    /// after the call; a run mid-aggregation keeps the snapshot it started
    /// with.
    pub fn set_configuration(&mut self, config: ConfigurationSnapshot) {
        self.config = config;
    }

    pub fn configuration(&self) -> &ConfigurationSnapshot {
        &self.config
    }

    pub fn store(&self) -> &PayrollStore {
        &self.store
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn require_role(actor: &Actor, role: Role) -> Result<(), EngineError> {
        if actor.role != role {
            return Err(EngineError::Authorization(format!(
                "{} role required, caller {} has {}",
                role, actor.id, actor.role
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Run lifecycle
    // ------------------------------------------------------------------

    /// Open a DRAFT run for one entity and one calendar month.
    ///
    /// The period may be any day in the target month; it is normalized to
    /// the first. At most one non-REJECTED run may exist per (entity,
    /// month).
    pub fn create_run(
        &mut self,
        period: NaiveDate,
        entity: &str,
        entity_id: Option<&str>,
        specialist: &Actor,
    ) -> Result<PayrollRun, EngineError> {
        Self::require_role(specialist, Role::PayrollSpecialist)?;
        if entity.trim().is_empty() {
            return Err(EngineError::Validation("entity must not be empty".to_string()));
        }

        let period = month_start(period);
        if self.store.non_rejected_run_in_month(entity, period).is_some() {
            return Err(EngineError::DuplicatePeriod {
                entity: entity.to_string(),
                month: format!("{}-{:02}", period.year(), period.month()),
            });
        }

        self.run_seq += 1;
        let run_id = format!(
            "PR-{}-{:02}-{:04}",
            period.year(),
            period.month(),
            self.run_seq
        );
        let run = PayrollRun::new(
            run_id.clone(),
            period,
            entity.to_string(),
            entity_id.map(str::to_string),
            specialist.id.clone(),
        );
        tracing::info!(run_id = %run_id, entity, %period, "payroll run created");
        self.events.record(PayrollEvent::RunCreated {
            run_id: run_id.clone(),
            entity: entity.to_string(),
            period,
            specialist_id: specialist.id.clone(),
        });
        self.store.insert_run(run.clone());
        Ok(run)
    }

    /// Submit a DRAFT run for review, synchronously computing payroll for
    /// every eligible employee.
    ///
    /// The status flip to UNDER_REVIEW happens first, against the current
    /// status, so a concurrent second submit fails with a state conflict.
    /// If aggregation fails, the run rolls back to DRAFT with its exception
    /// counter incremented; it is never left stuck mid-processing.
    pub fn submit_for_review(
        &mut self,
        run_id: &str,
        specialist: &Actor,
    ) -> Result<PayrollRun, EngineError> {
        Self::require_role(specialist, Role::PayrollSpecialist)?;

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        run.transition(PayrollRunStatus::UnderReview)?;
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from: PayrollRunStatus::Draft,
            to: PayrollRunStatus::UnderReview,
        });

        let aggregator = RunAggregator {
            config: &self.config,
            directory: self.directory.as_ref(),
            attendance: self.attendance.as_ref(),
            leave: self.leave.as_ref(),
            penalty_ledger: self.penalty_ledger.as_ref(),
            rates: self.rates.as_ref(),
        };
        match aggregator.process(run_id, &mut self.store, &mut self.events) {
            Ok(AggregationSummary { .. }) => {}
            Err(err) => {
                tracing::warn!(run_id, %err, "aggregation failed; run rolled back to draft");
                if let Some(run) = self.store.run_mut(run_id) {
                    run.roll_back_to_draft();
                }
                self.events.record(PayrollEvent::AggregationFailed {
                    run_id: run_id.to_string(),
                    error: err.to_string(),
                });
                self.events.record(PayrollEvent::StatusChanged {
                    run_id: run_id.to_string(),
                    from: PayrollRunStatus::UnderReview,
                    to: PayrollRunStatus::Draft,
                });
                return Err(err);
            }
        }

        self.cloned_run(run_id)
    }

    /// Manager approval: UNDER_REVIEW → PENDING_FINANCE_APPROVAL.
    pub fn approve_by_manager(
        &mut self,
        run_id: &str,
        manager: &Actor,
    ) -> Result<PayrollRun, EngineError> {
        Self::require_role(manager, Role::PayrollManager)?;

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        if run.status() != PayrollRunStatus::UnderReview {
            return Err(EngineError::StateConflict(format!(
                "Cannot approve payroll in status {}. Must be in 'under review' status.",
                run.status()
            )));
        }
        if manager.id == run.specialist_id() {
            return Err(EngineError::Authorization(
                "approver cannot be the run's creating specialist".to_string(),
            ));
        }

        run.transition(PayrollRunStatus::PendingFinanceApproval)?;
        run.record_manager_approval(manager.id.clone(), Utc::now());
        tracing::info!(run_id, manager = %manager.id, "manager approved payroll run");
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from: PayrollRunStatus::UnderReview,
            to: PayrollRunStatus::PendingFinanceApproval,
        });
        self.cloned_run(run_id)
    }

    /// Finance approval: PENDING_FINANCE_APPROVAL → APPROVED, marking every
    /// payslip of the run PAID.
    pub fn approve_by_finance(
        &mut self,
        run_id: &str,
        finance: &Actor,
    ) -> Result<PayrollRun, EngineError> {
        Self::require_role(finance, Role::FinanceStaff)?;

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        if run.status() != PayrollRunStatus::PendingFinanceApproval {
            return Err(EngineError::StateConflict(format!(
                "Cannot approve payroll in status {}. Must be in 'pending finance approval' status.",
                run.status()
            )));
        }
        if finance.id == run.specialist_id() {
            return Err(EngineError::Authorization(
                "approver cannot be the run's creating specialist".to_string(),
            ));
        }
        if run.manager_id() == Some(finance.id.as_str()) {
            return Err(EngineError::Authorization(
                "finance approver must differ from the manager approver".to_string(),
            ));
        }

        run.transition(PayrollRunStatus::Approved)?;
        run.record_finance_approval(finance.id.clone(), Utc::now());

        let paid = self.store.mark_run_payslips_paid(run_id);
        tracing::info!(run_id, finance = %finance.id, paid, "finance approved payroll run");
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from: PayrollRunStatus::PendingFinanceApproval,
            to: PayrollRunStatus::Approved,
        });
        self.events.record(PayrollEvent::PayslipsMarkedPaid {
            run_id: run_id.to_string(),
            count: paid,
        });
        self.cloned_run(run_id)
    }

    /// Reject a run, with a mandatory reason.
    ///
    /// Who may reject depends on where the run sits: the specialist at
    /// DRAFT/UNDER_REVIEW, the manager at UNDER_REVIEW, finance at
    /// PENDING_FINANCE_APPROVAL.
    pub fn reject(
        &mut self,
        run_id: &str,
        actor: &Actor,
        reason: &str,
    ) -> Result<PayrollRun, EngineError> {
        if reason.trim().is_empty() {
            return Err(EngineError::Validation(
                "rejection requires a reason".to_string(),
            ));
        }

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        let from = run.status();
        let allowed = match from {
            PayrollRunStatus::Draft => actor.role == Role::PayrollSpecialist,
            PayrollRunStatus::UnderReview => {
                actor.role == Role::PayrollSpecialist || actor.role == Role::PayrollManager
            }
            PayrollRunStatus::PendingFinanceApproval => actor.role == Role::FinanceStaff,
            // Let the transition table produce the state-conflict error
            _ => true,
        };
        if !allowed {
            return Err(EngineError::Authorization(format!(
                "{} may not reject a payroll run in status {}",
                actor.role, from
            )));
        }

        run.transition(PayrollRunStatus::Rejected)?;
        run.record_rejection(reason.to_string());
        tracing::info!(run_id, actor = %actor.id, reason, "payroll run rejected");
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from,
            to: PayrollRunStatus::Rejected,
        });
        self.events.record(PayrollEvent::RunRejected {
            run_id: run_id.to_string(),
            actor_id: actor.id.clone(),
            reason: reason.to_string(),
        });
        self.cloned_run(run_id)
    }

    /// Re-open a REJECTED run for editing: REJECTED → DRAFT.
    ///
    /// The duplicate-period invariant is re-checked, since a replacement
    /// run may have been created for the same month in the meantime.
    pub fn reopen_run(&mut self, run_id: &str, specialist: &Actor) -> Result<PayrollRun, EngineError> {
        Self::require_role(specialist, Role::PayrollSpecialist)?;

        let (entity, period) = {
            let run = self
                .store
                .run(run_id)
                .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
            (run.entity().to_string(), run.period())
        };
        if self.store.non_rejected_run_in_month(&entity, period).is_some() {
            return Err(EngineError::DuplicatePeriod {
                entity,
                month: format!("{}-{:02}", period.year(), period.month()),
            });
        }

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        run.transition(PayrollRunStatus::Draft)?;
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from: PayrollRunStatus::Rejected,
            to: PayrollRunStatus::Draft,
        });
        self.cloned_run(run_id)
    }

    /// Freeze an approved (or unfrozen) run: → LOCKED.
    pub fn freeze(&mut self, run_id: &str, manager: &Actor) -> Result<PayrollRun, EngineError> {
        Self::require_role(manager, Role::PayrollManager)?;

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        let from = run.status();
        run.transition(PayrollRunStatus::Locked)?;
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from,
            to: PayrollRunStatus::Locked,
        });
        self.cloned_run(run_id)
    }

    /// Unfreeze a LOCKED run, with a mandatory reason stored verbatim.
    /// Payslips are not touched.
    pub fn unfreeze(
        &mut self,
        run_id: &str,
        manager: &Actor,
        reason: &str,
    ) -> Result<PayrollRun, EngineError> {
        Self::require_role(manager, Role::PayrollManager)?;
        if reason.trim().is_empty() {
            return Err(EngineError::Validation(
                "unlocking requires a reason".to_string(),
            ));
        }

        let run = self
            .store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        run.transition(PayrollRunStatus::Unlocked)?;
        run.record_unlock(reason.to_string());
        self.events.record(PayrollEvent::StatusChanged {
            run_id: run_id.to_string(),
            from: PayrollRunStatus::Locked,
            to: PayrollRunStatus::Unlocked,
        });
        self.events.record(PayrollEvent::RunUnlocked {
            run_id: run_id.to_string(),
            manager_id: manager.id.clone(),
            reason: reason.to_string(),
        });
        self.cloned_run(run_id)
    }

    /// Regenerate the payslips of a post-approval run from its stored
    /// details (finance distribution step).
    ///
    /// Payment status follows the run: regenerated slips of a PAID run come
    /// back PAID.
    pub fn generate_payslips(
        &mut self,
        run_id: &str,
        finance: &Actor,
    ) -> Result<Vec<PaySlip>, EngineError> {
        Self::require_role(finance, Role::FinanceStaff)?;

        let run = self
            .store
            .run(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        let status = run.status();
        let payment_status = run.payment_status();
        if !matches!(
            status,
            PayrollRunStatus::Approved | PayrollRunStatus::Locked | PayrollRunStatus::Unlocked
        ) {
            return Err(EngineError::StateConflict(format!(
                "Cannot generate payslips in status {}. Run must be approved first.",
                status
            )));
        }

        let details = self.store.details_for_run(run_id);
        if details.is_empty() {
            return Err(EngineError::StateConflict(format!(
                "no employee payroll details found for run {}",
                run_id
            )));
        }

        let mut payslips: Vec<PaySlip> = details.iter().map(PaySlip::from_detail).collect();
        if payment_status == PaymentStatus::Paid {
            for slip in &mut payslips {
                slip.mark_paid();
            }
        }
        let count = payslips.len();
        self.store
            .replace_payslips_for_run(run_id, payslips.clone());
        tracing::info!(run_id, count, "payslips regenerated");
        self.events.record(PayrollEvent::PayslipsGenerated {
            run_id: run_id.to_string(),
            count,
        });
        Ok(payslips)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_run(&self, run_id: &str) -> Result<&PayrollRun, EngineError> {
        self.store
            .run(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))
    }

    pub fn list_runs(&self) -> Vec<&PayrollRun> {
        self.store.runs().collect()
    }

    pub fn list_payslips(&self, run_id: &str) -> Result<Vec<&PaySlip>, EngineError> {
        self.get_run(run_id)?;
        Ok(self.store.payslips_for_run(run_id))
    }

    pub fn get_payslip(&self, payslip_id: &str) -> Result<&PaySlip, EngineError> {
        self.store
            .payslip(payslip_id)
            .ok_or_else(|| EngineError::NotFound(format!("payslip {}", payslip_id)))
    }

    pub fn employee_payslip(
        &self,
        run_id: &str,
        employee_id: &str,
    ) -> Result<&PaySlip, EngineError> {
        self.get_run(run_id)?;
        self.store
            .employee_payslip(run_id, employee_id)
            .ok_or_else(|| {
                EngineError::NotFound(format!(
                    "payslip for employee {} in run {}",
                    employee_id, run_id
                ))
            })
    }

    /// Detail rows that carry an exception note, for review screens.
    pub fn run_exceptions(&self, run_id: &str) -> Result<Vec<&EmployeePayrollDetail>, EngineError> {
        self.get_run(run_id)?;
        Ok(self
            .store
            .details_for_run(run_id)
            .iter()
            .filter(|d| d.has_exceptions())
            .collect())
    }

    // ------------------------------------------------------------------
    // Side funds and refunds
    // ------------------------------------------------------------------

    /// Register a PENDING side-fund grant (onboarding/offboarding feed).
    pub fn grant_side_fund(
        &mut self,
        kind: SideFundKind,
        employee_id: &str,
        amount: i64,
    ) -> Result<String, EngineError> {
        if amount <= 0 {
            return Err(EngineError::Validation(
                "side-fund amount must be positive".to_string(),
            ));
        }
        if self.directory.find(employee_id)?.is_none() {
            return Err(EngineError::NotFound(format!("employee {}", employee_id)));
        }
        Ok(self
            .store
            .insert_side_fund(SideFund::new(kind, employee_id.to_string(), amount)))
    }

    pub fn pending_side_funds(&self) -> Vec<&SideFund> {
        self.store.pending_side_funds()
    }

    /// Approve a PENDING side-fund grant. The approver must be an active
    /// employee and may not be the grantee.
    pub fn approve_side_fund(
        &mut self,
        side_fund_id: &str,
        approver_id: &str,
    ) -> Result<(), EngineError> {
        self.require_active_reviewer(approver_id)?;
        let fund = self
            .store
            .side_fund_mut(side_fund_id)
            .ok_or_else(|| EngineError::NotFound(format!("side-fund {}", side_fund_id)))?;
        fund.approve(approver_id, Utc::now()).map_err(side_fund_error)?;
        self.events.record(PayrollEvent::SideFundApproved {
            side_fund_id: side_fund_id.to_string(),
            approver_id: approver_id.to_string(),
        });
        Ok(())
    }

    /// Reject a PENDING side-fund grant; the reason is mandatory.
    pub fn reject_side_fund(
        &mut self,
        side_fund_id: &str,
        approver_id: &str,
        reason: &str,
    ) -> Result<(), EngineError> {
        if reason.trim().is_empty() {
            return Err(EngineError::Validation(
                "rejection requires a reason".to_string(),
            ));
        }
        self.require_active_reviewer(approver_id)?;
        let fund = self
            .store
            .side_fund_mut(side_fund_id)
            .ok_or_else(|| EngineError::NotFound(format!("side-fund {}", side_fund_id)))?;
        fund.reject(approver_id, reason, Utc::now())
            .map_err(side_fund_error)?;
        self.events.record(PayrollEvent::SideFundRejected {
            side_fund_id: side_fund_id.to_string(),
            approver_id: approver_id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    /// Register an approved refund for payout in the given month.
    pub fn record_refund(
        &mut self,
        employee_id: &str,
        period: NaiveDate,
        amount: i64,
    ) -> Result<String, EngineError> {
        if amount <= 0 {
            return Err(EngineError::Validation(
                "refund amount must be positive".to_string(),
            ));
        }
        Ok(self.store.insert_refund(RefundRecord {
            id: uuid::Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            period,
            amount,
            status: RefundStatus::Approved,
            paid_in_run: None,
        }))
    }

    fn require_active_reviewer(&self, approver_id: &str) -> Result<(), EngineError> {
        match self.directory.find(approver_id)? {
            Some(emp) if emp.is_active() => Ok(()),
            Some(_) => Err(EngineError::Authorization(format!(
                "approver {} is not an active employee",
                approver_id
            ))),
            None => Err(EngineError::NotFound(format!("employee {}", approver_id))),
        }
    }

    fn cloned_run(&self, run_id: &str) -> Result<PayrollRun, EngineError> {
        self.store
            .run(run_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))
    }
}
