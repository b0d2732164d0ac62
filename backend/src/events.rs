//! Audit event log
//!
//! Every significant state change in the engine lands here: lifecycle
//! transitions, approvals, aggregation results, irregularities, and
//! side-fund movements. The log exists for auditing and for tests that
//! assert *which* decision path fired (e.g. the employee-selection
//! fallback), not for notification delivery.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::aggregator::EmployeeSelection;
use crate::models::run::PayrollRunStatus;

/// One audited state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PayrollEvent {
    RunCreated {
        run_id: String,
        entity: String,
        period: NaiveDate,
        specialist_id: String,
    },

    StatusChanged {
        run_id: String,
        from: PayrollRunStatus,
        to: PayrollRunStatus,
    },

    RunRejected {
        run_id: String,
        actor_id: String,
        reason: String,
    },

    /// Aggregation failed and the run was rolled back to DRAFT
    AggregationFailed {
        run_id: String,
        error: String,
    },

    AggregationCompleted {
        run_id: String,
        selection: EmployeeSelection,
        employees: u32,
        exceptions: u32,
        total_net_pay: i64,
    },

    IrregularityRecorded {
        run_id: String,
        employee_id: String,
        description: String,
    },

    SideFundApproved {
        side_fund_id: String,
        approver_id: String,
    },

    SideFundRejected {
        side_fund_id: String,
        approver_id: String,
        reason: String,
    },

    /// A grant was auto-created from a mid-period hire or termination
    SideFundAutoCreated {
        side_fund_id: String,
        employee_id: String,
        run_id: String,
    },

    SideFundClaimed {
        side_fund_id: String,
        run_id: String,
        employee_id: String,
        amount: i64,
    },

    PayslipsMarkedPaid {
        run_id: String,
        count: usize,
    },

    PayslipsGenerated {
        run_id: String,
        count: usize,
    },

    RunUnlocked {
        run_id: String,
        manager_id: String,
        reason: String,
    },
}

impl PayrollEvent {
    /// Run this event belongs to, when it belongs to one.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            PayrollEvent::RunCreated { run_id, .. }
            | PayrollEvent::StatusChanged { run_id, .. }
            | PayrollEvent::RunRejected { run_id, .. }
            | PayrollEvent::AggregationFailed { run_id, .. }
            | PayrollEvent::AggregationCompleted { run_id, .. }
            | PayrollEvent::IrregularityRecorded { run_id, .. }
            | PayrollEvent::SideFundAutoCreated { run_id, .. }
            | PayrollEvent::SideFundClaimed { run_id, .. }
            | PayrollEvent::PayslipsMarkedPaid { run_id, .. }
            | PayrollEvent::PayslipsGenerated { run_id, .. }
            | PayrollEvent::RunUnlocked { run_id, .. } => Some(run_id),
            PayrollEvent::SideFundApproved { .. } | PayrollEvent::SideFundRejected { .. } => None,
        }
    }
}

/// Append-only event log.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<PayrollEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: PayrollEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PayrollEvent] {
        &self.events
    }

    /// Events attached to one run, in order.
    pub fn for_run(&self, run_id: &str) -> Vec<&PayrollEvent> {
        self.events
            .iter()
            .filter(|e| e.run_id() == Some(run_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_run_filters_by_run_id() {
        let mut log = EventLog::new();
        log.record(PayrollEvent::StatusChanged {
            run_id: "PR-1".to_string(),
            from: PayrollRunStatus::Draft,
            to: PayrollRunStatus::UnderReview,
        });
        log.record(PayrollEvent::SideFundApproved {
            side_fund_id: "SF-1".to_string(),
            approver_id: "MGR-1".to_string(),
        });
        log.record(PayrollEvent::PayslipsMarkedPaid {
            run_id: "PR-2".to_string(),
            count: 3,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_run("PR-1").len(), 1);
        assert_eq!(log.for_run("PR-2").len(), 1);
    }
}
