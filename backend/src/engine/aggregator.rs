//! Run aggregator
//!
//! Drives the calculator across every eligible employee of a run and folds
//! the results into the run-level totals. Three contracts matter here:
//!
//! 1. **Failure isolation**: one bad employee record never aborts the run.
//!    The failure becomes a degenerate detail row (zeroed amounts, MISSING
//!    bank status, the error text in `exceptions`) and is counted.
//! 2. **Exactly-once computation**: a run with existing detail rows refuses
//!    to reprocess; retries require a fresh run.
//! 3. **Abort-clean provider outages**: a collaborator outage aborts the
//!    whole submission. Fund claims made before the outage are rolled back
//!    from a checkpoint, and no detail rows are written, so the DRAFT run
//!    can be resubmitted once the collaborator recovers.
//!
//! Totals are folded once, after every employee has been computed, never
//! accumulated across partially finished work.

use serde::{Deserialize, Serialize};

use crate::calculator::{CalculationError, PayrollCalculator};
use crate::config::ConfigurationSnapshot;
use crate::events::{EventLog, PayrollEvent};
use crate::models::detail::EmployeePayrollDetail;
use crate::models::employee::Employee;
use crate::models::payslip::PaySlip;
use crate::models::run::RunTotals;
use crate::providers::{AttendanceProvider, EmployeeDirectory, LeaveProvider, PenaltyLedger};
use crate::calculator::rates::PayRateCalculator;
use crate::store::PayrollStore;

use super::EngineError;

/// How the run's employee set was selected.
///
/// The fallback chain (department id → department name → everyone active)
/// is part of the aggregator's contract; making it a tagged value lets
/// tests assert which level fired instead of inferring it from counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeSelection {
    /// Matched the run's department id
    ById(String),

    /// No id match; matched the entity name case-insensitively
    ByName(String),

    /// Neither resolved; every active employee is in scope
    AllActive,
}

/// What one aggregation produced, echoed onto the run document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSummary {
    pub selection: EmployeeSelection,
    pub employees: u32,
    pub exceptions: u32,
    pub total_net_pay: i64,
}

pub(crate) struct RunAggregator<'a> {
    pub config: &'a ConfigurationSnapshot,
    pub directory: &'a dyn EmployeeDirectory,
    pub attendance: &'a dyn AttendanceProvider,
    pub leave: &'a dyn LeaveProvider,
    pub penalty_ledger: &'a dyn PenaltyLedger,
    pub rates: &'a dyn PayRateCalculator,
}

impl RunAggregator<'_> {
    /// Process one run end to end.
    pub(crate) fn process(
        &self,
        run_id: &str,
        store: &mut PayrollStore,
        events: &mut EventLog,
    ) -> Result<AggregationSummary, EngineError> {
        let run = store
            .run(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        let period = run.period();
        let entity = run.entity().to_string();
        let entity_id = run.entity_id().map(str::to_string);

        if store.has_details_for_run(run_id) {
            return Err(EngineError::AlreadyProcessed(run_id.to_string()));
        }

        let all_active = self.directory.active_employees()?;
        let (employees, selection) = select_employees(all_active, entity_id.as_deref(), &entity);
        tracing::info!(
            run_id,
            ?selection,
            count = employees.len(),
            "selected employees for aggregation"
        );

        let calculator = PayrollCalculator::new(
            self.config,
            self.attendance,
            self.leave,
            self.penalty_ledger,
            self.rates,
        );

        // Fund state is restored wholesale if a provider outage aborts the
        // run partway through the employee list.
        let checkpoint = store.funds_checkpoint();

        let mut rows: Vec<(EmployeePayrollDetail, PaySlip)> = Vec::with_capacity(employees.len());
        let mut irregularities: Vec<String> = Vec::new();
        let mut staged_events: Vec<PayrollEvent> = Vec::new();

        for employee in &employees {
            match calculator.calculate(employee, run_id, period, store) {
                Ok(outcome) => {
                    for id in &outcome.auto_created_side_funds {
                        staged_events.push(PayrollEvent::SideFundAutoCreated {
                            side_fund_id: id.clone(),
                            employee_id: employee.id.clone(),
                            run_id: run_id.to_string(),
                        });
                    }
                    for claim in &outcome.claims {
                        staged_events.push(PayrollEvent::SideFundClaimed {
                            side_fund_id: claim.side_fund_id.clone(),
                            run_id: run_id.to_string(),
                            employee_id: employee.id.clone(),
                            amount: claim.amount,
                        });
                    }
                    for description in &outcome.irregularities {
                        staged_events.push(PayrollEvent::IrregularityRecorded {
                            run_id: run_id.to_string(),
                            employee_id: employee.id.clone(),
                            description: description.clone(),
                        });
                    }
                    irregularities.extend(outcome.irregularities);
                    rows.push((outcome.detail, outcome.payslip));
                }
                Err(CalculationError::Provider(err)) => {
                    tracing::warn!(
                        run_id,
                        employee_id = %employee.id,
                        %err,
                        "provider outage during aggregation; rolling back fund claims"
                    );
                    store.restore_funds(checkpoint);
                    return Err(err.into());
                }
                Err(err) => {
                    tracing::warn!(
                        run_id,
                        employee_id = %employee.id,
                        %err,
                        "employee calculation failed; recording exception row"
                    );
                    let (base_salary, _) = self.config.resolve_base_salary(employee);
                    let detail = EmployeePayrollDetail::degenerate(
                        employee.id.clone(),
                        run_id.to_string(),
                        base_salary,
                        err.to_string(),
                    );
                    let payslip = PaySlip::from_detail(&detail);
                    rows.push((detail, payslip));
                }
            }
        }

        // All employees computed; now write rows and fold totals once.
        let mut totals = RunTotals::default();
        let mut total_net_pay = 0i64;
        let mut exceptions = 0u32;
        let processed = rows.len() as u32;

        for (detail, payslip) in rows {
            totals.gross += detail.gross_pay;
            totals.deductions += detail.deductions.total;
            totals.tax += detail.deductions.tax;
            totals.insurance += detail.deductions.insurance;
            totals.penalties += detail.penalties.total;
            totals.allowances += detail.allowances;
            totals.base_salary += detail.base_salary;
            totals.overtime += detail.overtime.amount;
            totals.refunds += detail.refunds;
            total_net_pay += detail.net_pay;
            if detail.has_exceptions() {
                exceptions += 1;
            }
            store.insert_detail(detail);
            store.insert_payslip(payslip);
        }

        for event in staged_events {
            events.record(event);
        }

        let run = store
            .run_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("payroll run {}", run_id)))?;
        run.apply_aggregation(processed, exceptions, totals, total_net_pay, irregularities);

        let summary = AggregationSummary {
            selection: selection.clone(),
            employees: processed,
            exceptions,
            total_net_pay,
        };
        events.record(PayrollEvent::AggregationCompleted {
            run_id: run_id.to_string(),
            selection,
            employees: processed,
            exceptions,
            total_net_pay,
        });

        Ok(summary)
    }
}

/// Apply the selection fallback chain to the active employee set.
fn select_employees(
    all_active: Vec<Employee>,
    entity_id: Option<&str>,
    entity_name: &str,
) -> (Vec<Employee>, EmployeeSelection) {
    if let Some(id) = entity_id {
        let by_id: Vec<Employee> = all_active
            .iter()
            .filter(|e| e.department_id.as_deref() == Some(id))
            .cloned()
            .collect();
        if !by_id.is_empty() {
            return (by_id, EmployeeSelection::ById(id.to_string()));
        }
    }

    let by_name: Vec<Employee> = all_active
        .iter()
        .filter(|e| {
            e.department_name
                .as_deref()
                .map(|n| n.eq_ignore_ascii_case(entity_name))
                .unwrap_or(false)
        })
        .cloned()
        .collect();
    if !by_name.is_empty() {
        return (by_name, EmployeeSelection::ByName(entity_name.to_string()));
    }

    (all_active, EmployeeSelection::AllActive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emp(id: &str, dept_id: Option<&str>, dept_name: Option<&str>) -> Employee {
        let mut e = Employee::new(id.to_string(), id.to_string());
        e.department_id = dept_id.map(str::to_string);
        e.department_name = dept_name.map(str::to_string);
        e
    }

    #[test]
    fn test_selection_prefers_department_id() {
        let employees = vec![
            emp("E-1", Some("D-1"), Some("Engineering")),
            emp("E-2", Some("D-2"), Some("Sales")),
        ];
        let (selected, selection) = select_employees(employees, Some("D-1"), "Engineering");
        assert_eq!(selection, EmployeeSelection::ById("D-1".to_string()));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "E-1");
    }

    #[test]
    fn test_selection_falls_back_to_name_match() {
        let employees = vec![
            emp("E-1", None, Some("engineering")),
            emp("E-2", None, Some("Sales")),
        ];
        let (selected, selection) = select_employees(employees, Some("D-404"), "Engineering");
        assert_eq!(
            selection,
            EmployeeSelection::ByName("Engineering".to_string())
        );
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_selection_falls_back_to_all_active() {
        let employees = vec![emp("E-1", None, None), emp("E-2", None, Some("Sales"))];
        let (selected, selection) = select_employees(employees, None, "Engineering");
        assert_eq!(selection, EmployeeSelection::AllActive);
        assert_eq!(selected.len(), 2);
    }
}
