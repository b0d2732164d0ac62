//! Property tests for the payroll calculation invariants
//!
//! - Net pay is never negative, and never lands below the prorated
//!   minimum wage when one is configured
//! - Run totals always equal the sum over the run's detail rows

use chrono::NaiveDate;
use proptest::prelude::*;

use payroll_engine_core_rs::calculator::{HourlyRateCalculator, PayrollCalculator};
use payroll_engine_core_rs::providers::PenaltyEntry;
use payroll_engine_core_rs::store::PayrollStore;
use payroll_engine_core_rs::{
    Actor, AttendancePeriodSummary, ConfigurationSnapshot, Employee, InMemoryAttendance,
    InMemoryDirectory, InMemoryLeave, InMemoryPenaltyLedger, InsuranceBracket, PayrollEngine, Role,
    TaxRule,
};

fn june() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn config(min_wage: i64) -> ConfigurationSnapshot {
    ConfigurationSnapshot {
        tax_rules: vec![TaxRule {
            name: "Flat".to_string(),
            min_salary: 0,
            max_salary: i64::MAX,
            rate_pct: 10.0,
        }],
        insurance_brackets: vec![InsuranceBracket {
            name: "Standard".to_string(),
            min_salary: 0,
            max_salary: i64::MAX,
            employee_rate_pct: 5.0,
        }],
        minimum_wage: min_wage,
        ..Default::default()
    }
}

fn employee(id: &str, salary: i64) -> Employee {
    let mut e = Employee::new(id.to_string(), format!("Employee {id}"));
    e.base_salary = Some(salary);
    e.bank_account = Some(format!("ACC-{id}"));
    e.department_name = Some("Engineering".to_string());
    e
}

fn arb_attendance() -> impl Strategy<Value = Option<AttendancePeriodSummary>> {
    prop_oneof![
        Just(None),
        (
            0i64..20_000,
            1i64..20_000,
            0i64..600,
            0i64..600,
            0i64..600,
            15u32..27,
        )
            .prop_map(
                |(actual, scheduled, overtime, lateness, missing, days)| {
                    Some(AttendancePeriodSummary {
                        actual_work_minutes: actual,
                        scheduled_work_minutes: scheduled,
                        overtime_minutes: overtime,
                        lateness_minutes: lateness,
                        missing_work_minutes: missing,
                        working_days: days,
                    })
                }
            ),
    ]
}

proptest! {
    #[test]
    fn prop_net_pay_respects_floor_and_zero(
        base in 0i64..3_000_000,
        unpaid in 0u32..40,
        min_wage in prop_oneof![Just(0i64), 100_000i64..500_000],
        summary in arb_attendance(),
        misconduct in 0i64..400_000,
    ) {
        let cfg = config(min_wage);
        let mut attendance = InMemoryAttendance::new();
        let expected_ratio = match &summary {
            Some(s) if s.scheduled_work_minutes > 0 => {
                (s.actual_work_minutes as f64 / s.scheduled_work_minutes as f64).min(1.0)
            }
            _ => f64::from(30u32.saturating_sub(unpaid).min(30)) / 30.0,
        };
        if let Some(s) = summary {
            attendance.insert("E-1", june(), s);
        }
        let mut leave = InMemoryLeave::new();
        leave.insert("E-1", june(), unpaid);
        let mut ledger = InMemoryPenaltyLedger::new();
        if misconduct > 0 {
            ledger.insert("E-1", june(), PenaltyEntry {
                reason: "misconduct".to_string(),
                amount: misconduct,
            });
        }

        let rates = HourlyRateCalculator;
        let calc = PayrollCalculator::new(&cfg, &attendance, &leave, &ledger, &rates);
        let mut store = PayrollStore::new();
        let mut emp = employee("E-1", base);
        if base == 0 {
            emp.base_salary = None;
        }

        let out = calc.calculate(&emp, "PR-1", june(), &mut store).unwrap();

        prop_assert!(out.detail.net_pay >= 0, "net pay {} negative", out.detail.net_pay);
        if min_wage > 0 {
            let floor = (min_wage as f64 * expected_ratio).round() as i64;
            prop_assert!(
                out.detail.net_pay >= floor,
                "net pay {} below prorated floor {}",
                out.detail.net_pay,
                floor
            );
        }
    }

    #[test]
    fn prop_run_totals_equal_sum_of_details(
        salaries in prop::collection::vec(1i64..2_000_000, 1..8),
    ) {
        let employees: Vec<Employee> = salaries
            .iter()
            .enumerate()
            .map(|(i, salary)| employee(&format!("E-{i}"), *salary))
            .collect();
        let mut engine = PayrollEngine::new(
            config(0),
            Box::new(InMemoryDirectory::new(employees)),
            Box::new(InMemoryAttendance::new()),
            Box::new(InMemoryLeave::new()),
            Box::new(InMemoryPenaltyLedger::new()),
        );
        let spec = Actor::new("SPEC-1", Role::PayrollSpecialist);

        let run = engine.create_run(june(), "Engineering", None, &spec).unwrap();
        let run_id = run.run_id().to_string();
        let run = engine.submit_for_review(&run_id, &spec).unwrap();

        let details = engine.store().details_for_run(&run_id);
        prop_assert_eq!(details.len(), salaries.len());

        let net_sum: i64 = details.iter().map(|d| d.net_pay).sum();
        prop_assert_eq!(run.total_net_pay(), net_sum);

        let gross_sum: i64 = details.iter().map(|d| d.gross_pay).sum();
        prop_assert_eq!(run.totals().gross, gross_sum);

        let deduction_sum: i64 = details.iter().map(|d| d.deductions.total).sum();
        prop_assert_eq!(run.totals().deductions, deduction_sum);

        let slips = engine.list_payslips(&run_id).unwrap();
        prop_assert_eq!(slips.len(), details.len());
        let slip_sum: i64 = slips.iter().map(|s| s.net_pay).sum();
        prop_assert_eq!(slip_sum, net_sum);
    }
}
