//! Tests for the side-fund disbursement guard
//!
//! Grants are reviewed before payroll touches them, the grantee never
//! reviews their own grant, rejection needs a reason, and a grant is paid
//! into at most one run, ever.

use chrono::NaiveDate;

use payroll_engine_core_rs::{
    Actor, ConfigurationSnapshot, Employee, EngineError, InMemoryAttendance, InMemoryDirectory,
    InMemoryLeave, InMemoryPenaltyLedger, PayrollEngine, PayrollEvent, Role, SideFundKind,
    SideFundStatus,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn employee(id: &str, salary: i64) -> Employee {
    let mut e = Employee::new(id.to_string(), format!("Employee {id}"));
    e.base_salary = Some(salary);
    e.bank_account = Some(format!("ACC-{id}"));
    e.department_name = Some("Engineering".to_string());
    e
}

fn engine() -> PayrollEngine {
    let mut reviewer = employee("RV-1", 0);
    reviewer.department_name = Some("HR".to_string());
    let mut former = employee("RV-GONE", 0);
    former.status = payroll_engine_core_rs::EmployeeStatus::Inactive;

    PayrollEngine::new(
        ConfigurationSnapshot::default(),
        Box::new(InMemoryDirectory::new(vec![
            employee("E-1", 600_000),
            reviewer,
            former,
        ])),
        Box::new(InMemoryAttendance::new()),
        Box::new(InMemoryLeave::new()),
        Box::new(InMemoryPenaltyLedger::new()),
    )
}

#[test]
fn test_grant_validation() {
    let mut engine = engine();

    assert!(matches!(
        engine.grant_side_fund(SideFundKind::SigningBonus, "E-1", 0),
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.grant_side_fund(SideFundKind::SigningBonus, "E-404", 100_000),
        Err(EngineError::NotFound(_))
    ));

    let id = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 100_000)
        .unwrap();
    assert_eq!(
        engine.store().side_fund(&id).unwrap().status(),
        SideFundStatus::Pending
    );
    assert_eq!(engine.pending_side_funds().len(), 1);
}

#[test]
fn test_approve_requires_active_non_grantee_reviewer() {
    let mut engine = engine();
    let id = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 100_000)
        .unwrap();

    // Grantee cannot review their own grant
    assert!(matches!(
        engine.approve_side_fund(&id, "E-1"),
        Err(EngineError::Authorization(_))
    ));
    // Inactive reviewer is refused
    assert!(matches!(
        engine.approve_side_fund(&id, "RV-GONE"),
        Err(EngineError::Authorization(_))
    ));
    // Unknown reviewer is refused
    assert!(matches!(
        engine.approve_side_fund(&id, "RV-404"),
        Err(EngineError::NotFound(_))
    ));

    engine.approve_side_fund(&id, "RV-1").unwrap();
    assert_eq!(
        engine.store().side_fund(&id).unwrap().status(),
        SideFundStatus::Approved
    );
    assert!(engine.pending_side_funds().is_empty());

    // Approving twice is a state conflict
    assert!(matches!(
        engine.approve_side_fund(&id, "RV-1"),
        Err(EngineError::StateConflict(_))
    ));
}

#[test]
fn test_reject_requires_reason_and_is_terminal() {
    let mut engine = engine();
    let id = engine
        .grant_side_fund(SideFundKind::TerminationBenefit, "E-1", 80_000)
        .unwrap();

    assert!(matches!(
        engine.reject_side_fund(&id, "RV-1", "  "),
        Err(EngineError::Validation(_))
    ));

    engine
        .reject_side_fund(&id, "RV-1", "duplicate of an earlier grant")
        .unwrap();
    let fund = engine.store().side_fund(&id).unwrap();
    assert_eq!(fund.status(), SideFundStatus::Rejected);
    assert_eq!(
        fund.rejection_reason(),
        Some("duplicate of an earlier grant")
    );

    // Terminal: no approval after rejection
    assert!(matches!(
        engine.approve_side_fund(&id, "RV-1"),
        Err(EngineError::StateConflict(_))
    ));
}

#[test]
fn test_rejected_grant_is_never_paid() {
    let mut engine = engine();
    let spec = Actor::new("SPEC-1", Role::PayrollSpecialist);

    let id = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 100_000)
        .unwrap();
    engine
        .reject_side_fund(&id, "RV-1", "offer rescinded")
        .unwrap();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    let detail = engine
        .store()
        .details_for_run(&run_id)
        .iter()
        .find(|de| de.employee_id == "E-1")
        .unwrap();
    assert_eq!(detail.bonus, 0);
    assert_eq!(
        engine.store().side_fund(&id).unwrap().status(),
        SideFundStatus::Rejected
    );
}

#[test]
fn test_claim_is_audited() {
    let mut engine = engine();
    let spec = Actor::new("SPEC-1", Role::PayrollSpecialist);

    let id = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 100_000)
        .unwrap();
    engine.approve_side_fund(&id, "RV-1").unwrap();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    let claimed = engine
        .events()
        .for_run(&run_id)
        .into_iter()
        .find_map(|e| match e {
            PayrollEvent::SideFundClaimed {
                side_fund_id,
                employee_id,
                amount,
                ..
            } => Some((side_fund_id.clone(), employee_id.clone(), *amount)),
            _ => None,
        })
        .unwrap();
    assert_eq!(claimed, (id, "E-1".to_string(), 100_000));
}

#[test]
fn test_one_grant_per_kind_claimed_per_run() {
    // Two approved signing bonuses for the same employee: only one is
    // claimed in a run (and the other stays approved for review)
    let mut engine = engine();
    let spec = Actor::new("SPEC-1", Role::PayrollSpecialist);

    let first = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 100_000)
        .unwrap();
    let second = engine
        .grant_side_fund(SideFundKind::SigningBonus, "E-1", 70_000)
        .unwrap();
    engine.approve_side_fund(&first, "RV-1").unwrap();
    engine.approve_side_fund(&second, "RV-1").unwrap();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    let detail = engine
        .store()
        .details_for_run(&run_id)
        .iter()
        .find(|de| de.employee_id == "E-1")
        .unwrap();
    let first_status = engine.store().side_fund(&first).unwrap().status();
    let second_status = engine.store().side_fund(&second).unwrap().status();
    let paid = [first_status, second_status]
        .iter()
        .filter(|s| **s == SideFundStatus::Paid)
        .count();
    assert_eq!(paid, 1);
    assert!(detail.bonus == 100_000 || detail.bonus == 70_000);
}
