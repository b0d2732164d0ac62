//! Tests for the payroll run lifecycle state machine
//!
//! Covers the transition table, the role guards, the approver-identity
//! checks, and the duplicate-period invariant.

use chrono::NaiveDate;

use payroll_engine_core_rs::{
    Actor, ConfigurationSnapshot, Employee, EngineError, InMemoryAttendance, InMemoryDirectory,
    InMemoryLeave, InMemoryPenaltyLedger, InsuranceBracket, PaySlipPaymentStatus, PaymentStatus,
    PayrollEngine, PayrollRunStatus, Role, TaxRule,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config() -> ConfigurationSnapshot {
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

fn engine() -> PayrollEngine {
    let directory = InMemoryDirectory::new(vec![employee("E-1", 600_000), employee("E-2", 800_000)]);
    PayrollEngine::new(
        config(),
        Box::new(directory),
        Box::new(InMemoryAttendance::new()),
        Box::new(InMemoryLeave::new()),
        Box::new(InMemoryPenaltyLedger::new()),
    )
}

fn actors() -> (Actor, Actor, Actor) {
    (
        Actor::new("SPEC-1", Role::PayrollSpecialist),
        Actor::new("MGR-1", Role::PayrollManager),
        Actor::new("FIN-1", Role::FinanceStaff),
    )
}

#[test]
fn test_full_three_step_approval_flow() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    let run = engine
        .create_run(d(2025, 6, 15), "Engineering", None, &spec)
        .unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Draft);
    // Period normalized to the first of the month
    assert_eq!(run.period(), d(2025, 6, 1));
    let run_id = run.run_id().to_string();

    let run = engine.submit_for_review(&run_id, &spec).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::UnderReview);
    assert_eq!(run.employees(), 2);

    // Manager approval advances to pending finance approval, not approved
    let run = engine.approve_by_manager(&run_id, &mgr).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::PendingFinanceApproval);
    assert_eq!(run.manager_id(), Some("MGR-1"));
    assert!(run.manager_approved_at().is_some());

    let run = engine.approve_by_finance(&run_id, &fin).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Approved);
    assert_eq!(run.payment_status(), PaymentStatus::Paid);

    // Finance approval marked every payslip paid
    for slip in engine.list_payslips(&run_id).unwrap() {
        assert_eq!(slip.payment_status(), PaySlipPaymentStatus::Paid);
    }
}

#[test]
fn test_manager_approve_on_draft_is_state_conflict() {
    let mut engine = engine();
    let (spec, mgr, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();

    let err = engine.approve_by_manager(&run_id, &mgr).unwrap_err();
    match err {
        EngineError::StateConflict(msg) => assert!(msg.contains("under review"), "{msg}"),
        other => panic!("expected state conflict, got {other}"),
    }
    // Status untouched
    assert_eq!(
        engine.get_run(&run_id).unwrap().status(),
        PayrollRunStatus::Draft
    );
}

#[test]
fn test_self_approval_is_an_authorization_error() {
    let mut engine = engine();
    let spec = Actor::new("SAME-1", Role::PayrollSpecialist);
    // Same person, manager hat on
    let mgr = Actor::new("SAME-1", Role::PayrollManager);

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    let err = engine.approve_by_manager(&run_id, &mgr).unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)), "{err}");
    assert_eq!(
        engine.get_run(&run_id).unwrap().status(),
        PayrollRunStatus::UnderReview
    );
}

#[test]
fn test_finance_approver_must_differ_from_manager() {
    let mut engine = engine();
    let (spec, mgr, _) = actors();
    // Same person as the manager, finance hat on
    let fin = Actor::new("MGR-1", Role::FinanceStaff);

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();
    engine.approve_by_manager(&run_id, &mgr).unwrap();

    let err = engine.approve_by_finance(&run_id, &fin).unwrap_err();
    assert!(matches!(err, EngineError::Authorization(_)), "{err}");
}

#[test]
fn test_wrong_role_is_rejected() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    // Only a specialist creates runs
    assert!(matches!(
        engine.create_run(d(2025, 6, 1), "Engineering", None, &mgr),
        Err(EngineError::Authorization(_))
    ));

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();

    // Only a specialist submits
    assert!(matches!(
        engine.submit_for_review(&run_id, &fin),
        Err(EngineError::Authorization(_))
    ));
    engine.submit_for_review(&run_id, &spec).unwrap();

    // Only a manager approves at review
    assert!(matches!(
        engine.approve_by_manager(&run_id, &fin),
        Err(EngineError::Authorization(_))
    ));
    engine.approve_by_manager(&run_id, &mgr).unwrap();

    // Only finance grants final approval
    assert!(matches!(
        engine.approve_by_finance(&run_id, &mgr),
        Err(EngineError::Authorization(_))
    ));
}

#[test]
fn test_duplicate_period_guard_and_rejected_month_reuse() {
    let mut engine = engine();
    let (spec, _, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();

    // Second run for the same entity and month fails, whatever the day
    let err = engine
        .create_run(d(2025, 6, 20), "Engineering", None, &spec)
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicatePeriod { .. }), "{err}");

    // Another entity or another month is fine
    engine
        .create_run(d(2025, 6, 1), "Sales", None, &spec)
        .unwrap();
    engine
        .create_run(d(2025, 7, 1), "Engineering", None, &spec)
        .unwrap();

    // Once the June run is rejected, the month opens up again
    engine.reject(&run_id, &spec, "wrong period config").unwrap();
    engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
}

#[test]
fn test_duplicate_period_with_approved_run() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();
    engine.approve_by_manager(&run_id, &mgr).unwrap();
    engine.approve_by_finance(&run_id, &fin).unwrap();

    // An APPROVED run blocks the month just like a draft would
    assert!(matches!(
        engine.create_run(d(2025, 6, 1), "Engineering", None, &spec),
        Err(EngineError::DuplicatePeriod { .. })
    ));
}

#[test]
fn test_freeze_unfreeze_cycle() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();
    engine.approve_by_manager(&run_id, &mgr).unwrap();
    engine.approve_by_finance(&run_id, &fin).unwrap();

    // Freezing is manager-only
    assert!(matches!(
        engine.freeze(&run_id, &fin),
        Err(EngineError::Authorization(_))
    ));
    let run = engine.freeze(&run_id, &mgr).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Locked);

    // Unlocking requires a non-empty reason, stored verbatim
    assert!(matches!(
        engine.unfreeze(&run_id, &mgr, "  "),
        Err(EngineError::Validation(_))
    ));
    let run = engine
        .unfreeze(&run_id, &mgr, "late overtime correction for E-2")
        .unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Unlocked);
    assert_eq!(
        run.unlock_reason(),
        Some("late overtime correction for E-2")
    );

    // Lock ⇄ unlock cycles freely
    let run = engine.freeze(&run_id, &mgr).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Locked);

    // Payslips were untouched by locking
    for slip in engine.list_payslips(&run_id).unwrap() {
        assert_eq!(slip.payment_status(), PaySlipPaymentStatus::Paid);
    }
}

#[test]
fn test_freeze_before_approval_is_state_conflict() {
    let mut engine = engine();
    let (spec, mgr, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    let err = engine.freeze(&run_id, &mgr).unwrap_err();
    assert!(matches!(err, EngineError::StateConflict(_)), "{err}");
    assert_eq!(
        engine.get_run(&run_id).unwrap().status(),
        PayrollRunStatus::UnderReview
    );
}

#[test]
fn test_reject_requires_reason_and_records_it() {
    let mut engine = engine();
    let (spec, _, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();

    assert!(matches!(
        engine.reject(&run_id, &spec, ""),
        Err(EngineError::Validation(_))
    ));

    let run = engine
        .reject(&run_id, &spec, "wrong entity selected")
        .unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Rejected);
    assert_eq!(run.rejection_reason(), Some("wrong entity selected"));
}

#[test]
fn test_finance_rejects_at_pending_finance_approval() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();
    engine.approve_by_manager(&run_id, &mgr).unwrap();

    // Specialist cannot reject once it sits with finance
    assert!(matches!(
        engine.reject(&run_id, &spec, "numbers look off"),
        Err(EngineError::Authorization(_))
    ));

    let run = engine.reject(&run_id, &fin, "totals mismatch").unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Rejected);
}

#[test]
fn test_reopen_rejected_run() {
    let mut engine = engine();
    let (spec, _, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.reject(&run_id, &spec, "bad period").unwrap();

    let run = engine.reopen_run(&run_id, &spec).unwrap();
    assert_eq!(run.status(), PayrollRunStatus::Draft);
}

#[test]
fn test_reopen_blocked_when_replacement_run_exists() {
    let mut engine = engine();
    let (spec, _, _) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.reject(&run_id, &spec, "bad period").unwrap();

    // A replacement run now owns the month
    engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();

    assert!(matches!(
        engine.reopen_run(&run_id, &spec),
        Err(EngineError::DuplicatePeriod { .. })
    ));
}

#[test]
fn test_generate_payslips_requires_finance_and_approval() {
    let mut engine = engine();
    let (spec, mgr, fin) = actors();

    let run = engine
        .create_run(d(2025, 6, 1), "Engineering", None, &spec)
        .unwrap();
    let run_id = run.run_id().to_string();
    engine.submit_for_review(&run_id, &spec).unwrap();

    // Not yet approved
    assert!(matches!(
        engine.generate_payslips(&run_id, &fin),
        Err(EngineError::StateConflict(_))
    ));
    // Wrong role
    assert!(matches!(
        engine.generate_payslips(&run_id, &mgr),
        Err(EngineError::Authorization(_))
    ));

    engine.approve_by_manager(&run_id, &mgr).unwrap();
    engine.approve_by_finance(&run_id, &fin).unwrap();

    let slips = engine.generate_payslips(&run_id, &fin).unwrap();
    assert_eq!(slips.len(), 2);
    // Regenerated slips of a paid run come back paid
    for slip in &slips {
        assert_eq!(slip.payment_status(), PaySlipPaymentStatus::Paid);
    }
    assert_eq!(engine.list_payslips(&run_id).unwrap().len(), 2);
}

#[test]
fn test_missing_run_is_not_found() {
    let mut engine = engine();
    let (spec, _, _) = actors();

    assert!(matches!(
        engine.submit_for_review("PR-404", &spec),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_run("PR-404"),
        Err(EngineError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_payslip("PS-404"),
        Err(EngineError::NotFound(_))
    ));
}
