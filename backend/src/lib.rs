//! Payroll Engine Core - Rust Engine
//!
//! Monthly payroll run processing: per-employee salary calculation and the
//! multi-role run lifecycle that gates when calculation may run and when
//! money may be disbursed.
//!
//! # Architecture
//!
//! - **models**: Domain records (PayrollRun, EmployeePayrollDetail, PaySlip, SideFund)
//! - **config**: Approved configuration snapshot (tax, insurance, allowances, pay grades)
//! - **providers**: Consumed collaborator traits (attendance, leave, directory, penalties)
//! - **calculator**: Per-employee salary calculation steps
//! - **engine**: Run lifecycle state machine and the run aggregator
//! - **store**: Persisted payroll records
//! - **events**: Audit event log
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents)
//! 2. Run statuses move only along the lifecycle transition table
//! 3. One employee's failure never aborts a run; it becomes an exception row
//! 4. A side-fund grant is paid into at most one run, ever

// Module declarations
pub mod calculator;
pub mod config;
pub mod engine;
pub mod events;
pub mod models;
pub mod providers;
pub mod store;

// Re-exports for convenience
pub use calculator::{
    CalculationError, CalculationOutcome, HourlyRateCalculator, PayRateCalculator,
    PayrollCalculator,
};
pub use config::{ConfigurationSnapshot, InsuranceBracket, PayGrade, TaxMatch, TaxRule};
pub use engine::{Actor, AggregationSummary, EmployeeSelection, EngineError, PayrollEngine, Role};
pub use events::{EventLog, PayrollEvent};
pub use models::{
    BankStatus, Employee, EmployeePayrollDetail, EmployeeStatus, PaySlip, PaySlipPaymentStatus,
    PaymentStatus, PayrollRun, PayrollRunStatus, SideFund, SideFundKind, SideFundStatus,
};
pub use providers::{
    AttendancePeriodSummary, AttendanceProvider, EmployeeDirectory, InMemoryAttendance,
    InMemoryDirectory, InMemoryLeave, InMemoryPenaltyLedger, LeaveProvider, PenaltyEntry,
    PenaltyLedger, ProviderError,
};
pub use store::{PayrollStore, RefundRecord, RefundStatus};
