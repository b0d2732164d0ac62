//! Domain models
//!
//! Records the engine computes and persists, plus the consumed employee
//! directory record. Money is i64 cents throughout.

pub mod detail;
pub mod employee;
pub mod payslip;
pub mod run;
pub mod sidefund;

pub use detail::{
    AttendanceSnapshot, BankStatus, DeductionsBreakdown, EmployeePayrollDetail, OvertimeDetails,
    PenaltiesBreakdown,
};
pub use employee::{Employee, EmployeeStatus};
pub use payslip::{DeductionsDetails, EarningsDetails, PaySlip, PaySlipPaymentStatus};
pub use run::{
    PaymentStatus, PayrollRun, PayrollRunStatus, RunTotals, TransitionError, IRREGULARITY_LIST_CAP,
};
pub use sidefund::{SideFund, SideFundError, SideFundKind, SideFundStatus};
