//! Consumed collaborator interfaces
//!
//! Attendance aggregation, leave balances, the employee directory, and the
//! misconduct-penalty ledger are owned by other subsystems. The engine
//! consumes them through these traits; a provider failure is a
//! `ProviderError` and aborts the run submission (the run stays in DRAFT),
//! it is never silently downgraded to a per-employee exception.
//!
//! In-memory implementations for tests and embedding live in [`memory`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::employee::Employee;

pub mod memory;

pub use memory::{
    InMemoryAttendance, InMemoryDirectory, InMemoryLeave, InMemoryPenaltyLedger,
};

/// A collaborator could not answer.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{provider} provider unavailable: {reason}")]
pub struct ProviderError {
    /// Which collaborator failed ("attendance", "leave", ...)
    pub provider: &'static str,
    pub reason: String,
}

impl ProviderError {
    pub fn new(provider: &'static str, reason: impl Into<String>) -> Self {
        Self {
            provider,
            reason: reason.into(),
        }
    }
}

/// Pre-aggregated attendance for one employee and one period.
///
/// All minute counts are i64; this is time, not money.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePeriodSummary {
    pub actual_work_minutes: i64,
    pub scheduled_work_minutes: i64,
    pub overtime_minutes: i64,
    pub lateness_minutes: i64,
    pub missing_work_minutes: i64,
    pub working_days: u32,
}

/// One misconduct penalty from the external ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyEntry {
    pub reason: String,

    /// Penalty amount (i64 cents)
    pub amount: i64,
}

/// Attendance summary provider.
///
/// `None` means no attendance data exists for the employee/period; the
/// calculator then falls back to day-ratio proration.
pub trait AttendanceProvider {
    fn for_period(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<AttendancePeriodSummary>, ProviderError>;
}

/// Unpaid-leave day counts.
pub trait LeaveProvider {
    fn unpaid_days(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u32, ProviderError>;
}

/// Employee master data reader.
///
/// Department filtering happens in the aggregator (the fallback chain is
/// part of its contract), so this trait only hands out the active set.
pub trait EmployeeDirectory {
    fn active_employees(&self) -> Result<Vec<Employee>, ProviderError>;

    fn find(&self, employee_id: &str) -> Result<Option<Employee>, ProviderError>;
}

/// External misconduct-penalty ledger.
pub trait PenaltyLedger {
    fn misconduct_penalties(
        &self,
        employee_id: &str,
        period: NaiveDate,
    ) -> Result<Vec<PenaltyEntry>, ProviderError>;
}
