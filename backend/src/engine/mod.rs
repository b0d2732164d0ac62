//! Payroll engine - run lifecycle and aggregation
//!
//! The lifecycle operations (create, submit, approve, reject, freeze,
//! unfreeze, payslip generation) live in `lifecycle.rs`; the per-run
//! aggregation that drives the calculator across all eligible employees
//! lives in `aggregator.rs`.

pub mod aggregator;
pub mod lifecycle;

use serde::{Deserialize, Serialize};

use crate::models::run::TransitionError;
use crate::providers::ProviderError;

pub use aggregator::{AggregationSummary, EmployeeSelection};
pub use lifecycle::PayrollEngine;

/// Roles the engine distinguishes.
///
/// Authentication and role assignment are someone else's problem; the
/// engine receives an already-resolved actor and only enforces which role
/// may perform which operation, plus the approver-identity rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    PayrollSpecialist,
    PayrollManager,
    FinanceStaff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::PayrollSpecialist => "payroll specialist",
            Role::PayrollManager => "payroll manager",
            Role::FinanceStaff => "finance staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller, as resolved by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Run-level errors.
///
/// Employee-level calculation failures never surface here; the aggregator
/// downgrades them to exception rows. Everything in this enum aborts the
/// operation and leaves the run's prior state untouched.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed input (empty entity, bad reason, non-positive amount)
    Validation(String),

    /// Wrong role, self-approval, or duplicate approver
    Authorization(String),

    /// Illegal lifecycle transition or misuse of the current status
    StateConflict(String),

    NotFound(String),

    /// Details already exist for this run; a fresh run is required
    AlreadyProcessed(String),

    /// A non-REJECTED run already exists for this entity and month
    DuplicatePeriod { entity: String, month: String },

    /// A consumed collaborator was unreachable; the run stays in DRAFT
    DependencyUnavailable(ProviderError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation error: {}", msg),
            EngineError::Authorization(msg) => write!(f, "authorization error: {}", msg),
            EngineError::StateConflict(msg) => write!(f, "state conflict: {}", msg),
            EngineError::NotFound(what) => write!(f, "not found: {}", what),
            EngineError::AlreadyProcessed(run_id) => {
                write!(f, "payroll run {} has already been processed", run_id)
            }
            EngineError::DuplicatePeriod { entity, month } => {
                write!(
                    f,
                    "a payroll run already exists for entity '{}' in {}",
                    entity, month
                )
            }
            EngineError::DependencyUnavailable(err) => write!(f, "dependency unavailable: {}", err),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ProviderError> for EngineError {
    fn from(err: ProviderError) -> Self {
        EngineError::DependencyUnavailable(err)
    }
}

impl From<TransitionError> for EngineError {
    fn from(err: TransitionError) -> Self {
        EngineError::StateConflict(err.to_string())
    }
}
