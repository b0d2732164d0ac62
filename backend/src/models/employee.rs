//! Employee directory record
//!
//! The engine does not own employee master data; it consumes directory
//! records through the `EmployeeDirectory` provider. This struct carries
//! exactly the fields the calculator needs:
//! - employment status and department (eligibility and run filtering)
//! - compensation hooks (pay grade reference, optional salary override)
//! - proration anchors (hire date, termination/resignation effective date)
//! - side-fund triggers (signing-bonus offer, termination benefit)
//!
//! CRITICAL: All money values are i64 (cents)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employment status as reported by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeStatus {
    /// Employee holds an active contract and is payroll-eligible
    Active,

    /// Contract inactive or expired; processing fails with `InactiveEmployee`
    Inactive,
}

/// One employee as consumed from the directory provider.
///
/// # Example
/// ```
/// use payroll_engine_core_rs::models::employee::{Employee, EmployeeStatus};
///
/// let emp = Employee::new("E-1001".to_string(), "Amina Hassan".to_string());
/// assert!(emp.is_active());
/// assert!(emp.bank_account.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Employment status
    pub status: EmployeeStatus,

    /// Department id, when the directory has one
    pub department_id: Option<String>,

    /// Department display name (used for name-based run filtering)
    pub department_name: Option<String>,

    /// Employee-level base salary override (i64 cents)
    ///
    /// Consulted only when the pay grade cannot be resolved.
    pub base_salary: Option<i64>,

    /// Approved pay grade reference
    pub pay_grade_id: Option<String>,

    /// Bank account identifier; absence is flagged, never fatal
    pub bank_account: Option<String>,

    /// First day of employment
    pub hire_date: Option<NaiveDate>,

    /// Termination/resignation effective date, when one is filed
    pub termination_date: Option<NaiveDate>,

    /// Signing bonus promised in the employee's offer (i64 cents)
    ///
    /// A mid-period hire with an offer triggers side-fund auto-creation.
    pub signing_bonus_offer: Option<i64>,

    /// Configured termination/resignation benefit (i64 cents)
    ///
    /// A mid-period termination with a benefit triggers side-fund
    /// auto-creation.
    pub termination_benefit: Option<i64>,
}

impl Employee {
    /// Create an active employee with no optional data attached.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            status: EmployeeStatus::Active,
            department_id: None,
            department_name: None,
            base_salary: None,
            pay_grade_id: None,
            bank_account: None,
            hire_date: None,
            termination_date: None,
            signing_bonus_offer: None,
            termination_benefit: None,
        }
    }

    /// Check payroll eligibility.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Check whether a usable bank account identifier is on file.
    pub fn has_bank_account(&self) -> bool {
        self.bank_account
            .as_deref()
            .map(|acct| !acct.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_employee_is_active() {
        let emp = Employee::new("E-1".to_string(), "Test".to_string());
        assert!(emp.is_active());
    }

    #[test]
    fn test_blank_bank_account_counts_as_missing() {
        let mut emp = Employee::new("E-1".to_string(), "Test".to_string());
        assert!(!emp.has_bank_account());

        emp.bank_account = Some("   ".to_string());
        assert!(!emp.has_bank_account());

        emp.bank_account = Some("EG-38-0001".to_string());
        assert!(emp.has_bank_account());
    }
}
