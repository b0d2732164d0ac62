//! Configuration snapshot
//!
//! An explicit, immutable view of the approved compensation configuration,
//! captured once and passed into the calculator for a whole run. Because the
//! snapshot is a plain value, the same run stays reproducible even if the
//! configuration subsystem changes rules mid-processing.
//!
//! Every lookup that involves a fallback returns a tagged result naming the
//! path that fired (band match vs. first-approved rule, pay grade vs.
//! override vs. minimum wage vs. hard default), so callers can log the
//! decision and tests can assert on it instead of inferring it from amounts.
//!
//! CRITICAL: All money values are i64 (cents); rates are f64 percent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::employee::Employee;

/// Hard default base salary (i64 cents) when the pay grade, the employee
/// override, and the minimum wage are all absent.
pub const DEFAULT_BASE_SALARY: i64 = 400_000;

/// One approved tax rule with its salary band.
///
/// Bands are kept mutually exclusive by the configuration subsystem's
/// naming convention; this engine only checks containment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    pub name: String,

    /// Band lower bound, inclusive (i64 cents)
    pub min_salary: i64,

    /// Band upper bound, inclusive (i64 cents)
    pub max_salary: i64,

    /// Rate applied to base salary, percent
    pub rate_pct: f64,
}

impl TaxRule {
    pub fn contains(&self, base_salary: i64) -> bool {
        base_salary >= self.min_salary && base_salary <= self.max_salary
    }
}

/// One approved insurance bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceBracket {
    pub name: String,
    pub min_salary: i64,
    pub max_salary: i64,

    /// Employee contribution applied to prorated gross, percent
    pub employee_rate_pct: f64,
}

impl InsuranceBracket {
    pub fn contains(&self, base_salary: i64) -> bool {
        base_salary >= self.min_salary && base_salary <= self.max_salary
    }
}

/// One allowance line (default or employee-specific grant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub name: String,
    pub amount: i64,
}

/// One approved pay grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayGrade {
    pub id: String,
    pub grade: String,
    pub base_salary: i64,
}

/// Which tax rule fired, and how it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaxMatch<'a> {
    /// A rule's salary band contains the base salary
    Band(&'a TaxRule),

    /// No band matched; first approved rule used as fallback
    FirstApproved(&'a TaxRule),

    /// No rules configured at all; zero tax
    None,
}

/// How the base salary was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalarySource {
    /// Approved pay grade, by id
    PayGrade(String),

    /// Employee-level override
    EmployeeOverride,

    /// Configured minimum wage
    MinimumWage,

    /// Hard default; every other source was absent
    HardDefault,
}

/// Approved configuration captured for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    pub tax_rules: Vec<TaxRule>,
    pub insurance_brackets: Vec<InsuranceBracket>,

    /// Organization-wide default allowances
    pub default_allowances: Vec<Allowance>,

    /// Employee-specific approved allowance grants, by employee id
    pub employee_allowances: HashMap<String, Vec<Allowance>>,

    /// Configured minimum wage (i64 cents); 0 means not configured
    pub minimum_wage: i64,

    pub pay_grades: Vec<PayGrade>,
}

impl ConfigurationSnapshot {
    /// Select the tax rule for a base salary.
    ///
    /// Band containment wins; otherwise the first approved rule; otherwise
    /// no tax. The tag tells the caller which of the three fired.
    pub fn match_tax_rule(&self, base_salary: i64) -> TaxMatch<'_> {
        if let Some(rule) = self.tax_rules.iter().find(|r| r.contains(base_salary)) {
            return TaxMatch::Band(rule);
        }
        match self.tax_rules.first() {
            Some(rule) => TaxMatch::FirstApproved(rule),
            None => TaxMatch::None,
        }
    }

    /// Select the insurance bracket whose [min, max] contains the base
    /// salary. No fallback: outside every bracket means no insurance.
    pub fn match_insurance_bracket(&self, base_salary: i64) -> Option<&InsuranceBracket> {
        self.insurance_brackets
            .iter()
            .find(|b| b.contains(base_salary))
    }

    pub fn pay_grade(&self, id: &str) -> Option<&PayGrade> {
        self.pay_grades.iter().find(|g| g.id == id)
    }

    /// Resolve base salary through the fallback chain:
    /// pay grade → employee override → minimum wage → hard default.
    pub fn resolve_base_salary(&self, employee: &Employee) -> (i64, SalarySource) {
        if let Some(grade) = employee
            .pay_grade_id
            .as_deref()
            .and_then(|id| self.pay_grade(id))
        {
            return (grade.base_salary, SalarySource::PayGrade(grade.id.clone()));
        }
        if let Some(salary) = employee.base_salary {
            return (salary, SalarySource::EmployeeOverride);
        }
        if self.minimum_wage > 0 {
            return (self.minimum_wage, SalarySource::MinimumWage);
        }
        (DEFAULT_BASE_SALARY, SalarySource::HardDefault)
    }

    /// Sum allowances: employee-specific approved grants win over the
    /// configured defaults.
    pub fn allowances_for(&self, employee_id: &str) -> i64 {
        let lines = self
            .employee_allowances
            .get(employee_id)
            .map(|v| v.as_slice())
            .unwrap_or(&self.default_allowances);
        lines.iter().map(|a| a.amount).sum()
    }
}
