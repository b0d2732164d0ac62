//! In-memory provider implementations
//!
//! Used by the test suite and by embedders that already hold the collaborator
//! data in process. Attendance, leave, and penalty data are keyed by
//! (employee id, period start date).

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::employee::Employee;

use super::{
    AttendancePeriodSummary, AttendanceProvider, EmployeeDirectory, LeaveProvider, PenaltyEntry,
    PenaltyLedger, ProviderError,
};

/// Attendance summaries held in a map.
#[derive(Debug, Default)]
pub struct InMemoryAttendance {
    summaries: HashMap<(String, NaiveDate), AttendancePeriodSummary>,
}

impl InMemoryAttendance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        employee_id: impl Into<String>,
        period_start: NaiveDate,
        summary: AttendancePeriodSummary,
    ) {
        self.summaries
            .insert((employee_id.into(), period_start), summary);
    }
}

impl AttendanceProvider for InMemoryAttendance {
    fn for_period(
        &self,
        employee_id: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Option<AttendancePeriodSummary>, ProviderError> {
        Ok(self
            .summaries
            .get(&(employee_id.to_string(), start))
            .copied())
    }
}

/// Unpaid-leave day counts held in a map. Missing entries count as zero.
#[derive(Debug, Default)]
pub struct InMemoryLeave {
    unpaid_days: HashMap<(String, NaiveDate), u32>,
}

impl InMemoryLeave {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, employee_id: impl Into<String>, period_start: NaiveDate, days: u32) {
        self.unpaid_days
            .insert((employee_id.into(), period_start), days);
    }
}

impl LeaveProvider for InMemoryLeave {
    fn unpaid_days(
        &self,
        employee_id: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<u32, ProviderError> {
        Ok(self
            .unpaid_days
            .get(&(employee_id.to_string(), start))
            .copied()
            .unwrap_or(0))
    }
}

/// Employee directory backed by a vector.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    employees: Vec<Employee>,
}

impl InMemoryDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    pub fn push(&mut self, employee: Employee) {
        self.employees.push(employee);
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn active_employees(&self) -> Result<Vec<Employee>, ProviderError> {
        Ok(self
            .employees
            .iter()
            .filter(|e| e.is_active())
            .cloned()
            .collect())
    }

    fn find(&self, employee_id: &str) -> Result<Option<Employee>, ProviderError> {
        Ok(self.employees.iter().find(|e| e.id == employee_id).cloned())
    }
}

/// Misconduct-penalty ledger held in a map.
#[derive(Debug, Default)]
pub struct InMemoryPenaltyLedger {
    penalties: HashMap<(String, NaiveDate), Vec<PenaltyEntry>>,
}

impl InMemoryPenaltyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        employee_id: impl Into<String>,
        period_start: NaiveDate,
        entry: PenaltyEntry,
    ) {
        self.penalties
            .entry((employee_id.into(), period_start))
            .or_default()
            .push(entry);
    }
}

impl PenaltyLedger for InMemoryPenaltyLedger {
    fn misconduct_penalties(
        &self,
        employee_id: &str,
        period: NaiveDate,
    ) -> Result<Vec<PenaltyEntry>, ProviderError> {
        Ok(self
            .penalties
            .get(&(employee_id.to_string(), period))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::EmployeeStatus;

    #[test]
    fn test_directory_filters_inactive() {
        let mut active = Employee::new("E-1".to_string(), "Active".to_string());
        active.department_name = Some("Engineering".to_string());
        let mut inactive = Employee::new("E-2".to_string(), "Gone".to_string());
        inactive.status = EmployeeStatus::Inactive;

        let dir = InMemoryDirectory::new(vec![active, inactive]);
        let actives = dir.active_employees().unwrap();
        assert_eq!(actives.len(), 1);
        assert_eq!(actives[0].id, "E-1");

        // find() still surfaces inactive records
        assert!(dir.find("E-2").unwrap().is_some());
    }

    #[test]
    fn test_missing_leave_entry_counts_as_zero() {
        let leave = InMemoryLeave::new();
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        assert_eq!(leave.unpaid_days("E-1", start, end).unwrap(), 0);
    }
}
