//! Period math and day proration
//!
//! Computes the day counts behind the day-ratio proration path: calendar
//! days in the target month, reduced for a mid-period hire, a mid-period
//! termination/resignation effective date, and unpaid leave days.
//!
//! The work-ratio path (actual vs. scheduled minutes) lives in the
//! calculator itself; this module only knows about days.

use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(start)
}

/// Calendar days in the month containing `date`.
pub fn days_in_period(date: NaiveDate) -> u32 {
    (month_end(date) - month_start(date)).num_days() as u32 + 1
}

/// Day counts for one employee in one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proration {
    pub days_in_period: u32,

    /// Employed days minus unpaid leave, floored at zero
    pub days_worked: u32,

    pub unpaid_leave_days: u32,

    /// Hire date falls strictly inside the period
    pub hired_mid_period: bool,

    /// Termination/resignation effective date falls inside the period
    pub terminated_mid_period: bool,
}

impl Proration {
    /// days_worked / days_in_period, in [0, 1].
    pub fn day_ratio(&self) -> f64 {
        if self.days_in_period == 0 {
            return 0.0;
        }
        f64::from(self.days_worked) / f64::from(self.days_in_period)
    }
}

/// Compute the day counts for one employee.
///
/// The employed window is the intersection of [hire, termination] with the
/// period; unpaid leave days come off the top of that window.
pub fn prorate(
    hire_date: Option<NaiveDate>,
    termination_date: Option<NaiveDate>,
    period: NaiveDate,
    unpaid_leave_days: u32,
) -> Proration {
    let start = month_start(period);
    let end = month_end(period);
    let total = days_in_period(period);

    let employed_from = match hire_date {
        Some(h) if h > start => h,
        _ => start,
    };
    let employed_to = match termination_date {
        Some(t) if t < end => t,
        _ => end,
    };

    let employed_days = if employed_from > end || employed_to < start || employed_to < employed_from
    {
        0
    } else {
        (employed_to - employed_from).num_days() as u32 + 1
    };

    let days_worked = employed_days.saturating_sub(unpaid_leave_days);

    Proration {
        days_in_period: total,
        days_worked,
        unpaid_leave_days,
        hired_mid_period: matches!(hire_date, Some(h) if h > start && h <= end),
        terminated_mid_period: matches!(termination_date, Some(t) if t >= start && t <= end),
    }
}
