//! Minute-based pay components
//!
//! Overtime pay and the attendance-derived penalties (missing work,
//! lateness) are priced per minute from an hourly rate. The pricing is
//! pluggable: an embedder can supply its own `PayRateCalculator` (e.g. one
//! that reads per-contract rates); the engine falls back to the local
//! hourly-rate implementation below.
//!
//! CRITICAL: All money values are i64 (cents); minute counts are time.

/// Overtime is paid at 150% of the hourly rate.
pub const OVERTIME_MULTIPLIER: f64 = 1.5;

/// Lateness is penalized at 50% of the hourly rate.
pub const LATENESS_MULTIPLIER: f64 = 0.5;

/// Missing work is penalized at the full hourly rate.
pub const MISSING_WORK_MULTIPLIER: f64 = 1.0;

/// Standard shift length used to derive the hourly rate.
pub const STANDARD_SHIFT_HOURS: u32 = 8;

/// Working days assumed when the attendance summary reports none.
pub const DEFAULT_WORKING_DAYS: u32 = 22;

/// Prices minute counts into money.
pub trait PayRateCalculator {
    /// Overtime pay for `minutes` of overtime.
    fn overtime_pay(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64;

    /// Penalty for `minutes` of missing work.
    fn missing_work_penalty(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64;

    /// Penalty for `minutes` of lateness.
    fn lateness_penalty(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64;
}

/// Local fallback: hourly rate = base salary / (working days × 8h).
#[derive(Debug, Clone, Copy, Default)]
pub struct HourlyRateCalculator;

impl HourlyRateCalculator {
    /// Hourly rate in cents (as f64; rounding happens per component).
    fn hourly_rate(base_salary: i64, working_days: u32) -> f64 {
        let days = if working_days == 0 {
            DEFAULT_WORKING_DAYS
        } else {
            working_days
        };
        base_salary as f64 / f64::from(days * STANDARD_SHIFT_HOURS)
    }

    fn price(base_salary: i64, working_days: u32, minutes: i64, multiplier: f64) -> i64 {
        if minutes <= 0 || base_salary <= 0 {
            return 0;
        }
        let hourly = Self::hourly_rate(base_salary, working_days);
        (minutes as f64 / 60.0 * hourly * multiplier).round() as i64
    }
}

impl PayRateCalculator for HourlyRateCalculator {
    fn overtime_pay(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64 {
        Self::price(base_salary, working_days, minutes, OVERTIME_MULTIPLIER)
    }

    fn missing_work_penalty(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64 {
        Self::price(base_salary, working_days, minutes, MISSING_WORK_MULTIPLIER)
    }

    fn lateness_penalty(&self, base_salary: i64, working_days: u32, minutes: i64) -> i64 {
        Self::price(base_salary, working_days, minutes, LATENESS_MULTIPLIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // base 880,000 cents over 22 days × 8h → 5,000 cents/hour
    const BASE: i64 = 880_000;

    #[test]
    fn test_overtime_at_150_percent() {
        let calc = HourlyRateCalculator;
        // 2 hours × 5,000 × 1.5 = 15,000
        assert_eq!(calc.overtime_pay(BASE, 22, 120), 15_000);
    }

    #[test]
    fn test_missing_work_at_full_rate() {
        let calc = HourlyRateCalculator;
        // 90 minutes × 5,000/h = 7,500
        assert_eq!(calc.missing_work_penalty(BASE, 22, 90), 7_500);
    }

    #[test]
    fn test_lateness_at_half_rate() {
        let calc = HourlyRateCalculator;
        // 60 minutes × 5,000 × 0.5 = 2,500
        assert_eq!(calc.lateness_penalty(BASE, 22, 60), 2_500);
    }

    #[test]
    fn test_zero_working_days_uses_default() {
        let calc = HourlyRateCalculator;
        assert_eq!(calc.overtime_pay(BASE, 0, 120), calc.overtime_pay(BASE, 22, 120));
    }

    #[test]
    fn test_non_positive_inputs_price_to_zero() {
        let calc = HourlyRateCalculator;
        assert_eq!(calc.overtime_pay(BASE, 22, 0), 0);
        assert_eq!(calc.lateness_penalty(BASE, 22, -5), 0);
        assert_eq!(calc.missing_work_penalty(0, 22, 60), 0);
    }
}
