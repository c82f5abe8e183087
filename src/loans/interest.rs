//! Repayable-amount computation
//!
//! The total a borrower owes is fixed at loan creation from the principal,
//! the annual rate, the accrual type, and the day count between creation and
//! the due date. The caller supplies "now" so the computation stays
//! deterministic.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::InterestType;

/// Days in a year for the Actual/365 convention used throughout
const YEAR_BASIS: f64 = 365.0;

/// Errors from repayable-amount computation
#[derive(Error, Debug, PartialEq, Eq)]
pub enum InterestError {
    #[error("Due date must be in the future")]
    NonPositiveTerm,

    #[error("Principal and interest rate must be positive finite numbers")]
    InvalidInput,
}

/// Day count from `now` to `due_date`, rounded up so any part of a day
/// accrues a full day of interest
pub fn day_count(now: DateTime<Utc>, due_date: DateTime<Utc>) -> i64 {
    let millis = (due_date - now).num_milliseconds();
    (millis as f64 / 86_400_000.0).ceil() as i64
}

/// Total repayable amount for the given terms
///
/// - simple: `principal + principal * rate * days / 36500`
/// - compound: `principal * (1 + rate / 36500)^days` (daily compounding)
pub fn total_repayable(
    principal: f64,
    annual_rate: f64,
    interest_type: InterestType,
    days: i64,
) -> Result<f64, InterestError> {
    if days <= 0 {
        return Err(InterestError::NonPositiveTerm);
    }
    if !principal.is_finite() || principal <= 0.0 || !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(InterestError::InvalidInput);
    }

    let total = match interest_type {
        InterestType::Simple => {
            principal + principal * annual_rate * days as f64 / (YEAR_BASIS * 100.0)
        }
        InterestType::Compound => {
            let daily_rate = annual_rate / (YEAR_BASIS * 100.0);
            principal * (1.0 + daily_rate).powi(days as i32)
        }
    };

    if !total.is_finite() {
        return Err(InterestError::InvalidInput);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const TOLERANCE: f64 = 1e-6;

    #[test]
    fn test_day_count_whole_days() {
        let now = Utc::now();
        assert_eq!(day_count(now, now + Duration::days(365)), 365);
        assert_eq!(day_count(now, now + Duration::days(1)), 1);
    }

    #[test]
    fn test_day_count_rounds_up() {
        let now = Utc::now();
        assert_eq!(day_count(now, now + Duration::hours(1)), 1);
        assert_eq!(day_count(now, now + Duration::hours(25)), 2);
    }

    #[test]
    fn test_day_count_past_due_date() {
        let now = Utc::now();
        assert!(day_count(now, now - Duration::days(3)) <= 0);
        assert_eq!(day_count(now, now), 0);
    }

    #[test]
    fn test_simple_interest_one_year() {
        // 100000 at 12% simple over 365 days -> 112000
        let total = total_repayable(100_000.0, 12.0, InterestType::Simple, 365).unwrap();
        assert!((total - 112_000.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_simple_interest_partial_term() {
        // principal + principal * rate * days / 36500
        let total = total_repayable(50_000.0, 10.0, InterestType::Simple, 90).unwrap();
        let expected = 50_000.0 + 50_000.0 * 10.0 * 90.0 / 36_500.0;
        assert!((total - expected).abs() < TOLERANCE);
    }

    #[test]
    fn test_compound_interest_one_year() {
        // principal * (1 + rate/36500)^days
        let total = total_repayable(100_000.0, 12.0, InterestType::Compound, 365).unwrap();
        let expected = 100_000.0 * (1.0_f64 + 12.0 / 36_500.0).powi(365);
        assert!((total - expected).abs() < TOLERANCE);
        // Daily compounding beats simple interest over the same term
        assert!(total > 112_000.0);
    }

    #[test]
    fn test_compound_single_day() {
        let total = total_repayable(1000.0, 36.5, InterestType::Compound, 1).unwrap();
        assert!((total - 1001.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_zero_rate() {
        let total = total_repayable(1000.0, 0.0, InterestType::Simple, 30).unwrap();
        assert!((total - 1000.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_rejects_non_positive_term() {
        assert_eq!(
            total_repayable(1000.0, 12.0, InterestType::Simple, 0),
            Err(InterestError::NonPositiveTerm)
        );
        assert_eq!(
            total_repayable(1000.0, 12.0, InterestType::Compound, -10),
            Err(InterestError::NonPositiveTerm)
        );
    }

    #[test]
    fn test_rejects_bad_numeric_inputs() {
        assert_eq!(
            total_repayable(f64::NAN, 12.0, InterestType::Simple, 30),
            Err(InterestError::InvalidInput)
        );
        assert_eq!(
            total_repayable(1000.0, f64::INFINITY, InterestType::Compound, 30),
            Err(InterestError::InvalidInput)
        );
        assert_eq!(
            total_repayable(-5.0, 12.0, InterestType::Simple, 30),
            Err(InterestError::InvalidInput)
        );
        assert_eq!(
            total_repayable(0.0, 12.0, InterestType::Simple, 30),
            Err(InterestError::InvalidInput)
        );
    }
}
