use chrono::{Datelike, NaiveDate};

use crate::error::{PlanningError, Result};

/// Month-of-year demand multipliers
#[derive(Clone, Debug, PartialEq)]
pub struct SeasonalAdjuster {
    factors: [f64; 12],
}

impl SeasonalAdjuster {
    pub fn new(factors: [f64; 12]) -> Self {
        SeasonalAdjuster { factors }
    }

    /// Demand multiplier for a calendar month (1 = January)
    pub fn factor(&self, month: u32) -> Result<f64> {
        match month {
            1..=12 => Ok(self.factors[(month - 1) as usize]),
            _ => Err(PlanningError::InvalidMonth(month)),
        }
    }

    pub fn factor_for(&self, date: NaiveDate) -> f64 {
        // chrono guarantees month0() < 12
        self.factors[date.month0() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanningConfig;

    fn adjuster() -> SeasonalAdjuster {
        SeasonalAdjuster::new(PlanningConfig::default().seasonal_factors)
    }

    #[test]
    fn test_factor_lookup() {
        let adjuster = adjuster();
        assert_eq!(adjuster.factor(2).unwrap(), 0.85);
        assert_eq!(adjuster.factor(12).unwrap(), 1.15);
    }

    #[test]
    fn test_out_of_range_month() {
        let adjuster = adjuster();
        assert!(matches!(adjuster.factor(0), Err(PlanningError::InvalidMonth(0))));
        assert!(matches!(adjuster.factor(13), Err(PlanningError::InvalidMonth(13))));
    }

    #[test]
    fn test_factor_for_date_matches_month_lookup() {
        let adjuster = adjuster();
        for month in 1..=12 {
            let date = NaiveDate::from_ymd_opt(2026, month, 15).unwrap();
            assert_eq!(adjuster.factor_for(date), adjuster.factor(month).unwrap());
        }
    }
}
