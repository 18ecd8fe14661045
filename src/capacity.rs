/// Capacity module
/// Converts a raw worker count into effective daily service capacity per category

use crate::models::{CapacityResult, CategoryProfile, OperationalMetrics};

// Absorbs binary representation error (e.g. 61.19999999) before flooring to cents.
const FLOOR_EPSILON: f64 = 1e-9;

/// Truncate to 2 decimal places, never rounding up
pub fn floor_2dp(value: f64) -> f64 {
    ((value * 100.0) + FLOOR_EPSILON).floor() / 100.0
}

/// Effective capacity of a zone for one service category.
///
/// Capacity is floored rather than rounded so the engine never promises more
/// jobs than the workforce can deliver. Inputs are expected to be validated at the
/// boundary (see `OperationalMetrics::validate`).
pub fn effective_capacity(metrics: &OperationalMetrics, profile: &CategoryProfile) -> CapacityResult {
    if metrics.active_workers == 0 {
        return CapacityResult {
            category: profile.category,
            nominal_capacity: 0,
            effective_capacity: 0.0,
            possible_jobs_per_day: 0.0,
        };
    }

    let nominal = metrics.active_workers;
    let effective = floor_2dp(
        nominal as f64 * (1.0 - metrics.rejection_rate) * metrics.operational_efficiency,
    );

    let jobs_per_worker = if profile.avg_duration_hours > 0.0 {
        metrics.available_hours_per_worker_per_day / profile.avg_duration_hours
    } else {
        0.0
    };
    let possible_jobs = floor_2dp(effective * jobs_per_worker);

    CapacityResult {
        category: profile.category,
        nominal_capacity: nominal,
        effective_capacity: effective,
        possible_jobs_per_day: possible_jobs,
    }
}

/// Capacity for every configured category, in declaration order
pub fn zone_capacity(metrics: &OperationalMetrics, profiles: &[CategoryProfile]) -> Vec<CapacityResult> {
    profiles
        .iter()
        .map(|profile| effective_capacity(metrics, profile))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceCategory;

    fn profile(hours: f64) -> CategoryProfile {
        CategoryProfile {
            category: ServiceCategory::Regional,
            avg_duration_hours: hours,
            demand_share: 1.0,
        }
    }

    fn metrics(workers: u32) -> OperationalMetrics {
        OperationalMetrics {
            active_workers: workers,
            rejection_rate: 0.1,
            available_hours_per_worker_per_day: 16.0,
            operational_efficiency: 0.85,
        }
    }

    #[test]
    fn test_healthy_zone_capacity() {
        let result = effective_capacity(&metrics(30), &profile(6.0));
        assert_eq!(result.nominal_capacity, 30);
        assert!((result.effective_capacity - 22.95).abs() < 1e-9);
        assert!((result.possible_jobs_per_day - 61.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_workers_yields_exact_zero() {
        let result = effective_capacity(&metrics(0), &profile(6.0));
        assert_eq!(result.nominal_capacity, 0);
        assert_eq!(result.effective_capacity, 0.0);
        assert_eq!(result.possible_jobs_per_day, 0.0);
    }

    #[test]
    fn test_floors_instead_of_rounding() {
        // 7 * 0.9 * 0.85 = 5.355
        let result = effective_capacity(&metrics(7), &profile(6.0));
        assert!((result.effective_capacity - 5.35).abs() < 1e-9);
        assert_eq!(floor_2dp(1.239), 1.23);
        assert_eq!(floor_2dp(2.0), 2.0);
    }

    #[test]
    fn test_capacity_is_monotonic_in_workers() {
        let mut previous = 0.0;
        for workers in 0..200 {
            let result = effective_capacity(&metrics(workers), &profile(6.0));
            assert!(result.effective_capacity >= previous);
            previous = result.effective_capacity;
        }
    }

    #[test]
    fn test_zone_capacity_follows_profile_order() {
        let profiles = vec![
            CategoryProfile { category: ServiceCategory::Local, avg_duration_hours: 2.0, demand_share: 0.6 },
            CategoryProfile { category: ServiceCategory::LongHaul, avg_duration_hours: 8.0, demand_share: 0.4 },
        ];
        let results = zone_capacity(&metrics(10), &profiles);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].category, ServiceCategory::Local);
        assert!(results[0].possible_jobs_per_day > results[1].possible_jobs_per_day);
    }
}
