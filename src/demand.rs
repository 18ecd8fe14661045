/// Demand calculation module
/// Splits zone demand across service categories and distributes the national forecast across zones

use crate::models::{CategoryProfile, ZoneSnapshot};

/// Daily demand for one category of a zone.
/// Uses the collaborator's explicit figure when present, otherwise the policy split.
pub fn category_demand(snapshot: &ZoneSnapshot, profile: &CategoryProfile) -> f64 {
    snapshot
        .demand_for(profile.category)
        .unwrap_or(snapshot.demand_per_day * profile.demand_share)
}

/// Services a zone is expected to handle in a month
pub fn projected_services(national_forecast: f64, zone_share: f64, seasonal_factor: f64) -> f64 {
    national_forecast * zone_share * seasonal_factor
}

// Keeps products such as 100 * 0.07 (= 7.000000000000001) from rounding up a whole head.
pub(crate) const CEIL_EPSILON: f64 = 1e-9;

/// Round a head count up to the next whole worker
pub fn ceil_count(value: f64) -> u32 {
    if value <= 0.0 {
        return 0;
    }
    (value - CEIL_EPSILON).ceil() as u32
}

/// Workers needed to handle the projected services.
/// `None` when the head count does not fit in a `u32`.
pub fn required_workers(projected_services: f64, services_per_worker_per_month: f64) -> Option<u32> {
    if services_per_worker_per_month <= 0.0 {
        return Some(0);
    }
    let workers = projected_services / services_per_worker_per_month;
    if workers - CEIL_EPSILON > u32::MAX as f64 {
        return None;
    }
    Some(ceil_count(workers))
}
