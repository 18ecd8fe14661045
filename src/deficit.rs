/// Deficit module
/// Compares category demand with effective capacity, scores urgency and derives hiring recommendations

use tracing::{debug, instrument};

use crate::capacity::effective_capacity;
use crate::demand::{category_demand, ceil_count, CEIL_EPSILON};
use crate::models::{CategoryDeficit, CategoryProfile, DeficitResult, ZoneSnapshot};

const DEFICIT_WEIGHT: f64 = 40.0;
const CAPACITY_WEIGHT: f64 = 30.0;
const DEMAND_WEIGHT: f64 = 30.0;
const PENALTY_PER_WORKER: f64 = 5.0;
/// Demand per day at which the demand-pressure factor saturates
const DEMAND_SATURATION: f64 = 10.0;

const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

pub const RECOMMEND_ACCEPTANCE: &str =
    "Incentivize job acceptance to bring the rejection rate down";
pub const RECOMMEND_ROUTING: &str = "Optimize routing to raise the number of jobs per worker";
pub const RECOMMEND_SUFFICIENT: &str = "Current capacity is sufficient to cover demand";

/// Urgency score (1..=10) for a zone without a deadline component
pub fn calculate_urgency(deficit_total: i64, demand_per_day: f64, active_workers: u32) -> u8 {
    calculate_urgency_with_deadline(deficit_total, demand_per_day, active_workers, None)
}

/// Extra urgency points contributed by an approaching deadline
pub fn deadline_bonus(days_to_deadline: u32) -> f64 {
    match days_to_deadline {
        0..=10 => 30.0,
        11..=20 => 20.0,
        21..=30 => 10.0,
        _ => 0.0,
    }
}

/// Urgency score with an optional deadline folded into the raw sum before clamping.
///
/// A zone with no demand baseline or no workers is maximally urgent.
pub fn calculate_urgency_with_deadline(
    deficit_total: i64,
    demand_per_day: f64,
    active_workers: u32,
    days_to_deadline: Option<u32>,
) -> u8 {
    if demand_per_day <= 0.0 || active_workers == 0 {
        return MAX_SCORE as u8;
    }

    let deficit_factor = (deficit_total as f64 / demand_per_day * DEFICIT_WEIGHT).min(DEFICIT_WEIGHT);
    let capacity_factor = if active_workers < 2 {
        CAPACITY_WEIGHT
    } else {
        (CAPACITY_WEIGHT - active_workers as f64 * PENALTY_PER_WORKER).max(0.0)
    };
    let demand_factor = (demand_per_day / DEMAND_SATURATION * DEMAND_WEIGHT).min(DEMAND_WEIGHT);
    let bonus = days_to_deadline.map(deadline_bonus).unwrap_or(0.0);

    let raw = deficit_factor + capacity_factor + demand_factor + bonus;
    raw.clamp(MIN_SCORE, MAX_SCORE).round() as u8
}

/// Deficit analysis of a zone for its current demand
pub fn compute_deficit(snapshot: &ZoneSnapshot, categories: &[CategoryProfile]) -> DeficitResult {
    compute_deficit_with_deadline(snapshot, categories, None)
}

/// Deficit analysis of a zone; `days_to_deadline` raises urgency as the deadline nears
#[instrument(skip(snapshot, categories), fields(zone = %snapshot.zone_id))]
pub fn compute_deficit_with_deadline(
    snapshot: &ZoneSnapshot,
    categories: &[CategoryProfile],
    days_to_deadline: Option<u32>,
) -> DeficitResult {
    let deficits: Vec<CategoryDeficit> = categories
        .iter()
        .map(|profile| {
            let capacity = effective_capacity(&snapshot.metrics, profile);
            let demand = category_demand(snapshot, profile);
            let deficit = (demand - capacity.possible_jobs_per_day - CEIL_EPSILON).ceil() as i64;
            CategoryDeficit {
                category: profile.category,
                demand,
                capacity,
                deficit,
            }
        })
        .collect();

    let total_deficit: i64 = deficits.iter().map(|d| d.deficit).sum();
    let urgency_score = calculate_urgency_with_deadline(
        total_deficit,
        snapshot.demand_per_day,
        snapshot.metrics.active_workers,
        days_to_deadline,
    );
    let recommendations = recommendations(&deficits);

    debug!(total_deficit, urgency_score, "zone deficit computed");

    DeficitResult {
        zone_id: snapshot.zone_id.clone(),
        categories: deficits,
        total_deficit,
        urgency_score,
        recommendations,
    }
}

/// Additional workers needed to absorb a category deficit
pub fn workers_to_hire(deficit: &CategoryDeficit) -> u32 {
    if deficit.deficit <= 0 {
        return 0;
    }
    let jobs = deficit.capacity.possible_jobs_per_day;
    if jobs > 0.0 {
        ceil_count(deficit.deficit as f64 / jobs * deficit.capacity.nominal_capacity as f64)
    } else {
        // No capacity baseline: assume one job per worker per day
        deficit.deficit as u32
    }
}

/// Ordered recommendation list: per-category hires first, then general actions
pub fn recommendations(deficits: &[CategoryDeficit]) -> Vec<String> {
    let mut lines: Vec<String> = deficits
        .iter()
        .filter(|d| d.deficit > 0)
        .map(|d| {
            format!(
                "Hire {} additional {} workers to cover a deficit of {} jobs/day",
                workers_to_hire(d),
                d.category,
                d.deficit
            )
        })
        .collect();

    if lines.is_empty() {
        lines.push(RECOMMEND_SUFFICIENT.to_string());
    } else {
        lines.push(RECOMMEND_ACCEPTANCE.to_string());
        lines.push(RECOMMEND_ROUTING.to_string());
    }
    lines
}
