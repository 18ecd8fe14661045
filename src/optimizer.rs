/// Optimization module for distributing a marketing budget across acquisition channels
/// Greedy allocation by conversion efficiency, bounded by each channel's capacity

use std::cmp::Ordering;

use tracing::{debug, instrument, warn};

use crate::error::{PlanningError, Result};
use crate::models::{AllocationPlan, ChannelAllocation, MarketingChannel};

fn validate_channel(channel: &MarketingChannel) -> Result<()> {
    let invalid = |reason: &str| {
        Err(PlanningError::InvalidChannel {
            channel: channel.id.clone(),
            reason: reason.to_string(),
        })
    };
    if !channel.cpa.is_finite() || channel.cpa < 0.0 {
        return invalid("cpa must be finite and non-negative");
    }
    if !(0.0..=1.0).contains(&channel.conversion_rate) {
        return invalid("conversion rate must be within [0, 1]");
    }
    if channel.capacity.is_nan() || channel.capacity < 0.0 {
        return invalid("capacity must be non-negative");
    }
    Ok(())
}

/// Conversions per unit of budget
pub fn channel_efficiency(channel: &MarketingChannel) -> f64 {
    if channel.cpa > 0.0 {
        channel.conversion_rate / channel.cpa
    } else {
        0.0
    }
}

/// Preference order: higher efficiency first, ties go to the higher conversion rate,
/// remaining ties keep declaration order.
fn rank_channels(channels: &[MarketingChannel]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..channels.len())
        .filter(|&i| channels[i].cpa > 0.0)
        .collect();
    ranked.sort_by(|&a, &b| {
        let (a, b) = (&channels[a], &channels[b]);
        channel_efficiency(b)
            .partial_cmp(&channel_efficiency(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.conversion_rate
                    .partial_cmp(&a.conversion_rate)
                    .unwrap_or(Ordering::Equal)
            })
    });
    ranked
}

fn allocated_sum(allocations: &[ChannelAllocation]) -> f64 {
    allocations.iter().map(|a| a.budget_allocated).sum()
}

/// Pull the last funded channel back until the allocations sum to at most
/// `total_budget`. Repeated subtraction can leave the sum a rounding step above it.
fn trim_overshoot(
    total_budget: f64,
    allocations: &mut [ChannelAllocation],
    index: usize,
    channel: &MarketingChannel,
) {
    let step = f64::EPSILON * total_budget;
    let mut total = allocated_sum(allocations);
    while total > total_budget && allocations[index].budget_allocated > 0.0 {
        let excess = (total - total_budget).max(step);
        let allocation = &mut allocations[index];
        allocation.budget_allocated = (allocation.budget_allocated - excess).max(0.0);
        allocation.expected_recruits =
            allocation.budget_allocated / channel.cpa * channel.conversion_rate;
        total = allocated_sum(allocations);
    }
}

/// Allocate `total_budget` to maximize expected recruits.
///
/// Allocations are returned in the same order as `channels`. Channels with a zero
/// CPA are treated as invalid data and receive nothing.
#[instrument(skip(channels), fields(channels = channels.len()))]
pub fn optimize_allocation(total_budget: f64, channels: &[MarketingChannel]) -> Result<AllocationPlan> {
    if !total_budget.is_finite() || total_budget < 0.0 {
        return Err(PlanningError::InvalidBudget(total_budget));
    }
    for channel in channels {
        validate_channel(channel)?;
        if channel.cpa == 0.0 {
            warn!(channel = %channel.id, "channel has zero CPA, excluded from allocation");
        }
    }

    let mut allocations: Vec<ChannelAllocation> = channels
        .iter()
        .map(|c| ChannelAllocation {
            channel_id: c.id.clone(),
            budget_allocated: 0.0,
            expected_recruits: 0.0,
        })
        .collect();

    let mut remaining = total_budget;
    let mut last_funded = None;
    for index in rank_channels(channels) {
        if remaining <= 0.0 {
            break;
        }
        let channel = &channels[index];
        let ceiling = channel.capacity * channel.cpa;
        let budget = remaining.min(ceiling);

        allocations[index].budget_allocated = budget;
        allocations[index].expected_recruits = budget / channel.cpa * channel.conversion_rate;
        remaining -= budget;
        if budget > 0.0 {
            last_funded = Some(index);
        }

        debug!(
            channel = %channel.id,
            budget,
            efficiency = channel_efficiency(channel),
            "channel allocated"
        );
    }

    if let Some(index) = last_funded {
        trim_overshoot(total_budget, &mut allocations, index, &channels[index]);
    }

    let total_allocated = allocated_sum(&allocations);
    let total_expected_recruits: f64 = allocations.iter().map(|a| a.expected_recruits).sum();

    Ok(AllocationPlan {
        total_budget,
        allocations,
        total_allocated,
        unallocated_budget: total_budget - total_allocated,
        total_expected_recruits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, cpa: f64, conversion_rate: f64, capacity: f64) -> MarketingChannel {
        MarketingChannel {
            id: id.to_string(),
            cpa,
            conversion_rate,
            capacity,
        }
    }

    #[test]
    fn test_prefers_efficient_channel() {
        let channels = vec![
            channel("radio", 100.0, 0.2, 1_000.0),
            channel("social", 20.0, 0.1, 1_000.0),
        ];
        let plan = optimize_allocation(5_000.0, &channels).unwrap();

        assert_eq!(plan.allocations[0].budget_allocated, 0.0);
        assert_eq!(plan.allocations[1].budget_allocated, 5_000.0);
        assert!((plan.total_expected_recruits - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_clamp_spills_to_next_channel() {
        let channels = vec![
            channel("referrals", 10.0, 0.5, 30.0),
            channel("job_board", 40.0, 0.4, 1_000.0),
        ];
        let plan = optimize_allocation(10_000.0, &channels).unwrap();

        assert_eq!(plan.allocations[0].budget_allocated, 300.0);
        assert_eq!(plan.allocations[1].budget_allocated, 9_700.0);
        assert_eq!(plan.total_allocated, 10_000.0);
        assert_eq!(plan.unallocated_budget, 0.0);
    }

    #[test]
    fn test_budget_left_when_capacity_exhausted() {
        let channels = vec![channel("flyers", 5.0, 0.1, 10.0)];
        let plan = optimize_allocation(1_000.0, &channels).unwrap();
        assert_eq!(plan.total_allocated, 50.0);
        assert_eq!(plan.unallocated_budget, 950.0);
    }

    #[test]
    fn test_allocations_never_exceed_budget() {
        let channels = vec![
            channel("referrals", 1.0, 0.3, 2_124.94),
            channel("job_board", 1.0, 0.2, 3_987.24),
            channel("social", 1.0, 0.1, 7_873.16),
        ];
        let total = 8_185.03;
        let plan = optimize_allocation(total, &channels).unwrap();

        let sum: f64 = plan.allocations.iter().map(|a| a.budget_allocated).sum();
        assert!(sum <= total);
        assert!(plan.total_allocated <= plan.total_budget);
        assert!(plan.unallocated_budget >= 0.0);
        assert!(plan.unallocated_budget < 1e-6);
        let social = &plan.allocations[2];
        assert!((social.expected_recruits - social.budget_allocated * 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_higher_conversion() {
        // Both convert 0.01 per unit of budget
        let channels = vec![
            channel("cheap", 10.0, 0.1, 10.0),
            channel("premium", 50.0, 0.5, 10.0),
        ];
        let plan = optimize_allocation(100.0, &channels).unwrap();
        assert_eq!(plan.allocations[1].budget_allocated, 100.0);
        assert_eq!(plan.allocations[0].budget_allocated, 0.0);
    }

    #[test]
    fn test_zero_cpa_excluded() {
        let channels = vec![
            channel("broken", 0.0, 0.9, 1_000.0),
            channel("social", 20.0, 0.1, 1_000.0),
        ];
        let plan = optimize_allocation(400.0, &channels).unwrap();
        assert_eq!(plan.allocations[0].budget_allocated, 0.0);
        assert_eq!(plan.allocations[0].expected_recruits, 0.0);
        assert_eq!(plan.allocations[1].budget_allocated, 400.0);
    }

    #[test]
    fn test_zero_budget() {
        let channels = vec![channel("social", 20.0, 0.1, 1_000.0)];
        let plan = optimize_allocation(0.0, &channels).unwrap();
        assert!(plan.allocations.iter().all(|a| a.budget_allocated == 0.0));
        assert_eq!(plan.total_expected_recruits, 0.0);
    }

    #[test]
    fn test_rejects_invalid_data() {
        assert!(matches!(
            optimize_allocation(-1.0, &[]),
            Err(PlanningError::InvalidBudget(_))
        ));
        let channels = vec![channel("social", 20.0, 1.5, 1_000.0)];
        assert!(matches!(
            optimize_allocation(100.0, &channels),
            Err(PlanningError::InvalidChannel { .. })
        ));
    }
}
