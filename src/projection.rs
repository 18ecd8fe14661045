/// Multi-month projection module
/// Rolls capacity and deficit analysis forward over a two-month recruitment horizon

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::config::PlanningConfig;
use crate::deficit::compute_deficit_with_deadline;
use crate::demand::{ceil_count, projected_services, required_workers};
use crate::error::{PlanningError, Result};
use crate::models::{
    CategoryDemand, MonthProjection, MonthlyNeed, RotationRates, TwoMonthProjection, UrgencyLevel,
    ZoneId, ZoneProfile, ZoneSnapshot,
};
use crate::seasonal::SeasonalAdjuster;

/// Days left in the month of `as_of`, not counting `as_of` itself
pub fn days_remaining_in_month(as_of: NaiveDate) -> Result<u32> {
    let next_month = first_of_month(as_of)
        .checked_add_months(Months::new(1))
        .ok_or(PlanningError::InvalidDate(as_of))?;
    Ok((next_month - as_of).num_days() as u32 - 1)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(date.day0() as i64)
}

/// Month-level urgency escalates from the worst zone and the aggregate need
pub fn month_urgency(needs: &[MonthlyNeed], total_need: u32, config: &PlanningConfig) -> UrgencyLevel {
    let any = |level: UrgencyLevel| needs.iter().any(|n| n.urgency_level == level);

    if any(UrgencyLevel::Critical) || total_need > config.critical_total_need {
        UrgencyLevel::Critical
    } else if any(UrgencyLevel::Urgent) || total_need > config.urgent_total_need {
        UrgencyLevel::Urgent
    } else if total_need == 0 {
        UrgencyLevel::Oversupplied
    } else {
        UrgencyLevel::Stable
    }
}

pub struct MultiMonthProjector<'a> {
    config: &'a PlanningConfig,
    seasonal: SeasonalAdjuster,
    zones: BTreeMap<ZoneId, ZoneProfile>,
}

impl<'a> MultiMonthProjector<'a> {
    pub fn new(config: &'a PlanningConfig) -> Self {
        MultiMonthProjector {
            config,
            seasonal: SeasonalAdjuster::new(config.seasonal_factors),
            zones: config.zone_index(),
        }
    }

    /// Recruitment needs for the two months following `as_of`.
    ///
    /// Empty zone input yields empty month projections rather than an error.
    #[instrument(skip(self, snapshots, rotation), fields(zones = snapshots.len()))]
    pub fn project_two_months(
        &self,
        snapshots: &[ZoneSnapshot],
        national_forecast: f64,
        rotation: &RotationRates,
        as_of: NaiveDate,
    ) -> Result<TwoMonthProjection> {
        if !national_forecast.is_finite() || national_forecast < 0.0 {
            return Err(PlanningError::InvalidForecast(national_forecast));
        }
        rotation.validate()?;
        for snapshot in snapshots {
            snapshot.validate()?;
        }

        let start = first_of_month(as_of);
        let target = start
            .checked_add_months(Months::new(1))
            .ok_or(PlanningError::InvalidDate(as_of))?;
        let next = start
            .checked_add_months(Months::new(2))
            .ok_or(PlanningError::InvalidDate(as_of))?;

        let target_days = days_remaining_in_month(as_of)?;
        let next_days = target_days + self.config.next_month_deadline_offset_days;

        let target_month = self.project_month(snapshots, national_forecast, rotation, target, target_days)?;
        let next_month = self.project_month(snapshots, national_forecast, rotation, next, next_days)?;

        let overall_budget = target_month.budget + next_month.budget;
        let critical_actions = self.critical_actions(&target_month, &next_month, overall_budget);

        info!(
            target_need = target_month.total_need,
            next_need = next_month.total_need,
            overall_budget,
            target_level = %target_month.urgency_level,
            "two-month projection complete"
        );

        Ok(TwoMonthProjection {
            as_of,
            target_month,
            next_month,
            overall_budget,
            critical_actions,
        })
    }

    fn project_month(
        &self,
        snapshots: &[ZoneSnapshot],
        national_forecast: f64,
        rotation: &RotationRates,
        month: NaiveDate,
        days_to_deadline: u32,
    ) -> Result<MonthProjection> {
        let seasonal_factor = self.seasonal.factor_for(month);

        let needs: Vec<MonthlyNeed> = snapshots
            .par_iter()
            .map(|snapshot| {
                self.project_zone(
                    snapshot,
                    national_forecast,
                    rotation,
                    month,
                    seasonal_factor,
                    days_to_deadline,
                )
            })
            .collect::<Result<_>>()?;

        let total_need = needs
            .iter()
            .try_fold(0u32, |total, n| total.checked_add(n.final_need))
            .ok_or(PlanningError::InvalidForecast(national_forecast))?;
        let budget: f64 = needs.iter().map(|n| n.budget).sum();
        let urgency_level = month_urgency(&needs, total_need, self.config);

        Ok(MonthProjection {
            month,
            days_to_deadline,
            seasonal_factor,
            needs,
            total_need,
            budget,
            urgency_level,
        })
    }

    fn project_zone(
        &self,
        snapshot: &ZoneSnapshot,
        national_forecast: f64,
        rotation: &RotationRates,
        month: NaiveDate,
        seasonal_factor: f64,
        days_to_deadline: u32,
    ) -> Result<MonthlyNeed> {
        let (zone_name, share) = match self.zones.get(&snapshot.zone_id) {
            Some(profile) => (profile.name.clone(), profile.demand_share),
            None => {
                warn!(zone = %snapshot.zone_id, "zone missing from share table, projecting no services");
                (snapshot.zone_id.to_string(), 0.0)
            }
        };

        let (rotation_rate, from_dataset) = rotation.rate_for(&snapshot.zone_id);
        if !from_dataset && !rotation.overrides.is_empty() {
            warn!(
                zone = %snapshot.zone_id,
                rotation_rate,
                "zone missing from rotation dataset, using default rate"
            );
        }

        let services = projected_services(national_forecast, share, seasonal_factor);
        let out_of_range = || PlanningError::InvalidForecast(national_forecast);
        let required = required_workers(services, self.config.avg_services_per_worker_per_month)
            .ok_or_else(out_of_range)?;
        let current = snapshot.metrics.active_workers;
        let current_gap = required.saturating_sub(current);
        // Attrition is charged even when current staffing covers demand
        let rotation_impact = ceil_count(current as f64 * rotation_rate);
        let final_need = current_gap.checked_add(rotation_impact).ok_or_else(out_of_range)?;

        let seasonal_snapshot = seasonally_adjusted(snapshot, seasonal_factor);
        let deficit = compute_deficit_with_deadline(
            &seasonal_snapshot,
            &self.config.categories,
            Some(days_to_deadline),
        );
        let urgency_level = UrgencyLevel::from_score(deficit.urgency_score);

        debug!(
            zone = %snapshot.zone_id,
            %month,
            required,
            current,
            final_need,
            urgency = %urgency_level,
            "zone month projected"
        );

        Ok(MonthlyNeed {
            zone_id: snapshot.zone_id.clone(),
            zone_name,
            month,
            projected_services: services,
            required_workers: required,
            current_workers: current,
            current_gap,
            rotation_rate,
            rotation_impact,
            final_need,
            urgency_score: deficit.urgency_score,
            urgency_level,
            budget: final_need as f64 * self.config.cost_per_hire,
        })
    }

    fn critical_actions(
        &self,
        target: &MonthProjection,
        next: &MonthProjection,
        overall_budget: f64,
    ) -> Vec<String> {
        let mut actions: Vec<String> = target
            .needs
            .iter()
            .filter(|n| n.urgency_level == UrgencyLevel::Critical)
            .map(|n| {
                if n.final_need > 0 {
                    format!(
                        "Recruit {} workers in {} immediately (critical staffing)",
                        n.final_need, n.zone_name
                    )
                } else {
                    format!(
                        "Review staffing in {} immediately ({} active workers, critical urgency with no projected hires)",
                        n.zone_name, n.current_workers
                    )
                }
            })
            .collect();

        let urgent = target
            .needs
            .iter()
            .filter(|n| n.urgency_level == UrgencyLevel::Urgent)
            .count();
        if urgent > 0 {
            actions.push(format!(
                "{} zone(s) require recruitment within {} days",
                urgent, target.days_to_deadline
            ));
        }

        if next.total_need > 0 {
            actions.push(format!(
                "Prepare {} hires for {}",
                next.total_need,
                next.month.format("%B %Y")
            ));
        }

        if overall_budget > self.config.budget_approval_threshold {
            actions.push(format!(
                "Approve recruitment budget of ${:.2}",
                overall_budget
            ));
        }

        actions
    }
}

fn seasonally_adjusted(snapshot: &ZoneSnapshot, factor: f64) -> ZoneSnapshot {
    ZoneSnapshot {
        zone_id: snapshot.zone_id.clone(),
        metrics: snapshot.metrics.clone(),
        demand_per_day: snapshot.demand_per_day * factor,
        category_demands: snapshot
            .category_demands
            .iter()
            .map(|d| CategoryDemand {
                category: d.category,
                jobs_per_day: d.jobs_per_day * factor,
            })
            .collect(),
    }
}
