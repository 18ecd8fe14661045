/// Planning run orchestration
/// Wires capacity, deficit, projection, simulation and budget allocation into one report

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::capacity::zone_capacity;
use crate::config::PlanningConfig;
use crate::deficit::compute_deficit;
use crate::error::Result;
use crate::models::{
    AllocationPlan, CapacityResult, DeficitResult, MarketingChannel, RotationRates,
    SimulationInputs, SimulationResult, TwoMonthProjection, ZoneId, ZoneSnapshot,
};
use crate::monte_carlo::{run_monte_carlo_simulation, CancelToken};
use crate::optimizer::optimize_allocation;
use crate::projection::MultiMonthProjector;

/// Recruitment funnel assumptions for the simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunnelAssumptions {
    pub cpa: f64,
    pub conversion_rate: f64,
    pub retention_rate: f64,
    /// Standard deviation of each input around its expected value
    pub spread: SimulationInputs,
}

/// Everything the surrounding application supplies for one planning run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanningInput {
    pub zones: Vec<ZoneSnapshot>,
    pub national_forecast: f64,
    /// Falls back to the configured default rate when absent
    #[serde(default)]
    pub rotation: Option<RotationRates>,
    pub channels: Vec<MarketingChannel>,
    pub funnel: FunnelAssumptions,
    /// Marketing budget; the projected recruitment budget is used when absent
    #[serde(default)]
    pub marketing_budget: Option<f64>,
    /// Recruits the simulation must reach; defaults to the two-month need
    #[serde(default)]
    pub simulation_target: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneCapacity {
    pub zone_id: ZoneId,
    pub capacities: Vec<CapacityResult>,
}

/// Outputs of one planning run, ready to render or persist
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanningReport {
    pub as_of: NaiveDate,
    pub capacities: Vec<ZoneCapacity>,
    pub deficits: Vec<DeficitResult>,
    pub projection: TwoMonthProjection,
    pub marketing_budget: f64,
    pub simulation: SimulationResult,
    pub allocation: AllocationPlan,
}

pub struct WorkforcePlanner {
    config: PlanningConfig,
}

impl WorkforcePlanner {
    /// Create a planner; the configuration is validated once here
    pub fn new(config: PlanningConfig) -> Result<Self> {
        config.validate()?;
        Ok(WorkforcePlanner { config })
    }

    #[instrument(skip(self, input, cancel), fields(zones = input.zones.len()))]
    pub fn plan(
        &self,
        input: &PlanningInput,
        as_of: NaiveDate,
        cancel: Option<&CancelToken>,
    ) -> Result<PlanningReport> {
        for snapshot in &input.zones {
            snapshot.validate()?;
        }

        let categories = &self.config.categories;
        let capacities: Vec<ZoneCapacity> = input
            .zones
            .par_iter()
            .map(|snapshot| ZoneCapacity {
                zone_id: snapshot.zone_id.clone(),
                capacities: zone_capacity(&snapshot.metrics, categories),
            })
            .collect();
        let deficits: Vec<DeficitResult> = input
            .zones
            .par_iter()
            .map(|snapshot| compute_deficit(snapshot, categories))
            .collect();

        let rotation = input
            .rotation
            .clone()
            .unwrap_or_else(|| RotationRates::uniform(self.config.default_rotation_rate));
        let projection = MultiMonthProjector::new(&self.config).project_two_months(
            &input.zones,
            input.national_forecast,
            &rotation,
            as_of,
        )?;

        let marketing_budget = input.marketing_budget.unwrap_or(projection.overall_budget);
        let expected = SimulationInputs {
            budget: marketing_budget,
            cpa: input.funnel.cpa,
            conversion_rate: input.funnel.conversion_rate,
            retention_rate: input.funnel.retention_rate,
        };
        let target = input.simulation_target.unwrap_or(
            projection.target_month.total_need as f64 + projection.next_month.total_need as f64,
        );
        let simulation = run_monte_carlo_simulation(
            &expected,
            &input.funnel.spread,
            self.config.monte_carlo_trials,
            self.config.monte_carlo_seed,
            Some(target),
            cancel,
        )?;

        let allocation = optimize_allocation(marketing_budget, &input.channels)?;

        info!(
            zones = input.zones.len(),
            deficit_zones = deficits.iter().filter(|d| d.total_deficit > 0).count(),
            marketing_budget,
            expected_recruits = allocation.total_expected_recruits,
            "planning run complete"
        );

        Ok(PlanningReport {
            as_of,
            capacities,
            deficits,
            projection,
            marketing_budget,
            simulation,
            allocation,
        })
    }
}
