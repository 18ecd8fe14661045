/// Planning configuration
/// Every policy constant the engine uses lives here so callers and tests can override it

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlanningError, Result};
use crate::models::{CategoryProfile, ServiceCategory, ZoneId, ZoneProfile};

const SHARE_TOLERANCE: f64 = 1e-6;

/// Policy constants for one planning run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Category table, in declaration order (recommendations follow this order)
    pub categories: Vec<CategoryProfile>,
    /// Demand multiplier per calendar month, January first
    pub seasonal_factors: [f64; 12],
    /// Zone catalogue with each zone's share of the national forecast
    pub zones: Vec<ZoneProfile>,
    pub avg_services_per_worker_per_month: f64,
    pub cost_per_hire: f64,
    /// Combined two-month budget above which a budget-approval action is raised
    pub budget_approval_threshold: f64,
    /// Days added to the target month deadline to obtain the next month deadline
    pub next_month_deadline_offset_days: u32,
    /// Month-level total need above which the month is critical
    pub critical_total_need: u32,
    /// Month-level total need above which the month is urgent
    pub urgent_total_need: u32,
    pub default_rotation_rate: f64,
    pub monte_carlo_trials: usize,
    pub monte_carlo_seed: u64,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        PlanningConfig {
            categories: vec![
                CategoryProfile {
                    category: ServiceCategory::Local,
                    avg_duration_hours: 2.0,
                    demand_share: 0.55,
                },
                CategoryProfile {
                    category: ServiceCategory::Regional,
                    avg_duration_hours: 4.0,
                    demand_share: 0.25,
                },
                CategoryProfile {
                    category: ServiceCategory::LongHaul,
                    avg_duration_hours: 8.0,
                    demand_share: 0.10,
                },
                CategoryProfile {
                    category: ServiceCategory::Express,
                    avg_duration_hours: 1.0,
                    demand_share: 0.10,
                },
            ],
            seasonal_factors: [
                0.90, // January
                0.85, // February
                0.95, // March
                1.00, // April
                1.00, // May
                1.05, // June
                1.10, // July
                1.05, // August
                0.95, // September
                1.00, // October
                1.10, // November
                1.15, // December
            ],
            zones: vec![
                zone("norte", "Norte", &["Chihuahua", "Sonora", "Coahuila"], 0.20),
                zone("noreste", "Noreste", &["Nuevo León", "Tamaulipas"], 0.15),
                zone("centro", "Centro", &["CDMX", "Estado de México", "Puebla"], 0.35),
                zone("occidente", "Occidente", &["Jalisco", "Michoacán", "Colima"], 0.18),
                zone("sureste", "Sureste", &["Yucatán", "Quintana Roo", "Tabasco"], 0.12),
            ],
            avg_services_per_worker_per_month: 45.0,
            cost_per_hire: 350.0,
            budget_approval_threshold: 10_000.0,
            next_month_deadline_offset_days: 30,
            critical_total_need: 50,
            urgent_total_need: 20,
            default_rotation_rate: 0.10,
            monte_carlo_trials: 2_000,
            monte_carlo_seed: 42,
        }
    }
}

fn zone(id: &str, name: &str, regions: &[&str], share: f64) -> ZoneProfile {
    ZoneProfile {
        id: ZoneId::from(id),
        name: name.to_string(),
        regions: regions.iter().map(|r| r.to_string()).collect(),
        demand_share: share,
    }
}

impl PlanningConfig {
    /// Parse a JSON document; omitted fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PlanningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        info!(path = %path.display(), zones = config.zones.len(), "loaded planning configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(PlanningError::InvalidConfig("category table is empty".into()));
        }
        for (i, profile) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|p| p.category == profile.category) {
                return Err(PlanningError::InvalidCategory {
                    category: profile.category,
                    reason: "declared more than once".into(),
                });
            }
            if !(profile.avg_duration_hours.is_finite() && profile.avg_duration_hours > 0.0) {
                return Err(PlanningError::InvalidCategory {
                    category: profile.category,
                    reason: format!(
                        "average duration {} must be positive",
                        profile.avg_duration_hours
                    ),
                });
            }
            if !(0.0..=1.0).contains(&profile.demand_share) {
                return Err(PlanningError::InvalidCategory {
                    category: profile.category,
                    reason: format!("demand share {} must be within [0, 1]", profile.demand_share),
                });
            }
        }
        let category_total: f64 = self.categories.iter().map(|p| p.demand_share).sum();
        if (category_total - 1.0).abs() > SHARE_TOLERANCE {
            return Err(PlanningError::InvalidConfig(format!(
                "category demand shares sum to {}, expected 1.0",
                category_total
            )));
        }

        for (i, factor) in self.seasonal_factors.iter().enumerate() {
            if !(factor.is_finite() && *factor > 0.0) {
                return Err(PlanningError::InvalidConfig(format!(
                    "seasonal factor for month {} must be positive, got {}",
                    i + 1,
                    factor
                )));
            }
        }

        if !self.zones.is_empty() {
            for (i, zone) in self.zones.iter().enumerate() {
                if self.zones[..i].iter().any(|z| z.id == zone.id) {
                    return Err(PlanningError::InvalidConfig(format!(
                        "zone {} declared more than once",
                        zone.id
                    )));
                }
                if !(0.0..=1.0).contains(&zone.demand_share) {
                    return Err(PlanningError::InvalidConfig(format!(
                        "zone {} share {} must be within [0, 1]",
                        zone.id, zone.demand_share
                    )));
                }
            }
            let zone_total: f64 = self.zones.iter().map(|z| z.demand_share).sum();
            if (zone_total - 1.0).abs() > SHARE_TOLERANCE {
                return Err(PlanningError::InvalidConfig(format!(
                    "zone shares sum to {}, expected 1.0",
                    zone_total
                )));
            }
        }

        if !(self.avg_services_per_worker_per_month.is_finite()
            && self.avg_services_per_worker_per_month > 0.0)
        {
            return Err(PlanningError::InvalidConfig(
                "avg_services_per_worker_per_month must be positive".into(),
            ));
        }
        if !(self.cost_per_hire.is_finite() && self.cost_per_hire >= 0.0) {
            return Err(PlanningError::InvalidConfig(
                "cost_per_hire must be non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_rotation_rate) {
            return Err(PlanningError::InvalidConfig(
                "default_rotation_rate must be within [0, 1]".into(),
            ));
        }
        if self.monte_carlo_trials == 0 {
            return Err(PlanningError::InvalidConfig(
                "monte_carlo_trials must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Zone table keyed by identifier, resolved once per run
    pub fn zone_index(&self) -> BTreeMap<ZoneId, ZoneProfile> {
        self.zones.iter().map(|z| (z.id.clone(), z.clone())).collect()
    }
}
