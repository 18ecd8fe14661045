use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlanningError, Result};

/// Stable zone identifier used as the key of every per-zone table
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        ZoneId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        ZoneId(id.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self {
        ZoneId(id)
    }
}

/// Geographic operating zone (reference data, loaded with the configuration)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneProfile {
    pub id: ZoneId,
    pub name: String,
    #[serde(default)]
    pub regions: Vec<String>,
    /// Share of the national monthly service forecast assigned to this zone
    pub demand_share: f64,
}

/// Class of job, distinguished by duration and demand share
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Local,
    Regional,
    LongHaul,
    Express,
}

impl ServiceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Local => "local",
            ServiceCategory::Regional => "regional",
            ServiceCategory::LongHaul => "long_haul",
            ServiceCategory::Express => "express",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed per-category configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub category: ServiceCategory,
    pub avg_duration_hours: f64,
    /// Fraction of the zone's daily demand that falls in this category
    pub demand_share: f64,
}

/// Operational snapshot of one zone for a planning period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationalMetrics {
    pub active_workers: u32,
    pub rejection_rate: f64,
    pub available_hours_per_worker_per_day: f64,
    pub operational_efficiency: f64,
}

impl OperationalMetrics {
    /// Rejects snapshots the pure capacity functions cannot accept.
    pub fn validate(&self, zone: &ZoneId) -> Result<()> {
        let invalid = |field: &'static str, value: f64, reason: &'static str| {
            Err(PlanningError::InvalidMetrics {
                zone: zone.clone(),
                field,
                value,
                reason,
            })
        };

        if !(0.0..=1.0).contains(&self.rejection_rate) {
            return invalid("rejection_rate", self.rejection_rate, "must be within [0, 1]");
        }
        if !self.available_hours_per_worker_per_day.is_finite()
            || self.available_hours_per_worker_per_day < 0.0
        {
            return invalid(
                "available_hours_per_worker_per_day",
                self.available_hours_per_worker_per_day,
                "must be finite and non-negative",
            );
        }
        if !(self.operational_efficiency > 0.0 && self.operational_efficiency <= 1.0) {
            return invalid(
                "operational_efficiency",
                self.operational_efficiency,
                "must be within (0, 1]",
            );
        }
        Ok(())
    }
}

/// Explicit demand figure for one category, overriding the default split
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryDemand {
    pub category: ServiceCategory,
    pub jobs_per_day: f64,
}

/// Raw aggregates the surrounding application supplies for one zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub zone_id: ZoneId,
    pub metrics: OperationalMetrics,
    pub demand_per_day: f64,
    #[serde(default)]
    pub category_demands: Vec<CategoryDemand>,
}

impl ZoneSnapshot {
    pub fn validate(&self) -> Result<()> {
        self.metrics.validate(&self.zone_id)?;

        if !self.demand_per_day.is_finite() || self.demand_per_day < 0.0 {
            return Err(PlanningError::InvalidMetrics {
                zone: self.zone_id.clone(),
                field: "demand_per_day",
                value: self.demand_per_day,
                reason: "must be finite and non-negative",
            });
        }
        for demand in &self.category_demands {
            if !demand.jobs_per_day.is_finite() || demand.jobs_per_day < 0.0 {
                return Err(PlanningError::InvalidMetrics {
                    zone: self.zone_id.clone(),
                    field: "category_demands.jobs_per_day",
                    value: demand.jobs_per_day,
                    reason: "must be finite and non-negative",
                });
            }
        }
        Ok(())
    }

    /// Explicit demand for a category, if the collaborator supplied one
    pub fn demand_for(&self, category: ServiceCategory) -> Option<f64> {
        self.category_demands
            .iter()
            .find(|d| d.category == category)
            .map(|d| d.jobs_per_day)
    }
}

/// Capacity of one zone for one service category
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapacityResult {
    pub category: ServiceCategory,
    pub nominal_capacity: u32,
    pub effective_capacity: f64,
    pub possible_jobs_per_day: f64,
}

/// Signed deficit for one category (negative = surplus)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryDeficit {
    pub category: ServiceCategory,
    pub demand: f64,
    pub capacity: CapacityResult,
    pub deficit: i64,
}

/// Deficit analysis of a single zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeficitResult {
    pub zone_id: ZoneId,
    pub categories: Vec<CategoryDeficit>,
    pub total_deficit: i64,
    pub urgency_score: u8,
    pub recommendations: Vec<String>,
}

/// Four-level staffing urgency classification
///
/// Variants are declared from least to most urgent so that `Ord` follows severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    #[serde(rename = "sobreabastecido")]
    Oversupplied,
    #[serde(rename = "estable")]
    Stable,
    #[serde(rename = "urgente")]
    Urgent,
    #[serde(rename = "critico")]
    Critical,
}

impl UrgencyLevel {
    /// Classifies a 1..=10 urgency score
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 7 => UrgencyLevel::Critical,
            s if s >= 5 => UrgencyLevel::Urgent,
            s if s >= 2 => UrgencyLevel::Stable,
            _ => UrgencyLevel::Oversupplied,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Oversupplied => "sobreabastecido",
            UrgencyLevel::Stable => "estable",
            UrgencyLevel::Urgent => "urgente",
            UrgencyLevel::Critical => "critico",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recruitment need of one zone for one projected month
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyNeed {
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub month: NaiveDate,
    pub projected_services: f64,
    pub required_workers: u32,
    pub current_workers: u32,
    pub current_gap: u32,
    pub rotation_rate: f64,
    pub rotation_impact: u32,
    pub final_need: u32,
    pub urgency_score: u8,
    pub urgency_level: UrgencyLevel,
    pub budget: f64,
}

/// All zone needs for one projected month
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthProjection {
    /// First day of the projected month
    pub month: NaiveDate,
    pub days_to_deadline: u32,
    pub seasonal_factor: f64,
    pub needs: Vec<MonthlyNeed>,
    pub total_need: u32,
    pub budget: f64,
    pub urgency_level: UrgencyLevel,
}

/// Rolling two-month recruitment plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoMonthProjection {
    pub as_of: NaiveDate,
    pub target_month: MonthProjection,
    pub next_month: MonthProjection,
    pub overall_budget: f64,
    pub critical_actions: Vec<String>,
}

/// Monthly attrition rates, with optional per-zone overrides
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationRates {
    pub default_rate: f64,
    #[serde(default)]
    pub overrides: BTreeMap<ZoneId, f64>,
}

impl RotationRates {
    pub fn uniform(rate: f64) -> Self {
        RotationRates {
            default_rate: rate,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, zone: impl Into<ZoneId>, rate: f64) -> Self {
        self.overrides.insert(zone.into(), rate);
        self
    }

    /// Rate for a zone and whether it came from the per-zone dataset
    pub fn rate_for(&self, zone: &ZoneId) -> (f64, bool) {
        match self.overrides.get(zone) {
            Some(rate) => (*rate, true),
            None => (self.default_rate, false),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let check = |rate: f64| {
            if (0.0..=1.0).contains(&rate) {
                Ok(())
            } else {
                Err(PlanningError::InvalidConfig(format!(
                    "rotation rate {} must be within [0, 1]",
                    rate
                )))
            }
        };
        check(self.default_rate)?;
        self.overrides.values().try_for_each(|rate| check(*rate))
    }
}

/// Recruitment funnel parameters, used both for expected values and spreads
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    pub budget: f64,
    pub cpa: f64,
    pub conversion_rate: f64,
    pub retention_rate: f64,
}

/// Distribution of recruitment outcomes across Monte Carlo trials
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trials: usize,
    pub seed: u64,
    pub target: f64,
    pub mean_outcome: f64,
    pub std_dev_outcome: f64,
    pub min_outcome: f64,
    pub max_outcome: f64,
    pub median_outcome: f64,
    pub confidence_interval_95: (f64, f64),
    pub success_probability: f64,
}

/// Marketing acquisition channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketingChannel {
    pub id: String,
    pub cpa: f64,
    pub conversion_rate: f64,
    /// Maximum acquisitions the channel can deliver in the period
    pub capacity: f64,
}

/// Budget assigned to one channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelAllocation {
    pub channel_id: String,
    pub budget_allocated: f64,
    pub expected_recruits: f64,
}

/// Result of distributing a marketing budget across channels
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub total_budget: f64,
    pub allocations: Vec<ChannelAllocation>,
    pub total_allocated: f64,
    pub unallocated_budget: f64,
    pub total_expected_recruits: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> OperationalMetrics {
        OperationalMetrics {
            active_workers: 10,
            rejection_rate: 0.2,
            available_hours_per_worker_per_day: 8.0,
            operational_efficiency: 0.9,
        }
    }

    #[test]
    fn test_urgency_level_thresholds() {
        assert_eq!(UrgencyLevel::from_score(10), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_score(7), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_score(6), UrgencyLevel::Urgent);
        assert_eq!(UrgencyLevel::from_score(5), UrgencyLevel::Urgent);
        assert_eq!(UrgencyLevel::from_score(4), UrgencyLevel::Stable);
        assert_eq!(UrgencyLevel::from_score(2), UrgencyLevel::Stable);
        assert_eq!(UrgencyLevel::from_score(1), UrgencyLevel::Oversupplied);
        assert!(UrgencyLevel::Critical > UrgencyLevel::Urgent);
        assert!(UrgencyLevel::Stable > UrgencyLevel::Oversupplied);
    }

    #[test]
    fn test_urgency_level_serializes_as_label() {
        let json = serde_json::to_string(&UrgencyLevel::Critical).unwrap();
        assert_eq!(json, "\"critico\"");
        let level: UrgencyLevel = serde_json::from_str("\"sobreabastecido\"").unwrap();
        assert_eq!(level, UrgencyLevel::Oversupplied);
    }

    #[test]
    fn test_metrics_validation() {
        let zone = ZoneId::from("centro");
        assert!(metrics().validate(&zone).is_ok());

        let mut bad = metrics();
        bad.rejection_rate = 1.5;
        assert!(matches!(
            bad.validate(&zone),
            Err(PlanningError::InvalidMetrics { field: "rejection_rate", .. })
        ));

        let mut bad = metrics();
        bad.operational_efficiency = 0.0;
        assert!(bad.validate(&zone).is_err());

        let mut bad = metrics();
        bad.available_hours_per_worker_per_day = -1.0;
        assert!(bad.validate(&zone).is_err());
    }

    #[test]
    fn test_snapshot_rejects_negative_demand() {
        let snapshot = ZoneSnapshot {
            zone_id: ZoneId::from("norte"),
            metrics: metrics(),
            demand_per_day: -3.0,
            category_demands: vec![],
        };
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("norte"));
    }

    #[test]
    fn test_rotation_rates_fallback() {
        let rates = RotationRates::uniform(0.1).with_override("norte", 0.25);
        assert_eq!(rates.rate_for(&ZoneId::from("norte")), (0.25, true));
        assert_eq!(rates.rate_for(&ZoneId::from("sur")), (0.1, false));
        assert!(RotationRates::uniform(1.2).validate().is_err());
    }
}
