/// Error types for the planning engine

use crate::models::{ServiceCategory, ZoneId};

/// Errors surfaced by the planning engine.
///
/// Degenerate arithmetic (zero demand, zero workers) is never an error; those cases
/// resolve to documented fallback values inside each component.
#[derive(thiserror::Error, Debug)]
pub enum PlanningError {
    #[error("Invalid metrics for zone {zone}: {field} = {value} ({reason})")]
    InvalidMetrics {
        zone: ZoneId,
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid profile for category {category}: {reason}")]
    InvalidCategory {
        category: ServiceCategory,
        reason: String,
    },

    #[error("Invalid month {0}: expected 1..=12")]
    InvalidMonth(u32),

    #[error("Date {0} cannot be advanced into the planning horizon")]
    InvalidDate(chrono::NaiveDate),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid simulation parameter {field}: {reason}")]
    InvalidSimulation { field: &'static str, reason: String },

    #[error("Invalid channel {channel}: {reason}")]
    InvalidChannel { channel: String, reason: String },

    #[error("Invalid national forecast {0}: must be finite, non-negative and yield head counts within u32")]
    InvalidForecast(f64),

    #[error("Invalid budget {0}: must be finite and non-negative")]
    InvalidBudget(f64),

    #[error("Simulation cancelled after {completed} of {requested} trials")]
    Cancelled { completed: usize, requested: usize },

    #[error("Failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlanningError>;
