//! Demand forecasting and capacity planning for field workforce operations.
//!
//! The engine turns per-zone operational snapshots into effective capacity,
//! signed deficits with urgency scores, a rolling two-month recruitment plan,
//! a Monte Carlo estimate of recruitment outcomes and a marketing budget split.

pub mod capacity;
pub mod config;
pub mod deficit;
pub mod demand;
pub mod error;
pub mod logging;
pub mod models;
pub mod monte_carlo;
pub mod optimizer;
pub mod planner;
pub mod projection;
pub mod reporting;
pub mod seasonal;

pub use config::PlanningConfig;
pub use error::{PlanningError, Result};
pub use planner::{FunnelAssumptions, PlanningInput, PlanningReport, WorkforcePlanner};
