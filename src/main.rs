use std::error::Error;

use chrono::{Local, NaiveDate};
use tracing::error;

use workforce_planner::models::{
    CategoryDemand, MarketingChannel, OperationalMetrics, RotationRates, ServiceCategory,
    SimulationInputs, ZoneId, ZoneSnapshot,
};
use workforce_planner::{logging, reporting};
use workforce_planner::{FunnelAssumptions, PlanningConfig, PlanningInput, WorkforcePlanner};

struct Args {
    config_path: Option<String>,
    as_of: Option<NaiveDate>,
    json: bool,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args {
        config_path: None,
        as_of: None,
        json: false,
    };
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--json" => args.json = true,
            "--as-of" => {
                let value = raw.next().ok_or("--as-of requires a date (YYYY-MM-DD)")?;
                args.as_of = Some(NaiveDate::parse_from_str(&value, "%Y-%m-%d")?);
            }
            path => args.config_path = Some(path.to_string()),
        }
    }
    Ok(args)
}

fn zone(id: &str, workers: u32, rejection: f64, efficiency: f64, demand: f64) -> ZoneSnapshot {
    ZoneSnapshot {
        zone_id: ZoneId::from(id),
        metrics: OperationalMetrics {
            active_workers: workers,
            rejection_rate: rejection,
            available_hours_per_worker_per_day: 10.0,
            operational_efficiency: efficiency,
        },
        demand_per_day: demand,
        category_demands: vec![],
    }
}

/// Sample snapshot standing in for the dashboard's data store
fn sample_input() -> PlanningInput {
    let mut centro = zone("centro", 48, 0.12, 0.85, 160.0);
    centro.category_demands = vec![CategoryDemand {
        category: ServiceCategory::Express,
        jobs_per_day: 30.0,
    }];

    PlanningInput {
        zones: vec![
            zone("norte", 22, 0.15, 0.80, 70.0),
            zone("noreste", 9, 0.20, 0.75, 45.0),
            centro,
            zone("occidente", 25, 0.10, 0.90, 55.0),
            zone("sureste", 1, 0.50, 0.70, 20.0),
        ],
        national_forecast: 9_500.0,
        rotation: Some(
            RotationRates::uniform(0.10)
                .with_override("centro", 0.12)
                .with_override("sureste", 0.20),
        ),
        channels: vec![
            MarketingChannel { id: "referrals".into(), cpa: 35.0, conversion_rate: 0.45, capacity: 60.0 },
            MarketingChannel { id: "social_ads".into(), cpa: 18.0, conversion_rate: 0.12, capacity: 1_500.0 },
            MarketingChannel { id: "job_boards".into(), cpa: 25.0, conversion_rate: 0.20, capacity: 800.0 },
            MarketingChannel { id: "radio".into(), cpa: 60.0, conversion_rate: 0.15, capacity: 400.0 },
        ],
        funnel: FunnelAssumptions {
            cpa: 25.0,
            conversion_rate: 0.20,
            retention_rate: 0.75,
            spread: SimulationInputs {
                budget: 2_500.0,
                cpa: 5.0,
                conversion_rate: 0.04,
                retention_rate: 0.08,
            },
        },
        marketing_budget: None,
        simulation_target: None,
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = parse_args()?;

    let config = match &args.config_path {
        Some(path) => PlanningConfig::from_json_file(path)?,
        None => PlanningConfig::default(),
    };
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let planner = WorkforcePlanner::new(config)?;
    let report = planner.plan(&sample_input(), as_of, None)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        reporting::display_header(&format!("WORKFORCE CAPACITY PLAN - as of {}", as_of));
        reporting::display_report(&report);
    }
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        error!("planning run failed: {}", e);
        std::process::exit(1);
    }
}
