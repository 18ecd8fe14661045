/// Monte Carlo simulation and statistical analysis module
/// Estimates the distribution of recruitment outcomes for a marketing budget

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::error::{PlanningError, Result};
use crate::models::{SimulationInputs, SimulationResult};

/// Cooperative cancellation flag, checked between trials
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// Keeps exact products like 400 * 0.3 * 0.8 from flooring one recruit short.
const FLOOR_EPSILON: f64 = 1e-9;

/// Recruits produced by one funnel draw
pub fn recruits(sample: &SimulationInputs) -> f64 {
    if sample.cpa <= 0.0 {
        return 0.0;
    }
    (sample.budget / sample.cpa * sample.conversion_rate * sample.retention_rate + FLOOR_EPSILON).floor()
}

/// Per-input samplers: Normal(expected, spread) clipped to the input's domain
struct FunnelDistribution {
    budget: Normal<f64>,
    cpa: Normal<f64>,
    conversion_rate: Normal<f64>,
    retention_rate: Normal<f64>,
}

impl FunnelDistribution {
    fn new(expected: &SimulationInputs, spread: &SimulationInputs) -> Result<Self> {
        let normal = |field: &'static str, mean: f64, std_dev: f64| {
            if !mean.is_finite() || mean < 0.0 {
                return Err(PlanningError::InvalidSimulation {
                    field,
                    reason: format!("expected value {} must be finite and non-negative", mean),
                });
            }
            if !std_dev.is_finite() || std_dev < 0.0 {
                return Err(PlanningError::InvalidSimulation {
                    field,
                    reason: format!("spread {} must be finite and non-negative", std_dev),
                });
            }
            Normal::new(mean, std_dev).map_err(|e| PlanningError::InvalidSimulation {
                field,
                reason: format!("spread {}: {}", std_dev, e),
            })
        };

        if expected.conversion_rate > 1.0 || expected.retention_rate > 1.0 {
            return Err(PlanningError::InvalidSimulation {
                field: "rates",
                reason: "conversion and retention rates must be within [0, 1]".into(),
            });
        }

        Ok(FunnelDistribution {
            budget: normal("budget", expected.budget, spread.budget)?,
            cpa: normal("cpa", expected.cpa, spread.cpa)?,
            conversion_rate: normal("conversion_rate", expected.conversion_rate, spread.conversion_rate)?,
            retention_rate: normal("retention_rate", expected.retention_rate, spread.retention_rate)?,
        })
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> SimulationInputs {
        SimulationInputs {
            budget: self.budget.sample(rng).max(0.0),
            cpa: self.cpa.sample(rng).max(0.0),
            conversion_rate: self.conversion_rate.sample(rng).clamp(0.0, 1.0),
            retention_rate: self.retention_rate.sample(rng).clamp(0.0, 1.0),
        }
    }
}

/// Run a seeded Monte Carlo simulation of recruitment outcomes.
///
/// Each trial draws from its own ChaCha stream keyed by the trial index, so the
/// result is bit-identical for a given seed no matter how rayon schedules trials.
/// `target` defaults to the recruits expected without any variance.
#[instrument(skip(expected, spread, cancel))]
pub fn run_monte_carlo_simulation(
    expected: &SimulationInputs,
    spread: &SimulationInputs,
    num_trials: usize,
    seed: u64,
    target: Option<f64>,
    cancel: Option<&CancelToken>,
) -> Result<SimulationResult> {
    if num_trials == 0 {
        return Err(PlanningError::InvalidSimulation {
            field: "trials",
            reason: "at least one trial is required".into(),
        });
    }
    let distribution = FunnelDistribution::new(expected, spread)?;
    let target = target.unwrap_or_else(|| recruits(expected));

    let outcomes: Vec<Option<f64>> = (0..num_trials)
        .into_par_iter()
        .map(|trial| {
            if cancel.map_or(false, |c| c.is_cancelled()) {
                return None;
            }
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(trial as u64);
            Some(recruits(&distribution.sample(&mut rng)))
        })
        .collect();

    let completed = outcomes.iter().filter(|o| o.is_some()).count();
    if completed < num_trials {
        return Err(PlanningError::Cancelled {
            completed,
            requested: num_trials,
        });
    }
    let mut outcomes: Vec<f64> = outcomes.into_iter().flatten().collect();

    let successes = outcomes.iter().filter(|&&r| r >= target).count();
    let mean_outcome = outcomes.iter().sum::<f64>() / num_trials as f64;
    let variance = outcomes
        .iter()
        .map(|r| (r - mean_outcome).powi(2))
        .sum::<f64>()
        / num_trials as f64;

    outcomes.sort_by(|a, b| a.total_cmp(b));

    let percentile = |p: f64| {
        let index = ((p / 100.0) * (outcomes.len() as f64 - 1.0)).round() as usize;
        outcomes[index.min(outcomes.len() - 1)]
    };

    let result = SimulationResult {
        trials: num_trials,
        seed,
        target,
        mean_outcome,
        std_dev_outcome: variance.sqrt(),
        min_outcome: outcomes[0],
        max_outcome: outcomes[outcomes.len() - 1],
        median_outcome: percentile(50.0),
        confidence_interval_95: (percentile(2.5), percentile(97.5)),
        success_probability: successes as f64 / num_trials as f64,
    };

    info!(
        mean = result.mean_outcome,
        lower = result.confidence_interval_95.0,
        upper = result.confidence_interval_95.1,
        success_probability = result.success_probability,
        "monte carlo simulation complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> SimulationInputs {
        SimulationInputs {
            budget: 20_000.0,
            cpa: 50.0,
            conversion_rate: 0.3,
            retention_rate: 0.8,
        }
    }

    fn spread() -> SimulationInputs {
        SimulationInputs {
            budget: 2_000.0,
            cpa: 8.0,
            conversion_rate: 0.05,
            retention_rate: 0.05,
        }
    }

    fn zero_spread() -> SimulationInputs {
        SimulationInputs {
            budget: 0.0,
            cpa: 0.0,
            conversion_rate: 0.0,
            retention_rate: 0.0,
        }
    }

    #[test]
    fn test_recruits_formula() {
        // 20_000 / 50 * 0.3 * 0.8 = 96
        assert_eq!(recruits(&expected()), 96.0);
        let mut free = expected();
        free.cpa = 0.0;
        assert_eq!(recruits(&free), 0.0);
    }

    #[test]
    fn test_same_seed_is_bit_identical() {
        let a = run_monte_carlo_simulation(&expected(), &spread(), 1_000, 7, None, None).unwrap();
        let b = run_monte_carlo_simulation(&expected(), &spread(), 1_000, 7, None, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mean_outcome.to_bits(), b.mean_outcome.to_bits());

        let c = run_monte_carlo_simulation(&expected(), &spread(), 1_000, 8, None, None).unwrap();
        assert_ne!(a.mean_outcome.to_bits(), c.mean_outcome.to_bits());
    }

    #[test]
    fn test_identical_across_thread_counts() {
        let run_on = |threads: usize| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap()
                .install(|| run_monte_carlo_simulation(&expected(), &spread(), 5_000, 11, None, None))
                .unwrap()
        };

        let single = run_on(1);
        let many = run_on(8);
        assert_eq!(single, many);
        assert_eq!(single.mean_outcome.to_bits(), many.mean_outcome.to_bits());
        assert_eq!(single.std_dev_outcome.to_bits(), many.std_dev_outcome.to_bits());
    }

    #[test]
    fn test_interval_brackets_mean() {
        let result = run_monte_carlo_simulation(&expected(), &spread(), 2_000, 42, None, None).unwrap();
        let (lower, upper) = result.confidence_interval_95;
        assert!(lower <= result.median_outcome && result.median_outcome <= upper);
        assert!(lower <= result.mean_outcome && result.mean_outcome <= upper);
        assert!(result.min_outcome <= lower && upper <= result.max_outcome);
        assert!((0.0..=1.0).contains(&result.success_probability));
        assert_eq!(result.target, 96.0);
    }

    #[test]
    fn test_single_trial_is_degenerate() {
        let result = run_monte_carlo_simulation(&expected(), &spread(), 1, 3, None, None).unwrap();
        assert_eq!(result.confidence_interval_95.0, result.confidence_interval_95.1);
        assert_eq!(result.mean_outcome, result.min_outcome);
        assert_eq!(result.std_dev_outcome, 0.0);
    }

    #[test]
    fn test_zero_spread_matches_expectation() {
        let result = run_monte_carlo_simulation(&expected(), &zero_spread(), 50, 1, None, None).unwrap();
        assert_eq!(result.mean_outcome, 96.0);
        assert_eq!(result.confidence_interval_95, (96.0, 96.0));
        assert_eq!(result.success_probability, 1.0);

        let result = run_monte_carlo_simulation(&expected(), &zero_spread(), 50, 1, Some(97.0), None).unwrap();
        assert_eq!(result.success_probability, 0.0);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(matches!(
            run_monte_carlo_simulation(&expected(), &spread(), 0, 1, None, None),
            Err(PlanningError::InvalidSimulation { field: "trials", .. })
        ));

        let mut negative = spread();
        negative.cpa = -1.0;
        assert!(run_monte_carlo_simulation(&expected(), &negative, 10, 1, None, None).is_err());

        let mut rates = expected();
        rates.conversion_rate = 1.5;
        assert!(run_monte_carlo_simulation(&rates, &spread(), 10, 1, None, None).is_err());
    }

    #[test]
    fn test_cancelled_simulation() {
        let token = CancelToken::new();
        token.cancel();
        let err = run_monte_carlo_simulation(&expected(), &spread(), 100, 1, None, Some(&token)).unwrap_err();
        assert!(matches!(err, PlanningError::Cancelled { completed: 0, requested: 100 }));
    }
}
