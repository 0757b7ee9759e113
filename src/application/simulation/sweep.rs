//! Experiment executor
//!
//! Expands the sweep into its configuration grid, replicates each cell
//! across samples, and runs every (configuration, sample) pair on the
//! rayon pool. Runs share no state; a failed run is reported and the
//! rest proceed.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::config::{ExperimentConfig, RunConfig};
use super::runner::{RunError, RunResult, SimulationRunner};

/// Everything an experiment produced
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentOutcome {
    /// The expanded configuration grid, indexed by configuration id
    pub configs: Vec<RunConfig>,
    /// Completed runs, in (configuration id, sample id) order
    pub completed: Vec<RunResult>,
    /// Runs that aborted, with their coordinates
    pub failed: Vec<RunError>,
    /// The experiment's opaque calibration payload, passed through
    pub history: Option<serde_json::Value>,
}

/// Run the full grid × samples experiment
pub fn run_experiment(experiment: &ExperimentConfig) -> ExperimentOutcome {
    let configs = experiment.sweep.expand();

    let jobs: Vec<(usize, usize)> = (0..configs.len())
        .flat_map(|config_id| (0..experiment.samples).map(move |sample_id| (config_id, sample_id)))
        .collect();

    info!(
        configurations = configs.len(),
        samples = experiment.samples,
        timesteps = experiment.timesteps,
        "running experiment"
    );

    let results: Vec<Result<RunResult, RunError>> = jobs
        .par_iter()
        .map(|&(config_id, sample_id)| {
            SimulationRunner::new(experiment, config_id, configs[config_id].clone(), sample_id)
                .run(experiment.timesteps)
        })
        .collect();

    let mut completed = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(run) => completed.push(run),
            Err(err) => {
                warn!(%err, "run aborted");
                failed.push(err);
            }
        }
    }

    info!(
        completed = completed.len(),
        failed = failed.len(),
        "experiment finished"
    );

    ExperimentOutcome {
        configs,
        completed,
        failed,
        history: experiment.history.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::simulation::config::SweepSpec;

    #[test]
    fn test_runs_every_grid_cell_for_every_sample() {
        let experiment = ExperimentConfig {
            timesteps: 10,
            samples: 2,
            ..ExperimentConfig::default()
        };

        let outcome = run_experiment(&experiment);
        assert_eq!(outcome.configs.len(), 12);
        assert_eq!(outcome.completed.len(), 24);
        assert!(outcome.failed.is_empty());

        for run in &outcome.completed {
            assert_eq!(run.series.len(), 10);
            assert_eq!(run.config, outcome.configs[run.config_id]);
        }
    }

    #[test]
    fn test_outcome_is_deterministic_and_ordered() {
        let experiment = ExperimentConfig {
            timesteps: 15,
            samples: 3,
            sweep: SweepSpec::fixed(0.2, 0.1, 0.5),
            ..ExperimentConfig::default()
        };

        let a = run_experiment(&experiment);
        let b = run_experiment(&experiment);

        assert_eq!(a.completed.len(), 3);
        for (run_a, run_b) in a.completed.iter().zip(&b.completed) {
            assert_eq!(run_a.config_id, run_b.config_id);
            assert_eq!(run_a.sample_id, run_b.sample_id);
            assert_eq!(run_a.series, run_b.series);
        }
    }

    #[test]
    fn test_failed_runs_do_not_sink_the_experiment() {
        // Over-unity burns abort runs; every cell shares the bad knob, so
        // every run fails but the outcome still reports each one.
        let experiment = ExperimentConfig {
            timesteps: 200,
            samples: 2,
            sweep: SweepSpec::fixed(2.5, 0.0, 0.0),
            ..ExperimentConfig::default()
        };

        let outcome = run_experiment(&experiment);
        assert_eq!(outcome.completed.len() + outcome.failed.len(), 2);
        assert!(!outcome.failed.is_empty());
    }

    #[test]
    fn test_history_payload_passes_through() {
        let experiment = ExperimentConfig {
            timesteps: 5,
            samples: 1,
            sweep: SweepSpec::fixed(0.1, 0.1, 0.5),
            history: Some(serde_json::json!({"events": [1, 2, 3]})),
            ..ExperimentConfig::default()
        };

        let outcome = run_experiment(&experiment);
        assert_eq!(outcome.history, experiment.history);
    }
}
