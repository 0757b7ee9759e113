//! Simulation runner
//!
//! Drives one (configuration, sample) run: the ordered substeps of each
//! timestep, the per-run random stream, and the snapshot series the
//! analysis layer consumes.

use indexmap::IndexMap;
use rand::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::application::policies::{
    ArbitrageConfig, MarketPriceMode, UserActionConfig, arbitrage_signal, commit_market_signal,
    commit_pair_deltas, drift_market, observe_market, user_action_signal,
};
use crate::domain::{Amm, SimulationError, SimulationState};

use super::config::{ExperimentConfig, RunConfig};

/// A run failure, tagged with the coordinates needed to reproduce it
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("run aborted (config {config_id}, sample {sample_id}, timestep {timestep}): {source}")]
pub struct RunError {
    pub config_id: usize,
    pub sample_id: usize,
    pub timestep: usize,
    #[source]
    pub source: SimulationError,
}

/// Completed series of one (configuration, sample) run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub config_id: usize,
    pub sample_id: usize,
    pub config: RunConfig,
    /// One snapshot per timestep, ordered by timestep
    pub series: Vec<SimulationState>,
}

/// Derive the seed of one run's random stream from the experiment base
/// seed, keeping streams distinct across the grid and across samples.
fn run_seed(base: u64, config_id: usize, sample_id: usize) -> u64 {
    base ^ ((config_id as u64) << 32) ^ sample_id as u64
}

/// Coordinates one run of the transition engine
pub struct SimulationRunner {
    config_id: usize,
    sample_id: usize,
    config: RunConfig,
    amms: IndexMap<String, Amm>,
    market_mode: MarketPriceMode,
    user_action: UserActionConfig,
    arbitrage: ArbitrageConfig,
    state: SimulationState,
    rng: StdRng,
    timestep: usize,
}

impl SimulationRunner {
    /// Build the runner for one cell of the experiment grid
    pub fn new(
        experiment: &ExperimentConfig,
        config_id: usize,
        config: RunConfig,
        sample_id: usize,
    ) -> Self {
        let rng = match experiment.seed {
            Some(base) => StdRng::seed_from_u64(run_seed(base, config_id, sample_id)),
            None => StdRng::from_entropy(),
        };

        let state = SimulationState::genesis(
            &experiment.amms,
            experiment.genesis_reserves,
            experiment.genesis_market_price,
        );

        Self {
            config_id,
            sample_id,
            amms: experiment.amms_for(&config),
            market_mode: experiment.market_mode,
            user_action: UserActionConfig {
                user_action_intensity: config.user_action_intensity,
                swap_vs_liquidity_preference: config.swap_vs_liquidity_preference,
            },
            arbitrage: ArbitrageConfig {
                arbitrage_intensity: config.arbitrage_intensity,
            },
            config,
            state,
            rng,
            timestep: 0,
        }
    }

    /// Current state (genesis until the first [`step`](Self::step))
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Timesteps committed so far
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Advance exactly one timestep and return the committed state
    ///
    /// Substep order is fixed: market movements first, then user actions
    /// and arbitrage against the just-committed reference price.
    pub fn step(&mut self) -> Result<&SimulationState, RunError> {
        // Substep 1: market movements
        let mut market = observe_market(&self.state.pair_state).map_err(|e| self.abort(e))?;
        if let MarketPriceMode::RandomWalk { step_scale } = self.market_mode {
            market.market_price = drift_market(self.state.market_price, step_scale, &mut self.rng);
        }
        let state = commit_market_signal(&self.state, &market);

        // Substep 2: user actions, then arbitrage, committed together
        let user_delta =
            user_action_signal(&self.amms, &state.pair_state, &self.user_action, &mut self.rng)
                .map_err(|e| self.abort(e))?;
        let arbitrage_delta = arbitrage_signal(
            &state.pair_state,
            state.market_price,
            &self.arbitrage,
            &mut self.rng,
        )
        .map_err(|e| self.abort(e))?;

        self.state = commit_pair_deltas(&state, &[user_delta, arbitrage_delta])
            .map_err(|e| self.abort(e))?;
        self.timestep += 1;

        Ok(&self.state)
    }

    /// Run `timesteps` transitions, collecting one snapshot per timestep
    pub fn run(mut self, timesteps: usize) -> Result<RunResult, RunError> {
        debug!(
            config_id = self.config_id,
            sample_id = self.sample_id,
            timesteps,
            "starting run"
        );

        let mut series = Vec::with_capacity(timesteps);
        for _ in 0..timesteps {
            series.push(self.step()?.clone());
        }

        debug!(
            config_id = self.config_id,
            sample_id = self.sample_id,
            "run complete"
        );

        Ok(RunResult {
            config_id: self.config_id,
            sample_id: self.sample_id,
            config: self.config,
            series,
        })
    }

    fn abort(&self, source: SimulationError) -> RunError {
        RunError {
            config_id: self.config_id,
            sample_id: self.sample_id,
            timestep: self.timestep,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::simulation::config::SweepSpec;
    use crate::domain::PairState;

    fn experiment(sweep: SweepSpec) -> ExperimentConfig {
        ExperimentConfig {
            sweep,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn test_new_runner_starts_at_genesis() {
        let experiment = experiment(SweepSpec::fixed(0.1, 0.1, 0.5));
        let config = experiment.sweep.expand().remove(0);

        let mut runner = SimulationRunner::new(&experiment, 0, config, 0);
        assert_eq!(runner.timestep(), 0);
        assert_eq!(runner.state().market_price, 5.0);

        runner.step().unwrap();
        assert_eq!(runner.timestep(), 1);
    }

    #[test]
    fn test_run_produces_one_row_per_timestep() {
        let experiment = experiment(SweepSpec::fixed(0.1, 0.1, 0.5));
        let config = experiment.sweep.expand().remove(0);

        let result = SimulationRunner::new(&experiment, 0, config, 0)
            .run(50)
            .unwrap();

        assert_eq!(result.series.len(), 50);
        for state in &result.series {
            assert_eq!(state.pair_state.len(), 3);
        }
    }

    #[test]
    fn test_zero_intensities_freeze_the_ledger() {
        let experiment = experiment(SweepSpec::fixed(0.0, 0.0, 0.5));
        let config = experiment.sweep.expand().remove(0);

        let result = SimulationRunner::new(&experiment, 0, config, 0)
            .run(30)
            .unwrap();

        let genesis = PairState::new(10_000.0, 50_000.0);
        for state in &result.series {
            for (_, pair) in &state.pair_state {
                assert_eq!(*pair, genesis);
            }
            // All pools share the genesis ratio, so the consensus is flat
            assert_eq!(state.market_price, 5.0);
            assert_eq!(state.market_price_volatility, 0.0);
        }
    }

    #[test]
    fn test_deterministic_under_seed() {
        let experiment = experiment(SweepSpec::fixed(0.2, 0.1, 0.5));
        let config = experiment.sweep.expand().remove(0);

        let a = SimulationRunner::new(&experiment, 0, config.clone(), 0)
            .run(40)
            .unwrap();
        let b = SimulationRunner::new(&experiment, 0, config, 0)
            .run(40)
            .unwrap();

        assert_eq!(a.series, b.series);
    }

    #[test]
    fn test_samples_draw_distinct_streams() {
        let experiment = experiment(SweepSpec::fixed(0.2, 0.1, 0.5));
        let config = experiment.sweep.expand().remove(0);

        let a = SimulationRunner::new(&experiment, 0, config.clone(), 0)
            .run(10)
            .unwrap();
        let b = SimulationRunner::new(&experiment, 0, config, 1)
            .run(10)
            .unwrap();

        assert_ne!(a.series, b.series);
    }

    #[test]
    fn test_reserves_stay_strictly_positive() {
        let experiment = experiment(SweepSpec::fixed(0.2, 0.3, 0.9));
        let config = experiment.sweep.expand().remove(0);

        let result = SimulationRunner::new(&experiment, 0, config, 0)
            .run(150)
            .unwrap();

        for state in &result.series {
            for (_, pair) in &state.pair_state {
                assert!(pair.is_strictly_positive());
            }
        }
    }

    #[test]
    fn test_random_walk_mode_moves_the_reference() {
        let experiment = ExperimentConfig {
            market_mode: MarketPriceMode::RandomWalk { step_scale: 0.1 },
            sweep: SweepSpec::fixed(0.0, 0.0, 0.5),
            ..ExperimentConfig::default()
        };
        let config = experiment.sweep.expand().remove(0);

        let result = SimulationRunner::new(&experiment, 0, config, 0)
            .run(20)
            .unwrap();

        // With frozen pools the walk is the only source of movement
        let moved = result
            .series
            .iter()
            .any(|state| state.market_price != 5.0);
        assert!(moved);
        // Each step moves at most 10%
        let mut previous = 5.0;
        for state in &result.series {
            assert!((state.market_price - previous).abs() <= previous * 0.1 + 1e-12);
            previous = state.market_price;
        }
    }

    #[test]
    fn test_run_error_reports_coordinates() {
        // An over-unity intensity lets a single burn remove more than the
        // whole reserve, which must abort the run rather than clamp.
        let experiment = experiment(SweepSpec::fixed(2.5, 0.0, 0.0));
        let config = experiment.sweep.expand().remove(0);

        let err = SimulationRunner::new(&experiment, 3, config, 2)
            .run(500)
            .unwrap_err();

        assert_eq!(err.config_id, 3);
        assert_eq!(err.sample_id, 2);
        assert!(matches!(
            err.source,
            SimulationError::NonPositiveReserve { .. }
        ));
    }
}
