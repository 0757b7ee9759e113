//! Experiment and run configuration
//!
//! An experiment describes the pool set, genesis values, run lengths and
//! the swept knobs. The sweep expands once into a cartesian grid of
//! immutable [`RunConfig`] values; every run receives its configuration
//! by value and never reads shared mutable parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::application::policies::MarketPriceMode;
use crate::domain::{Amm, PairState};

/// Scalar knobs of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Upper bound of user trade size as a fraction of reserves
    pub user_action_intensity: f64,
    /// Upper bound of the applied fraction of the full arbitrage trade
    pub arbitrage_intensity: f64,
    /// Probability that a user action is a swap rather than a mint/burn
    pub swap_vs_liquidity_preference: f64,
    /// When set, replaces every pool descriptor's fee for this run
    pub transaction_fee_override: Option<f64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            user_action_intensity: 0.1,
            arbitrage_intensity: 0.1,
            swap_vs_liquidity_preference: 0.5,
            transaction_fee_override: None,
        }
    }
}

/// Candidate values for each swept knob
///
/// A singleton set pins a knob; the grid is the cartesian product of all
/// sets, expanded in a fixed order so configuration ids are stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSpec {
    pub user_action_intensity: Vec<f64>,
    pub arbitrage_intensity: Vec<f64>,
    pub swap_vs_liquidity_preference: Vec<f64>,
    /// Fee overrides to sweep; empty keeps the descriptor fees
    pub transaction_fee_override: Vec<f64>,
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self {
            user_action_intensity: vec![0.1, 0.2],
            arbitrage_intensity: vec![0.0, 0.1, 0.3],
            swap_vs_liquidity_preference: vec![0.5, 0.9],
            transaction_fee_override: Vec::new(),
        }
    }
}

impl SweepSpec {
    /// A sweep with every knob pinned to a single value
    pub fn fixed(
        user_action_intensity: f64,
        arbitrage_intensity: f64,
        swap_vs_liquidity_preference: f64,
    ) -> Self {
        Self {
            user_action_intensity: vec![user_action_intensity],
            arbitrage_intensity: vec![arbitrage_intensity],
            swap_vs_liquidity_preference: vec![swap_vs_liquidity_preference],
            transaction_fee_override: Vec::new(),
        }
    }

    /// Expand the cartesian grid of run configurations
    pub fn expand(&self) -> Vec<RunConfig> {
        let overrides: Vec<Option<f64>> = if self.transaction_fee_override.is_empty() {
            vec![None]
        } else {
            self.transaction_fee_override.iter().copied().map(Some).collect()
        };

        let mut grid = Vec::new();
        for &user_action_intensity in &self.user_action_intensity {
            for &arbitrage_intensity in &self.arbitrage_intensity {
                for &swap_vs_liquidity_preference in &self.swap_vs_liquidity_preference {
                    for &transaction_fee_override in &overrides {
                        grid.push(RunConfig {
                            user_action_intensity,
                            arbitrage_intensity,
                            swap_vs_liquidity_preference,
                            transaction_fee_override,
                        });
                    }
                }
            }
        }
        grid
    }
}

/// Full description of one experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Pool descriptors; the pool set is immutable after initialization
    pub amms: Vec<Amm>,
    /// Genesis reserves applied to every pool
    pub genesis_reserves: PairState,
    /// Genesis reference price
    pub genesis_market_price: f64,
    /// Timesteps per run
    pub timesteps: usize,
    /// Monte Carlo samples per configuration
    pub samples: usize,
    /// Swept knobs expanded into the configuration grid
    pub sweep: SweepSpec,
    /// How the reference price evolves
    pub market_mode: MarketPriceMode,
    /// Base seed; each (configuration, sample) derives its own stream.
    /// `None` seeds every run from entropy.
    pub seed: Option<u64>,
    /// Opaque historical event table for an alternate calibration mode;
    /// carried through untouched, never parsed
    pub history: Option<serde_json::Value>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            amms: vec![
                Amm::new("uniswap", 0.003),
                Amm::new("honeyswap", 0.003),
                Amm::new("curve", 0.0015),
            ],
            genesis_reserves: PairState::new(10_000.0, 50_000.0),
            genesis_market_price: 5.0,
            timesteps: 150,
            samples: 5,
            sweep: SweepSpec::default(),
            market_mode: MarketPriceMode::PoolConsensus,
            seed: Some(42),
            history: None,
        }
    }
}

impl ExperimentConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_sweep(mut self, sweep: SweepSpec) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn with_market_mode(mut self, market_mode: MarketPriceMode) -> Self {
        self.market_mode = market_mode;
        self
    }

    /// Descriptor map for one run, with the fee override applied
    pub fn amms_for(&self, config: &RunConfig) -> IndexMap<String, Amm> {
        self.amms
            .iter()
            .map(|amm| {
                let mut amm = amm.clone();
                if let Some(fee) = config.transaction_fee_override {
                    amm.transaction_fee = fee;
                }
                (amm.label.clone(), amm)
            })
            .collect()
    }
}
