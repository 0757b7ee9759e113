//! Monte Carlo simulation of interacting AMM liquidity pools
//!
//! A set of independent two-token pools interacts only through a shared
//! reference price. Each timestep superimposes three forces: market
//! price movement, random synthetic user trading and liquidity events,
//! and partial arbitrage pulling every pool toward the reference price.
//! Runs replicate across Monte Carlo samples and a cartesian grid of
//! swept configurations; a separate analysis layer reduces each run to
//! KPI scalars and population-normalized goal scores.

pub mod application;
pub mod domain;

// Re-export key types at crate root
pub use application::analysis::{GoalScores, KpiReport, PoolSeries, extract_kpis, goal_scores};
pub use application::policies::{MarketPriceMode, UserAction};
pub use application::simulation::{
    ExperimentConfig, ExperimentOutcome, RunConfig, RunError, RunResult, SimulationRunner,
    SweepSpec, run_experiment,
};
pub use domain::{
    Amm, AnalysisError, PairState, PoolLedger, SimulationError, SimulationState, merge_ledgers,
};
