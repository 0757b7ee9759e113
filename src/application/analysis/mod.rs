//! Analysis layer
//!
//! Consumes completed run series only: KPI extraction reduces one series
//! to scalars, the goal combiner normalizes KPI populations across a
//! comparison set. Both run strictly after the simulation phase.

mod goals;
mod kpi;
mod stats;

pub use goals::{GoalScores, goal_scores, z_scores};
pub use kpi::{
    DEFAULT_FEE, DEFAULT_TRADE_SIZE, KpiReport, PoolSeries, extract_kpis, immediate_yield,
    integral_yield, normalized_slippage, price_integral_error, price_volatility, slippage,
    slippage_magnitude, slippage_volatility, transaction_fees,
};
pub use stats::{mean, median, population_std, rolling_map, sample_std};
