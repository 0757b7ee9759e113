//! Error types for the transition engine and the analysis layer
//!
//! Simulation errors abort the affected run; analysis errors abort the
//! affected KPI or goal computation. Neither is recoverable by clamping.

use serde::Serialize;
use thiserror::Error;

/// Arithmetic degeneracies and invariant violations inside a run
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum SimulationError {
    /// A reserve ratio was requested while a reserve is zero. Valid
    /// dynamics never reach this; treat it as a fatal invariant violation.
    #[error("pool {label}: zero reserve, price ratio undefined")]
    ZeroReserve { label: String },

    /// The arbitrage denominator (`amm_price + market_price`) vanished,
    /// leaving the rebound size undefined.
    #[error("pool {label}: zero price-error denominator, arbitrage size undefined")]
    ZeroPriceError { label: String },

    /// A commit produced a non-positive reserve. Fatal for the run; the
    /// configuration is invalid, not the state.
    #[error(
        "pool {label}: non-positive reserves ({reserve_token_1}, {reserve_token_2}) after commit"
    )]
    NonPositiveReserve {
        label: String,
        reserve_token_1: f64,
        reserve_token_2: f64,
    },

    /// A pool appears in the ledger without a matching descriptor.
    #[error("pool {label}: no descriptor in configuration")]
    MissingDescriptor { label: String },

    /// The ledger holds no pools at all.
    #[error("ledger holds no pools, market price undefined")]
    EmptyLedger,
}

/// Degenerate inputs and populations in the KPI / goal layer
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum AnalysisError {
    /// `slippage` with a zero input amount; a degenerate input, not a
    /// price of zero.
    #[error("slippage undefined for a zero trade amount")]
    ZeroTradeAmount,

    /// The series has no rows to reduce.
    #[error("{kpi}: empty series")]
    EmptySeries { kpi: &'static str },

    /// The series is shorter than the reduction needs.
    #[error("{kpi}: series of {len} rows is too short to reduce")]
    SeriesTooShort { kpi: &'static str, len: usize },

    /// Every rolling window produced an undefined value.
    #[error("{kpi}: no finite window values to reduce")]
    NoFiniteWindows { kpi: &'static str },

    /// The requested pool label is not part of the series.
    #[error("pool {label} missing from series")]
    UnknownPool { label: String },

    /// Z-score normalization needs at least two population values.
    #[error("normalization undefined for a population of {len} values")]
    PopulationTooSmall { len: usize },

    /// Z-score normalization over a constant population.
    #[error("normalization undefined: {kpi} has zero variance across the population")]
    ZeroVariance { kpi: &'static str },
}
