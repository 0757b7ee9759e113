//! KPI extraction
//!
//! Reduces one completed run series to scalar performance indicators:
//! price stability, trading cost, and liquidity-provider yield. Every
//! KPI is a pure reduction over a per-pool projection of the series.

use serde::Serialize;

use crate::domain::{AnalysisError, SimulationState};

use super::stats::{mean, median, rolling_map, sample_std};

/// Probe trade size used by the slippage KPIs
pub const DEFAULT_TRADE_SIZE: f64 = 100.0;
/// Fee assumed by the KPI layer when no pool fee is supplied
pub const DEFAULT_FEE: f64 = 0.003;

/// Relative cost of a trade against the pool's spot price
///
/// `amount_in == 0` is a degenerate input (the effective price is
/// undefined) and is reported, never coerced to zero. Balances are
/// expected strictly positive, as committed states guarantee.
pub fn slippage(
    balance_in: f64,
    balance_out: f64,
    amount_in: f64,
    fee: f64,
) -> Result<f64, AnalysisError> {
    if amount_in == 0.0 {
        return Err(AnalysisError::ZeroTradeAmount);
    }

    let spot_price = (balance_in / balance_out) * (1.0 / (1.0 - fee));
    let amount_out_share = 1.0 - balance_in / (balance_in + amount_in);
    let amount_out = balance_out * amount_out_share;
    let effective_price = amount_in / amount_out;

    Ok(effective_price / spot_price - 1.0)
}

/// Round-trip cost approximation: the average of `slippage` in both
/// trade directions for a fixed probe size
pub fn normalized_slippage(
    reserve_1: f64,
    reserve_2: f64,
    trade_size: f64,
    fee: f64,
) -> Result<f64, AnalysisError> {
    let slippage_1 = slippage(reserve_1, reserve_2, trade_size, fee)?;
    let trade_size_2 = trade_size * reserve_2 / reserve_1;
    let slippage_2 = slippage(reserve_2, reserve_1, trade_size_2, fee)?;
    Ok((slippage_1 + slippage_2) / 2.0)
}

/// Per-timestep fee revenue inferred from reserve deltas
///
/// A timestep whose two deltas have opposite signs is a swap and earns
/// `fee * |delta|` in the chosen token; mint/burn and no-op timesteps
/// earn nothing. The first timestep has no predecessor and earns zero.
pub fn transaction_fees(
    reserve_1_series: &[f64],
    reserve_2_series: &[f64],
    fee: f64,
    in_token_1: bool,
) -> Vec<f64> {
    let n = reserve_1_series.len();
    let mut fees = vec![0.0; n];

    for t in 1..n {
        let delta_1 = reserve_1_series[t] - reserve_1_series[t - 1];
        let delta_2 = reserve_2_series[t] - reserve_2_series[t - 1];

        if delta_1 * delta_2 < 0.0 {
            let delta = if in_token_1 { delta_1 } else { delta_2 };
            fees[t] = delta.abs() * fee;
        }
    }

    fees
}

/// One pool's columns projected out of a run series
#[derive(Debug, Clone, Serialize)]
pub struct PoolSeries {
    pub label: String,
    pub reserve_token_1: Vec<f64>,
    pub reserve_token_2: Vec<f64>,
    pub amm_price: Vec<f64>,
    pub market_price: Vec<f64>,
}

impl PoolSeries {
    /// Project one pool out of a completed run
    pub fn from_run(series: &[SimulationState], label: &str) -> Result<Self, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::EmptySeries { kpi: "pool series" });
        }

        let mut reserve_token_1 = Vec::with_capacity(series.len());
        let mut reserve_token_2 = Vec::with_capacity(series.len());
        let mut amm_price = Vec::with_capacity(series.len());
        let mut market_price = Vec::with_capacity(series.len());

        for state in series {
            let pair = state
                .pair_state
                .get(label)
                .ok_or_else(|| AnalysisError::UnknownPool {
                    label: label.to_string(),
                })?;
            reserve_token_1.push(pair.reserve_token_1);
            reserve_token_2.push(pair.reserve_token_2);
            amm_price.push(pair.reserve_token_2 / pair.reserve_token_1);
            market_price.push(state.market_price);
        }

        Ok(Self {
            label: label.to_string(),
            reserve_token_1,
            reserve_token_2,
            amm_price,
            market_price,
        })
    }

    pub fn len(&self) -> usize {
        self.reserve_token_1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserve_token_1.is_empty()
    }
}

/// Window sized as a fraction of the series, never below one row
fn window_size(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).round() as usize).max(1)
}

/// Median over the finite values of a rolling reduction
fn median_of_finite(values: Vec<f64>, kpi: &'static str) -> Result<f64, AnalysisError> {
    let finite: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    median(&finite).ok_or(AnalysisError::NoFiniteWindows { kpi })
}

/// Rolling std/mean ratio of the pool price, reduced by median
///
/// The window is 5% of the series length (at least one row); windows
/// whose ratio is undefined are excluded from the reduction.
pub fn price_volatility(series: &PoolSeries) -> Result<f64, AnalysisError> {
    const KPI: &str = "price_volatility";
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries { kpi: KPI });
    }

    let window = window_size(series.len(), 0.05);
    let ratios = rolling_map(&series.amm_price, window, |w| sample_std(w) / mean(w));
    median_of_finite(ratios, KPI)
}

/// Mean absolute deviation of the pool price from the market price,
/// normalized by the mean market price
pub fn price_integral_error(series: &PoolSeries) -> Result<f64, AnalysisError> {
    const KPI: &str = "price_integral_error";
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries { kpi: KPI });
    }

    let total_deviation: f64 = series
        .amm_price
        .iter()
        .zip(&series.market_price)
        .map(|(amm, market)| (amm - market).abs())
        .sum();

    Ok(total_deviation / (series.len() as f64 * mean(&series.market_price)))
}

fn slippage_per_timestep(
    series: &PoolSeries,
    trade_size: f64,
    fee: f64,
) -> Result<Vec<f64>, AnalysisError> {
    series
        .reserve_token_1
        .iter()
        .zip(&series.reserve_token_2)
        .map(|(&r1, &r2)| normalized_slippage(r1, r2, trade_size, fee))
        .collect()
}

/// Mean round-trip slippage at the probe trade size
pub fn slippage_magnitude(
    series: &PoolSeries,
    trade_size: f64,
    fee: f64,
) -> Result<f64, AnalysisError> {
    const KPI: &str = "slippage_magnitude";
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries { kpi: KPI });
    }
    Ok(mean(&slippage_per_timestep(series, trade_size, fee)?))
}

/// Standard deviation of the round-trip slippage at the probe trade size
pub fn slippage_volatility(
    series: &PoolSeries,
    trade_size: f64,
    fee: f64,
) -> Result<f64, AnalysisError> {
    const KPI: &str = "slippage_volatility";
    if series.len() < 2 {
        return Err(AnalysisError::SeriesTooShort {
            kpi: KPI,
            len: series.len(),
        });
    }
    Ok(sample_std(&slippage_per_timestep(series, trade_size, fee)?))
}

/// Rolling fee revenue per unit of rolling liquidity, reduced by median
///
/// The window is 1% of the series length (at least one row); each window
/// divides its fee sum by (window length × mean token-1 liquidity).
pub fn immediate_yield(series: &PoolSeries, fee: f64) -> Result<f64, AnalysisError> {
    const KPI: &str = "immediate_yield";
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries { kpi: KPI });
    }

    let window = window_size(series.len(), 0.01);
    let fees = transaction_fees(&series.reserve_token_1, &series.reserve_token_2, fee, true);

    let fee_sums = rolling_map(&fees, window, |w| w.iter().sum());
    let liquidity_means = rolling_map(&series.reserve_token_1, window, mean);

    let yields: Vec<f64> = fee_sums
        .into_iter()
        .zip(liquidity_means)
        .map(|(fee_sum, liquidity)| fee_sum / (window as f64 * liquidity))
        .collect();

    median_of_finite(yields, KPI)
}

/// Cumulative fee revenue over the series per unit of mean liquidity
pub fn integral_yield(series: &PoolSeries, fee: f64) -> Result<f64, AnalysisError> {
    const KPI: &str = "integral_yield";
    if series.is_empty() {
        return Err(AnalysisError::EmptySeries { kpi: KPI });
    }

    let fees = transaction_fees(&series.reserve_token_1, &series.reserve_token_2, fee, true);
    Ok(fees.iter().sum::<f64>() / mean(&series.reserve_token_1))
}

/// The six KPI scalars of one pool series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiReport {
    pub price_volatility: f64,
    pub price_integral_error: f64,
    pub slippage_magnitude: f64,
    pub slippage_volatility: f64,
    pub immediate_yield: f64,
    pub integral_yield: f64,
}

/// Extract every KPI from one pool series
pub fn extract_kpis(
    series: &PoolSeries,
    trade_size: f64,
    fee: f64,
) -> Result<KpiReport, AnalysisError> {
    Ok(KpiReport {
        price_volatility: price_volatility(series)?,
        price_integral_error: price_integral_error(series)?,
        slippage_magnitude: slippage_magnitude(series, trade_size, fee)?,
        slippage_volatility: slippage_volatility(series, trade_size, fee)?,
        immediate_yield: immediate_yield(series, fee)?,
        integral_yield: integral_yield(series, fee)?,
    })
}
