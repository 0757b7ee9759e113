//! Market price policy
//!
//! Derives the shared reference price and its dispersion. Two modes:
//! the consensus observation (mean pool price) and an exogenous random
//! walk applied on top of the previous reference price.

use rand::prelude::*;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::domain::{PoolLedger, SimulationError};

/// Scalar signal produced by the market movement substep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSignal {
    pub market_price: f64,
    pub market_price_volatility: f64,
}

/// How the reference price evolves each timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarketPriceMode {
    /// Reference price is the cross-pool consensus observed each step
    PoolConsensus,
    /// Reference price follows an exogenous random walk: each step moves
    /// by `uniform(-1, 1) * step_scale` as a fraction of the price
    RandomWalk { step_scale: f64 },
}

impl Default for MarketPriceMode {
    fn default() -> Self {
        Self::PoolConsensus
    }
}

/// Observe the reference price as the mean pool price, and its
/// dispersion as the population standard deviation over pools.
///
/// Fails on an empty ledger or a pool with a zero token-1 reserve; both
/// are invariant violations under valid dynamics.
pub fn observe_market(ledger: &PoolLedger) -> Result<MarketSignal, SimulationError> {
    if ledger.is_empty() {
        return Err(SimulationError::EmptyLedger);
    }

    let mut prices = Vec::with_capacity(ledger.len());
    for (label, pair_state) in ledger {
        prices.push(pair_state.price(label)?);
    }

    let n = prices.len() as f64;
    let mean = prices.iter().sum::<f64>() / n;
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

    Ok(MarketSignal {
        market_price: mean,
        market_price_volatility: variance.sqrt(),
    })
}

/// One random-walk step of the exogenous drift mode
///
/// The relative change is drawn uniformly from `[-step_scale, step_scale]`.
pub fn drift_market(market_price: f64, step_scale: f64, rng: &mut impl Rng) -> f64 {
    let raw_relative_change = Uniform::new_inclusive(-1.0, 1.0).sample(rng);
    market_price * (1.0 + raw_relative_change * step_scale)
}
