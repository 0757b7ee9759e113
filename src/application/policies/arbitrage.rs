//! Arbitrage policy
//!
//! Computes, per pool, the reserve adjustment that rebounds its price
//! toward the shared reference price, then applies only a random fraction
//! of it, modeling partial and competitive arbitrage.

use rand::prelude::*;

use crate::domain::{PairState, PoolLedger, SimulationError};

/// Configuration for the arbitrage policy
#[derive(Debug, Clone)]
pub struct ArbitrageConfig {
    /// Upper bound of the applied fraction of the full rebound trade
    pub arbitrage_intensity: f64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            arbitrage_intensity: 0.1,
        }
    }
}

/// Delta ledger that pulls every pool toward the reference price
///
/// For each pool, the optimal token-1 value solves the rebound against
/// `price_error = amm_price + market_price`; the sum (not the gap) is the
/// denominator, so the full signal already undershoots the rebound. The
/// committed delta is the optimal trade scaled by
/// `uniform(0,1) * arbitrage_intensity`.
///
/// Fails when the denominator is zero.
pub fn arbitrage_signal(
    ledger: &PoolLedger,
    market_price: f64,
    config: &ArbitrageConfig,
    rng: &mut impl Rng,
) -> Result<PoolLedger, SimulationError> {
    let mut delta_pair_state = PoolLedger::new();

    for (label, pair_state) in ledger {
        let reserve_1 = pair_state.reserve_token_1;
        let reserve_2 = pair_state.reserve_token_2;
        let amm_price = pair_state.price(label)?;

        let price_error = amm_price + market_price;
        if price_error == 0.0 {
            return Err(SimulationError::ZeroPriceError {
                label: label.clone(),
            });
        }
        let optimal_value = (reserve_1 * market_price - reserve_2) / price_error;

        let optimal_arbitrage = PairState::new(-optimal_value, optimal_value * amm_price);

        // Only a random fraction of the equilibrating trade lands
        let applied_fraction = rng.r#gen::<f64>() * config.arbitrage_intensity;
        let real_arbitrage = optimal_arbitrage.scale(applied_fraction);

        delta_pair_state.insert(label.clone(), real_arbitrage);
    }

    Ok(delta_pair_state)
}
