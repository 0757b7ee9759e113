//! Simulation state
//!
//! The durable state advanced by exactly one timestep per transition:
//! the shared reference price, its cross-pool dispersion, and the ledger
//! of pool reserves.

use serde::{Deserialize, Serialize};

use super::pool::{Amm, PairState, PoolLedger};

/// Full state of one simulation run at one timestep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Shared external reference price (token 2 in terms of token 1)
    pub market_price: f64,
    /// Dispersion of pool prices around the reference
    pub market_price_volatility: f64,
    /// Reserves of every pool, keyed by label
    pub pair_state: PoolLedger,
}

impl SimulationState {
    /// Initial state: every pool starts at the same genesis reserves, the
    /// reference price at the supplied genesis value with zero dispersion.
    pub fn genesis(amms: &[Amm], genesis_reserves: PairState, genesis_market_price: f64) -> Self {
        let pair_state: PoolLedger = amms
            .iter()
            .map(|amm| (amm.label.clone(), genesis_reserves))
            .collect();

        Self {
            market_price: genesis_market_price,
            market_price_volatility: 0.0,
            pair_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_state() {
        let amms = vec![Amm::new("uniswap", 0.003), Amm::new("curve", 0.0015)];
        let state = SimulationState::genesis(&amms, PairState::new(10_000.0, 50_000.0), 5.0);

        assert_eq!(state.market_price, 5.0);
        assert_eq!(state.market_price_volatility, 0.0);
        assert_eq!(state.pair_state.len(), 2);
        assert_eq!(state.pair_state["uniswap"], PairState::new(10_000.0, 50_000.0));
        // Ledger preserves descriptor order
        let labels: Vec<&str> = state.pair_state.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["uniswap", "curve"]);
    }
}
