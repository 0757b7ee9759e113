//! State aggregator
//!
//! The commit functions are the only writers of durable state. Policies
//! hand their signals here; nothing else mutates the ledger or the
//! market scalars. Deterministic given its inputs.

use crate::domain::{PoolLedger, SimulationError, SimulationState, merge_ledgers};

use super::market_price::MarketSignal;

/// Commit a market movement signal into the scalar state
pub fn commit_market_signal(state: &SimulationState, signal: &MarketSignal) -> SimulationState {
    SimulationState {
        market_price: signal.market_price,
        market_price_volatility: signal.market_price_volatility,
        pair_state: state.pair_state.clone(),
    }
}

/// Merge policy delta ledgers into the durable pair state
///
/// Every delta is additively merged (absent keys count as zero). A
/// non-positive reserve after the merge is an invariant violation: the
/// run's configuration is invalid and the error is returned, never
/// clamped away.
pub fn commit_pair_deltas(
    state: &SimulationState,
    deltas: &[PoolLedger],
) -> Result<SimulationState, SimulationError> {
    let mut pair_state = state.pair_state.clone();
    for delta in deltas {
        pair_state = merge_ledgers(&pair_state, delta);
    }

    for (label, pair) in &pair_state {
        if !pair.is_strictly_positive() {
            return Err(SimulationError::NonPositiveReserve {
                label: label.clone(),
                reserve_token_1: pair.reserve_token_1,
                reserve_token_2: pair.reserve_token_2,
            });
        }
    }

    Ok(SimulationState {
        market_price: state.market_price,
        market_price_volatility: state.market_price_volatility,
        pair_state,
    })
}
