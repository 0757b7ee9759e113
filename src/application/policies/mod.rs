//! Per-substep policies and commit functions
//!
//! Each timestep runs two ordered substeps:
//!
//! 1. **Market movements** — the market price policy produces a scalar
//!    signal, committed by [`commit_market_signal`].
//! 2. **Pool actions** — the user action and arbitrage policies each
//!    produce a delta ledger, committed together by
//!    [`commit_pair_deltas`].
//!
//! Policies are pure functions of (state, configuration, random draws);
//! only the commit functions produce the next durable state.

mod aggregator;
mod arbitrage;
mod market_price;
mod user_action;

pub use aggregator::{commit_market_signal, commit_pair_deltas};
pub use arbitrage::{ArbitrageConfig, arbitrage_signal};
pub use market_price::{MarketPriceMode, MarketSignal, drift_market, observe_market};
pub use user_action::{UserAction, UserActionConfig, user_action_signal};
