//! User action policy
//!
//! Draws one random trade or liquidity event per pool per timestep.
//! Amounts are proportional to the current reserves at the pool's own
//! price ratio, so the linear model never needs a bonding curve.

use indexmap::IndexMap;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Amm, PairState, PoolLedger, SimulationError};

/// Kind of synthetic user event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    /// Exchange one token for the other; the fee stays in the pool
    Swap,
    /// Proportional liquidity add (direction +1) or remove (direction -1)
    MintBurn,
}

/// Configuration for the user action policy
#[derive(Debug, Clone)]
pub struct UserActionConfig {
    /// Upper bound of the drawn trade size as a fraction of reserves
    pub user_action_intensity: f64,
    /// Probability that a drawn action is a swap rather than a mint/burn
    pub swap_vs_liquidity_preference: f64,
}

impl Default for UserActionConfig {
    fn default() -> Self {
        Self {
            user_action_intensity: 0.1,
            swap_vs_liquidity_preference: 0.5,
        }
    }
}

/// Delta ledger of one random user event per pool
///
/// Per pool the draws are, in order: action (swap with probability
/// `swap_vs_liquidity_preference`), direction (±1 uniform), intensity
/// (`uniform(0,1) * user_action_intensity`). A positive direction sizes
/// the event from reserve 1, a negative one from reserve 2; the opposite
/// amount preserves the current price ratio.
pub fn user_action_signal(
    amms: &IndexMap<String, Amm>,
    ledger: &PoolLedger,
    config: &UserActionConfig,
    rng: &mut impl Rng,
) -> Result<PoolLedger, SimulationError> {
    let mut delta_pair_state = PoolLedger::new();

    for (label, pair_state) in ledger {
        let amm = amms
            .get(label)
            .ok_or_else(|| SimulationError::MissingDescriptor {
                label: label.clone(),
            })?;

        let reserve_1 = pair_state.reserve_token_1;
        let reserve_2 = pair_state.reserve_token_2;
        if reserve_1 == 0.0 || reserve_2 == 0.0 {
            return Err(SimulationError::ZeroReserve {
                label: label.clone(),
            });
        }

        let action = if rng.r#gen::<f64>() < config.swap_vs_liquidity_preference {
            UserAction::Swap
        } else {
            UserAction::MintBurn
        };
        let direction: f64 = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let intensity = rng.r#gen::<f64>() * config.user_action_intensity;

        // Proportional amounts at the pool's current price ratio
        let (mut token_amount_1, mut token_amount_2) = if direction == 1.0 {
            let token_amount_1 = reserve_1 * intensity;
            let token_2_price = reserve_2 / reserve_1;
            (token_amount_1, token_amount_1 * token_2_price)
        } else {
            let token_amount_2 = reserve_2 * intensity;
            let token_1_price = reserve_1 / reserve_2;
            (token_amount_2 * token_1_price, token_amount_2)
        };

        let delta = match action {
            UserAction::Swap => {
                // The fee comes out of the outgoing token, so the pool
                // keeps it as extra reserve
                if direction == 1.0 {
                    let swap_fee = token_amount_1 * amm.transaction_fee;
                    token_amount_1 -= swap_fee;
                } else {
                    let swap_fee = token_amount_2 * amm.transaction_fee;
                    token_amount_2 -= swap_fee;
                }
                PairState::new(-token_amount_1 * direction, token_amount_2 * direction)
            }
            UserAction::MintBurn => {
                PairState::new(token_amount_1 * direction, token_amount_2 * direction)
            }
        };

        delta_pair_state.insert(label.clone(), delta);
    }

    Ok(delta_pair_state)
}
