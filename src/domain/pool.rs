//! AMM pool descriptors and reserve-pair state
//!
//! A pool is a two-token reserve pair whose implied price is the ratio of
//! its reserves. The descriptor is fixed at initialization; only the pair
//! state evolves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::error::SimulationError;

/// Immutable parameters of a single AMM pool
///
/// One descriptor per pool, identified by a unique label. The fee is a
/// fraction in `[0, 1)` deducted from the outgoing token of a swap and
/// retained by the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amm {
    /// Unique pool label
    pub label: String,
    /// Swap fee as a fraction of the outgoing amount
    pub transaction_fee: f64,
    /// Optional flat execution cost (e.g. gas), carried for calibration;
    /// not consumed by the linear reserve model
    pub fixed_cost: Option<f64>,
}

impl Amm {
    pub fn new(label: impl Into<String>, transaction_fee: f64) -> Self {
        Self {
            label: label.into(),
            transaction_fee,
            fixed_cost: None,
        }
    }

    pub fn with_fixed_cost(mut self, fixed_cost: f64) -> Self {
        self.fixed_cost = Some(fixed_cost);
        self
    }
}

/// Reserves of one AMM pair
///
/// A pure value: `merge` and `scale` return new states and never touch an
/// operand. An absent operand in ledger merges behaves as [`PairState::ZERO`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairState {
    pub reserve_token_1: f64,
    pub reserve_token_2: f64,
}

impl PairState {
    /// Additive identity for ledger merges
    pub const ZERO: PairState = PairState {
        reserve_token_1: 0.0,
        reserve_token_2: 0.0,
    };

    pub fn new(reserve_token_1: f64, reserve_token_2: f64) -> Self {
        Self {
            reserve_token_1,
            reserve_token_2,
        }
    }

    /// Elementwise sum of two pair states
    pub fn merge(&self, other: &PairState) -> PairState {
        PairState {
            reserve_token_1: self.reserve_token_1 + other.reserve_token_1,
            reserve_token_2: self.reserve_token_2 + other.reserve_token_2,
        }
    }

    /// Elementwise scaling by a scalar
    pub fn scale(&self, factor: f64) -> PairState {
        PairState {
            reserve_token_1: self.reserve_token_1 * factor,
            reserve_token_2: self.reserve_token_2 * factor,
        }
    }

    /// Spot price of token 2 in terms of token 1 (`reserve_2 / reserve_1`)
    ///
    /// A zero `reserve_token_1` leaves the ratio undefined and is reported
    /// as an error; valid dynamics never reach it.
    pub fn price(&self, label: &str) -> Result<f64, SimulationError> {
        if self.reserve_token_1 == 0.0 {
            return Err(SimulationError::ZeroReserve {
                label: label.to_string(),
            });
        }
        Ok(self.reserve_token_2 / self.reserve_token_1)
    }

    /// Both reserves strictly positive
    pub fn is_strictly_positive(&self) -> bool {
        self.reserve_token_1 > 0.0 && self.reserve_token_2 > 0.0
    }
}

/// Ordered mapping from pool label to its pair state
///
/// The key set is fixed for a run; iteration order is insertion order so
/// that draws consuming one RNG stream stay reproducible.
pub type PoolLedger = IndexMap<String, PairState>;

/// Additive merge of two ledgers, key by key
///
/// A key present in only one operand is imported unchanged (the missing
/// side counts as [`PairState::ZERO`]). Neither operand is modified.
pub fn merge_ledgers(a: &PoolLedger, b: &PoolLedger) -> PoolLedger {
    let mut merged = a.clone();
    for (label, delta) in b {
        match merged.get_mut(label) {
            Some(state) => *state = state.merge(delta),
            None => {
                merged.insert(label.clone(), *delta);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(&str, f64, f64)]) -> PoolLedger {
        entries
            .iter()
            .map(|(label, r1, r2)| (label.to_string(), PairState::new(*r1, *r2)))
            .collect()
    }

    #[test]
    fn test_merge_is_elementwise_sum() {
        let a = PairState::new(100.0, 500.0);
        let b = PairState::new(-10.0, 50.0);

        let merged = a.merge(&b);
        assert_eq!(merged, PairState::new(90.0, 550.0));
        // Operands untouched
        assert_eq!(a, PairState::new(100.0, 500.0));
        assert_eq!(b, PairState::new(-10.0, 50.0));
    }

    #[test]
    fn test_zero_is_merge_identity() {
        let a = PairState::new(42.0, 7.0);
        assert_eq!(a.merge(&PairState::ZERO), a);
        assert_eq!(PairState::ZERO.merge(&a), a);
    }

    #[test]
    fn test_scale() {
        let a = PairState::new(10.0, -4.0);
        assert_eq!(a.scale(0.5), PairState::new(5.0, -2.0));
        assert_eq!(a.scale(0.0), PairState::ZERO);
    }

    #[test]
    fn test_ledger_merge_commutative() {
        let a = ledger(&[("uniswap", 100.0, 500.0), ("curve", 10.0, 20.0)]);
        let b = ledger(&[("uniswap", -5.0, 25.0), ("curve", 1.0, -2.0)]);

        let ab = merge_ledgers(&a, &b);
        let ba = merge_ledgers(&b, &a);
        for label in ["uniswap", "curve"] {
            assert_eq!(ab[label], ba[label]);
        }
    }

    #[test]
    fn test_ledger_merge_associative() {
        let a = ledger(&[("uniswap", 100.0, 500.0)]);
        let b = ledger(&[("uniswap", -5.0, 25.0)]);
        let c = ledger(&[("uniswap", 2.0, -3.0)]);

        let left = merge_ledgers(&merge_ledgers(&a, &b), &c);
        let right = merge_ledgers(&a, &merge_ledgers(&b, &c));
        assert_eq!(left["uniswap"], right["uniswap"]);
    }

    #[test]
    fn test_ledger_merge_imports_absent_keys() {
        let a = ledger(&[("uniswap", 100.0, 500.0)]);
        let b = ledger(&[("honeyswap", 7.0, 8.0)]);

        let merged = merge_ledgers(&a, &b);
        assert_eq!(merged["uniswap"], PairState::new(100.0, 500.0));
        assert_eq!(merged["honeyswap"], PairState::new(7.0, 8.0));
        assert_eq!(merged.len(), 2);
        // Operands unchanged
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_descriptor_builder() {
        let amm = Amm::new("uniswap", 0.003).with_fixed_cost(20.0);
        assert_eq!(amm.label, "uniswap");
        assert_eq!(amm.transaction_fee, 0.003);
        assert_eq!(amm.fixed_cost, Some(20.0));
        assert_eq!(Amm::new("curve", 0.0015).fixed_cost, None);
    }

    #[test]
    fn test_price_is_reserve_ratio() {
        let state = PairState::new(10_000.0, 50_000.0);
        assert_eq!(state.price("uniswap").unwrap(), 5.0);
    }

    #[test]
    fn test_price_fails_on_zero_reserve() {
        let state = PairState::new(0.0, 50_000.0);
        let err = state.price("uniswap").unwrap_err();
        assert!(matches!(err, SimulationError::ZeroReserve { .. }));
    }
}
