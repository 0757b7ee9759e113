//! Domain layer: pure value types and their invariants

mod error;
mod pool;
mod state;

pub use error::{AnalysisError, SimulationError};
pub use pool::{Amm, PairState, PoolLedger, merge_ledgers};
pub use state::SimulationState;
