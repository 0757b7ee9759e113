//! Application layer: policies, simulation orchestration, and analysis
//!
//! Contains:
//! - **policies**: per-substep signal and commit functions
//! - **simulation**: run and experiment orchestration
//! - **analysis**: KPI extraction and goal combination over completed runs

pub mod analysis;
pub mod policies;
pub mod simulation;
