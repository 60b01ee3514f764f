//! Analysis modules for IR units.
//!
//! Analyses are read-only snapshots; recompute them after mutating the unit.

pub mod loops;

pub use loops::{InductionVariable, LoopAnalysis, LoopState, Terminator};
