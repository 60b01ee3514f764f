//! Optimization passes and the fixed-point pipeline.
//!
//! - [`PassId`] names every schedulable pass and [`select`] builds the
//!   ordered schedule for a set of options
//! - [`PassLibrary`] maps pass identities to implementations
//! - [`Pipeline`] runs the schedule until no pass makes progress,
//!   verifying the unit after every pass

#![no_std]

extern crate alloc;

pub mod eval;
mod options;
mod pass;
mod pass_id;
pub mod passes;
mod pipeline;

pub use options::{
    AlgebraicOptions, CompilerOptions, DeadCodeOptions, DeadFunctionOptions,
    LowerIfToCondAssignOptions, LowerJumpsOptions, LowerQuadopVectorOptions,
    LowerVariableIndexOptions, LowerVectorInsertOptions, LoweringFlags, OptimizationOptions,
    PassToggles, DEFAULT_MAX_PASSES,
};
pub use pass::{Pass, PassContext, PassLibrary};
pub use pass_id::{select, PassArgs, PassId, PassInvocation};
pub use pipeline::{Pipeline, PipelineError, PipelineReport, PipelineState};
