//! Typed shader IR.
//!
//! This crate defines the tree the optimizer rewrites and the emitters print:
//! - Types (scalars, vectors, matrices, arrays, structures, samplers)
//! - Variables with storage modes and decorations
//! - Values (expressions, texture operations, swizzles, dereferences, constants)
//! - Statements (assignments, calls, branches, loops, jumps, functions)
//! - The target descriptor consulted by passes and emitters
//! - The structural verifier and the loop analysis

#![no_std]

extern crate alloc;

pub mod analysis;
mod constant;
mod rvalue;
mod stmt;
mod target;
mod types;
mod unit;
mod variable;
mod verifier;
pub mod visit;

pub use analysis::{InductionVariable, LoopAnalysis, LoopState, Terminator};
pub use constant::{Constant, ConstantData, ScalarValue};
pub use rvalue::{
    component_letter, Deref, ExprOp, Expression, Rvalue, Swizzle, SwizzleMask, Texture,
    TextureOp,
};
pub use stmt::{full_mask, mask_letters, Assignment, Call, If, Loop, LoopId, LoopJump, Statement};
pub use target::{is_es_version, ApiProfile, Extension, Extensions, Limits, ShaderStage, Target};
pub use types::{BaseType, SamplerDim, SamplerType, StructField, StructType, Type};
pub use unit::{Function, Signature, Unit};
pub use variable::{
    image_format_from_name, image_format_name, Decorations, Interpolation, MemoryAccess,
    Precision, StorageMode, VarId, VarTable, Variable,
};
pub use verifier::{verify, VerifierError};
