//! Text generation from the glopt IR.
//!
//! Two emitters share one naming scheme:
//! - [`GlslEmitter`] reconstructs recompilable shading-language source for a
//!   [`Target`](glopt_ir::Target)
//! - [`TreeEmitter`] prints the IR literally as a parenthesized tree
//!
//! Each `emit` call creates a fresh [`PrintContext`]; contexts are never
//! shared between runs.

#![no_std]

extern crate alloc;

mod context;
mod glsl;
mod names;
mod tree;

pub use context::PrintContext;
pub use glsl::GlslEmitter;
pub use names::{NameAllocator, NameStyle, Scope, ScopeStack};
pub use tree::TreeEmitter;
