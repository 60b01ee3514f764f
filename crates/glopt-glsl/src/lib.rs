//! GLSL front end for glopt.
//!
//! Turns shader source into an IR [`Unit`](glopt_ir::Unit):
//! - [`preprocess`] expands macros and harvests `#version`/`#extension`
//! - [`parse_glsl`] runs glsl-parser over the expanded text
//! - [`lower`] type checks the syntax tree and builds the IR

#![no_std]

extern crate alloc;

mod builtins;
mod error;
mod lower;
mod parser;
pub mod preprocess;
mod symbols;
mod types;

pub use error::{GlslError, GlslResult};
pub use lower::{lower, Lowerer};
pub use parser::{dump_ast, is_blank, parse_glsl};
pub use preprocess::{preprocess, scan_directives, Preprocessed};
pub use symbols::{FunctionSignature, Parameter, ParameterQualifier, SymbolTable};
pub use types::{non_array_type, parse_swizzle, type_from_name};
