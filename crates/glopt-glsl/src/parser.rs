//! GLSL parsing module.
//!
//! Wraps glsl-parser. The input is expected to be preprocessed already.

use alloc::{format, string::String};

use glsl::{parser::Parse, syntax::TranslationUnit};

use crate::error::{GlslError, GlslResult};

/// Parse GLSL source code into a translation unit.
///
/// # Errors
///
/// Returns `GlslError::Parse` if the source cannot be parsed.
pub fn parse_glsl(source: &str) -> GlslResult<TranslationUnit> {
    TranslationUnit::parse(source)
        .map_err(|e| GlslError::parse(format!("Failed to parse GLSL: {:?}", e)))
}

/// Source holding nothing but whitespace and comments.
///
/// The parser rejects an empty translation unit, so callers check this
/// first and produce an empty program instead.
pub fn is_blank(source: &str) -> bool {
    let mut rest = source.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |i| &after[i..]).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            match after.find("*/") {
                Some(i) => rest = after[i + 2..].trim_start(),
                None => return true,
            }
        } else {
            return rest.is_empty();
        }
    }
}

/// Debug rendering of the syntax tree.
pub fn dump_ast(tu: &TranslationUnit) -> String {
    format!("{:#?}\n", tu)
}
