//! Structural IR verifier.
//!
//! Run by the optimization pipeline after every pass. A violation means a
//! pass produced a malformed tree, never that the input program is wrong.

use alloc::{string::String, vec::Vec};

use crate::Unit;

mod entities;
mod exprs;
mod structure;

pub use entities::verify_entities;
pub use exprs::verify_exprs;
pub use structure::verify_structure;

/// Verifier error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierError {
    /// Error message describing what's wrong
    pub message: String,
    /// Optional location information (e.g., "function main", "loop3")
    pub location: Option<String>,
}

impl VerifierError {
    /// Create a new verifier error
    pub fn new(message: String) -> Self {
        Self {
            message,
            location: None,
        }
    }

    /// Create a new verifier error with location
    pub fn with_location(message: String, location: String) -> Self {
        Self {
            message,
            location: Some(location),
        }
    }
}

impl core::fmt::Display for VerifierError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}", loc, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Verify a unit is well-formed
///
/// Runs all checks and collects every violation. Returns `Ok(())` if the
/// unit is valid.
///
/// # Arguments
///
/// * `unit` - The unit to verify
pub fn verify(unit: &Unit) -> Result<(), Vec<VerifierError>> {
    let mut errors = Vec::new();

    verify_entities(unit, &mut errors);
    verify_structure(unit, &mut errors);
    verify_exprs(unit, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Location label for a function.
pub(crate) fn function_location(name: Option<&str>) -> String {
    match name {
        Some(n) => alloc::format!("function {}", n),
        None => String::from("global scope"),
    }
}
