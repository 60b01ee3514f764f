//! Error types for the GLSL front end.

use alloc::string::String;

/// Result type for front-end operations.
pub type GlslResult<T> = Result<T, GlslError>;

/// Error raised while preprocessing, parsing or lowering a shader.
///
/// Every variant is a problem with the input program. The driver turns it
/// into the diagnostic log handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlslError {
    /// Malformed or unsupported preprocessor directive
    #[error("preprocessor error: {0}")]
    Preprocess(String),
    /// Parsing error from glsl-parser
    #[error("parse error: {0}")]
    Parse(String),
    /// Semantic error: unknown name, mismatched types, bad operands
    #[error("type error: {0}")]
    Type(String),
    /// Valid GLSL that the front end cannot lower
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl GlslError {
    pub fn preprocess(msg: impl Into<String>) -> Self {
        GlslError::Preprocess(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GlslError::Parse(msg.into())
    }

    pub fn type_error(msg: impl Into<String>) -> Self {
        GlslError::Type(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        GlslError::Unsupported(msg.into())
    }
}
