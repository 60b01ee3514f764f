use glopt_glsl::GlslError;
use glopt_opt::PipelineError;

/// Failure of a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input program did not preprocess, parse or type check. `log` is
    /// the diagnostic text handed back to the user.
    #[error("{log}")]
    Frontend { log: String },
    /// A pass produced malformed IR
    #[error("internal error: {0}")]
    Internal(#[from] PipelineError),
}

impl ConvertError {
    pub(crate) fn frontend(e: GlslError) -> Self {
        ConvertError::Frontend {
            log: format!("error: {}\n", e),
        }
    }

    /// The diagnostic log of a front-end failure.
    pub fn log(&self) -> Option<&str> {
        match self {
            ConvertError::Frontend { log } => Some(log),
            ConvertError::Internal(_) => None,
        }
    }
}
