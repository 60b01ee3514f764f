//! GLSL optimizer driver.
//!
//! [`Converter`] runs the front end, the optimization pipeline and one of
//! the emitters over a shader source string:
//!
//! ```text
//! source -> preprocess -> parse -> lower -> optimize -> GLSL / IR dump
//! ```

mod converter;
mod error;
mod options;

pub use converter::Converter;
pub use error::ConvertError;
pub use options::{ControlOptions, ConvertOptions, LanguageTarget};

pub use glopt_ir::{ApiProfile, ShaderStage};
pub use glopt_opt::{OptimizationOptions, PassId};
