use glopt_opt::OptimizationOptions;

/// Output produced by [`Converter::optimize`](crate::Converter::optimize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageTarget {
    /// Parse-tree dump; the pipeline never runs
    Ast,
    /// Prefix-notation IR dump after optimization
    Ir,
    /// Recompilable GLSL after optimization
    #[default]
    Glsl,
}

impl LanguageTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ast" => Some(LanguageTarget::Ast),
            "ir" => Some(LanguageTarget::Ir),
            "glsl" => Some(LanguageTarget::Glsl),
            _ => None,
        }
    }
}

/// Front-end controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlOptions {
    /// Hand the source to the parser without macro expansion or
    /// conditional evaluation
    pub skip_preprocessing: bool,
    /// The source is a fragment of a program, not a complete linkable unit
    pub partial_shader: bool,
}

/// Everything a conversion is configured with besides the target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub optimization: OptimizationOptions,
    pub control: ControlOptions,
}
