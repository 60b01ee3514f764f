//! The conversion driver.

use glopt_emit::{GlslEmitter, TreeEmitter};
use glopt_glsl::{dump_ast, is_blank, lower, parse_glsl, preprocess, scan_directives};
use glopt_ir::{ApiProfile, ShaderStage, Target, Unit};
use glopt_opt::{PassLibrary, Pipeline};
use glsl::syntax::TranslationUnit;

use crate::{
    error::ConvertError,
    options::{ControlOptions, ConvertOptions, LanguageTarget},
};

/// Shader optimizer.
///
/// Holds the pass implementations. Every call builds its own target,
/// pipeline and print context, so one converter can serve any number of
/// independent conversions.
#[derive(Debug)]
pub struct Converter {
    library: PassLibrary,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Converter with every built-in pass registered.
    pub fn new() -> Self {
        Self::with_library(PassLibrary::with_builtins())
    }

    pub fn with_library(library: PassLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &PassLibrary {
        &self.library
    }

    /// Optimize `source` and print it as `language_target`.
    ///
    /// A `#version` directive in the source overrides `version`.
    pub fn optimize(
        &self,
        source: &str,
        stage: ShaderStage,
        api: ApiProfile,
        language_target: LanguageTarget,
        version: u32,
        options: &ConvertOptions,
    ) -> Result<String, ConvertError> {
        let mut target = self.target(stage, api, version, options);
        let tu = parse(source, &mut target, &options.control)?;

        if language_target == LanguageTarget::Ast {
            return Ok(tu.as_ref().map(dump_ast).unwrap_or_default());
        }

        let mut unit = match &tu {
            Some(tu) => lower(tu, &target).map_err(ConvertError::frontend)?,
            None => Unit::new(),
        };

        if !unit.is_empty() {
            let linked = !options.control.partial_shader;
            let pipeline = Pipeline::new(&options.optimization, &target, &self.library);
            let report = pipeline.run(&mut unit, linked)?;
            log::debug!(
                "pipeline {:?} after {} iterations, {} rewrites",
                report.state,
                report.iterations,
                report.applied.len()
            );
        }

        Ok(match language_target {
            LanguageTarget::Ir => TreeEmitter::new().emit(&unit),
            _ => GlslEmitter::new(&target)
                .with_entry(&options.optimization.dead_functions.entry_function)
                .emit(&unit),
        })
    }

    /// Build the IR for `source` without optimizing it.
    pub fn create_graph(
        &self,
        source: &str,
        stage: ShaderStage,
        api: ApiProfile,
        version: u32,
        options: &ConvertOptions,
    ) -> Result<Unit, ConvertError> {
        let mut target = self.target(stage, api, version, options);
        match parse(source, &mut target, &options.control)? {
            Some(tu) => lower(&tu, &target).map_err(ConvertError::frontend),
            None => Ok(Unit::new()),
        }
    }

    fn target(
        &self,
        stage: ShaderStage,
        api: ApiProfile,
        version: u32,
        options: &ConvertOptions,
    ) -> Target {
        let mut target = Target::new(version, stage);
        target.profile = api;
        target.limits = options.optimization.limits;
        target
    }
}

/// Preprocess and parse `source`, applying its directives to `target`.
/// `None` when nothing but whitespace and comments is left.
fn parse(
    source: &str,
    target: &mut Target,
    control: &ControlOptions,
) -> Result<Option<TranslationUnit>, ConvertError> {
    let pp = if control.skip_preprocessing {
        scan_directives(source)
    } else {
        preprocess(source)
    }
    .map_err(ConvertError::frontend)?;
    pp.apply(target);
    log::debug!(
        "target: version {}{} {:?}",
        target.version,
        if target.es { " es" } else { "" },
        target.stage
    );

    if is_blank(&pp.text) {
        return Ok(None);
    }
    parse_glsl(&pp.text)
        .map(Some)
        .map_err(ConvertError::frontend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_source_is_empty_unit() {
        let converter = Converter::new();
        let options = ConvertOptions::default();
        let unit = converter
            .create_graph(
                "// nothing\n",
                ShaderStage::Fragment,
                ApiProfile::Compatibility,
                110,
                &options,
            )
            .unwrap();
        assert!(unit.is_empty());

        let text = converter
            .optimize(
                "  \n",
                ShaderStage::Fragment,
                ApiProfile::Compatibility,
                LanguageTarget::Glsl,
                110,
                &options,
            )
            .unwrap();
        assert_eq!(text, "#version 110\n");
    }

    #[test]
    fn test_frontend_error_carries_log() {
        let converter = Converter::new();
        let err = converter
            .create_graph(
                "void main() { x = 1.0; }",
                ShaderStage::Fragment,
                ApiProfile::Compatibility,
                110,
                &ConvertOptions::default(),
            )
            .unwrap_err();
        let log = err.log().unwrap();
        assert!(log.starts_with("error: "), "{}", log);
        assert!(log.contains("'x'"), "{}", log);
    }
}
