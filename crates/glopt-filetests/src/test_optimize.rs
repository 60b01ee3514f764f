//! The `optimize` subtest - optimized GLSL output

use glopt::{ApiProfile, Converter, LanguageTarget};

use crate::{filecheck::match_filecheck, parser::TestCase};

/// Run a single optimize test
pub fn run_test(case: &TestCase) {
    run_conversion(case, LanguageTarget::Glsl);
}

pub(crate) fn run_conversion(case: &TestCase, language_target: LanguageTarget) {
    let actual = Converter::new()
        .optimize(
            &case.source,
            case.stage,
            ApiProfile::Compatibility,
            language_target,
            case.version,
            &case.options,
        )
        .unwrap_or_else(|e| panic!("Conversion failed: {}\n\nSource:\n{}", e, case.source));

    if let Err(msg) = match_filecheck(&actual, &case.expected_text) {
        panic!("{}\n\nOutput:\n{}\n\nSource:\n{}", msg, actual, case.source);
    }
}

#[cfg(test)]
mod tests {
    use crate::run_test_file;

    #[test]
    fn test_constant_folding() {
        run_test_file(include_str!("../filetests/optimize/constant-folding.glsl"));
    }

    #[test]
    fn test_canonical_for() {
        run_test_file(include_str!("../filetests/optimize/canonical-for.glsl"));
    }

    #[test]
    fn test_dead_code() {
        run_test_file(include_str!("../filetests/optimize/dead-code.glsl"));
    }

    #[test]
    fn test_legacy_texture() {
        run_test_file(include_str!("../filetests/optimize/legacy-texture.glsl"));
    }

    #[test]
    fn test_preprocessor() {
        run_test_file(include_str!("../filetests/optimize/preprocessor.glsl"));
    }
}
