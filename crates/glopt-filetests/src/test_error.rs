//! The `error` subtest - front-end diagnostics

use glopt::{ApiProfile, ConvertError, Converter, LanguageTarget};

use crate::{filecheck::match_filecheck, parser::TestCase};

/// Run a single error test
pub fn run_test(case: &TestCase) {
    let result = Converter::new().optimize(
        &case.source,
        case.stage,
        ApiProfile::Compatibility,
        LanguageTarget::Glsl,
        case.version,
        &case.options,
    );
    let log = match result {
        Err(ConvertError::Frontend { log }) => log,
        Err(other) => panic!("Expected a front-end error, got: {}", other),
        Ok(text) => panic!(
            "Expected a front-end error, but conversion succeeded:\n{}\n\nSource:\n{}",
            text, case.source
        ),
    };

    if let Err(msg) = match_filecheck(&log, &case.expected_text) {
        panic!("{}\n\nLog:\n{}\n\nSource:\n{}", msg, log, case.source);
    }
}
