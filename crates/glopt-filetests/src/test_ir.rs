//! The `ir` subtest - IR tree dump after optimization

use glopt::LanguageTarget;

use crate::{parser::TestCase, test_optimize::run_conversion};

/// Run a single ir test
pub fn run_test(case: &TestCase) {
    run_conversion(case, LanguageTarget::Ir);
}
