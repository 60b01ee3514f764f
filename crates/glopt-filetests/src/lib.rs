//! File-based tests for the GLSL optimizer.
//!
//! Each `.glsl` file under `filetests/` is one shader. Its first line names
//! the test command and the target, e.g.
//!
//! ```text
//! // test optimize 330 fragment disable=unroll_loops
//! ```
//!
//! and `// check:`, `// nextln:`, `// sameln:` or `// not:` comments match
//! the command's output with filecheck. Every directive line is an ordinary
//! GLSL comment, so the whole file is handed to the optimizer as is.

pub mod filecheck;
pub mod parser;

mod test_error;
mod test_ir;
mod test_optimize;

pub use filecheck::{build_filechecker, match_filecheck};
pub use parser::{parse_test_file, TestCase, TestCommand};

/// Run one test file, dispatching on its command.
///
/// # Panics
///
/// Panics when the file is malformed or the check fails.
pub fn run_test_file(content: &str) {
    let case = parse_test_file(content).unwrap_or_else(|e| panic!("bad test file: {}", e));
    match case.command {
        TestCommand::Optimize => test_optimize::run_test(&case),
        TestCommand::Ir => test_ir::run_test(&case),
        TestCommand::Error => test_error::run_test(&case),
    }
}
