//! Filecheck directive parsing and matching using the filecheck crate

use filecheck::{Checker, CheckerBuilder, NO_VARIABLES};

/// Build a filechecker from directive lines (`check: ...`, `nextln: ...`).
/// Patterns starting with `#` are matched literally, so `check: #version 330`
/// works.
pub fn build_filechecker(expected_text: &str) -> Result<Checker, String> {
    let mut builder = CheckerBuilder::new();
    for line in expected_text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        builder
            .directive(line)
            .map_err(|e| format!("bad directive '{}': {}", line, e))?;
    }
    Ok(builder.finish())
}

/// Match emitted shader text against filecheck directives. On failure the
/// error carries the checker's explanation followed by the full output.
pub fn match_filecheck(actual: &str, expected_text: &str) -> Result<(), String> {
    let checker = build_filechecker(expected_text)?;
    let matched = checker
        .check(actual, NO_VARIABLES)
        .map_err(|e| format!("filecheck error: {}", e))?;
    if matched {
        return Ok(());
    }
    let explain = checker
        .explain(actual, NO_VARIABLES)
        .map(|(_, explain)| explain)
        .unwrap_or_default();
    Err(format!(
        "filecheck failed:\n{}\n--- output ---\n{}",
        explain, actual
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_and_nextln() {
        let output = "uniform float x;\nvoid main()\n{\n  r = x;\n}\n";
        assert!(match_filecheck(output, "check: void main()\nnextln: {").is_ok());
        assert!(match_filecheck(output, "check: r = x;\nnot: uniform").is_ok());
        assert!(match_filecheck(output, "check: missing").is_err());
    }

    #[test]
    fn test_version_directive_is_literal() {
        let output = "#version 330\nuniform vec4 u;\n";
        assert!(match_filecheck(output, "check: #version 330\nnextln: uniform vec4 u;").is_ok());
    }
}
