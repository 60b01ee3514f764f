//! Test file parsing

use glopt::{ConvertOptions, PassId, ShaderStage};

const DIRECTIVES: [&str; 6] = ["check:", "sameln:", "nextln:", "unordered:", "not:", "regex:"];

/// What a test file runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCommand {
    /// Optimize and print GLSL
    Optimize,
    /// Optimize and print the IR tree
    Ir,
    /// Expect a front-end failure and match its log
    Error,
}

/// A test case extracted from a test file
#[derive(Debug, Clone)]
pub struct TestCase {
    pub command: TestCommand,
    /// Version used when the shader has no `#version` directive
    pub version: u32,
    pub stage: ShaderStage,
    pub options: ConvertOptions,
    /// The whole file; directive lines are comments to the parser
    pub source: String,
    /// Filecheck directives with the comment marker stripped
    pub expected_text: String,
}

/// Parse a test file: the `// test` header line, then the shader with
/// its directive comments.
pub fn parse_test_file(content: &str) -> Result<TestCase, String> {
    let header = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.strip_prefix("//"))
        .map(str::trim)
        .and_then(|l| l.strip_prefix("test "))
        .ok_or_else(|| String::from("missing '// test <command>' header"))?;

    let mut words = header.split_whitespace();
    let command = match words.next() {
        Some("optimize") => TestCommand::Optimize,
        Some("ir") => TestCommand::Ir,
        Some("error") => TestCommand::Error,
        other => return Err(format!("unknown test command {:?}", other)),
    };

    let mut case = TestCase {
        command,
        version: 110,
        stage: ShaderStage::Fragment,
        options: ConvertOptions::default(),
        source: String::from(content),
        expected_text: String::new(),
    };
    for word in words {
        apply_argument(&mut case, word)?;
    }

    case.expected_text = content
        .lines()
        .filter_map(|l| l.trim().strip_prefix("//"))
        .map(str::trim)
        .filter(|l| DIRECTIVES.iter().any(|d| l.starts_with(d)))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(case)
}

fn apply_argument(case: &mut TestCase, word: &str) -> Result<(), String> {
    if let Ok(version) = word.parse::<u32>() {
        case.version = version;
        return Ok(());
    }
    if let Some(stage) = stage_from_name(word) {
        case.stage = stage;
        return Ok(());
    }
    let pass = |name: &str| {
        PassId::from_name(name).ok_or_else(|| format!("unknown pass '{}'", name))
    };
    match word.split_once('=') {
        Some(("disable", name)) => {
            case.options.optimization.passes.set(pass(name)?, false);
        }
        Some(("enable", name)) => {
            case.options.optimization.passes.set(pass(name)?, true);
        }
        Some(("max_unroll", n)) => {
            case.options.optimization.limits.max_unroll_iterations =
                n.parse().map_err(|_| format!("bad max_unroll '{}'", n))?;
        }
        None if word == "no-passes" => {
            case.options.optimization = glopt::OptimizationOptions::no_passes();
        }
        None if word == "partial" => case.options.control.partial_shader = true,
        None if word == "skip-preprocessing" => case.options.control.skip_preprocessing = true,
        _ => return Err(format!("unknown test argument '{}'", word)),
    }
    Ok(())
}

fn stage_from_name(name: &str) -> Option<ShaderStage> {
    Some(match name {
        "vertex" => ShaderStage::Vertex,
        "tess_ctrl" => ShaderStage::TessCtrl,
        "tess_eval" => ShaderStage::TessEval,
        "geometry" => ShaderStage::Geometry,
        "fragment" => ShaderStage::Fragment,
        "compute" => ShaderStage::Compute,
        _ => return None,
    })
}
