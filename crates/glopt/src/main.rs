use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic};

use glopt::{
    ApiProfile, ConvertError, ConvertOptions, Converter, LanguageTarget, OptimizationOptions,
    PassId, ShaderStage,
};

/// glopt: GLSL source-to-source optimizer
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input GLSL file
    input: PathBuf,

    /// Shader stage of the input
    #[arg(short, long, value_enum, default_value = "fragment")]
    stage: Stage,

    /// Output form
    #[arg(short, long, value_enum, default_value = "glsl")]
    target: Output,

    /// GLSL version used when the source has no #version directive
    #[arg(long, default_value_t = 110)]
    glsl_version: u32,

    /// API profile
    #[arg(long, value_enum, default_value = "compat")]
    api: Api,

    /// Disable a pass by name (repeatable)
    #[arg(long, value_name = "PASS", value_parser = parse_pass)]
    disable: Vec<PassId>,

    /// Enable a pass by name (repeatable, applied after --disable)
    #[arg(long, value_name = "PASS", value_parser = parse_pass)]
    enable: Vec<PassId>,

    /// Disable every pass before applying --enable
    #[arg(long)]
    no_passes: bool,

    /// Pipeline iteration ceiling
    #[arg(long)]
    max_passes: Option<u32>,

    /// Loops with more iterations are not unrolled
    #[arg(long)]
    max_unroll: Option<u32>,

    /// The input is a fragment of a program, not a linkable unit
    #[arg(long)]
    partial: bool,

    /// Parse the source without running the preprocessor
    #[arg(long)]
    skip_preprocessing: bool,

    /// Output path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log pipeline progress to stderr (-vv for every pass)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Vertex,
    TessCtrl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl From<Stage> for ShaderStage {
    fn from(s: Stage) -> Self {
        match s {
            Stage::Vertex => ShaderStage::Vertex,
            Stage::TessCtrl => ShaderStage::TessCtrl,
            Stage::TessEval => ShaderStage::TessEval,
            Stage::Geometry => ShaderStage::Geometry,
            Stage::Fragment => ShaderStage::Fragment,
            Stage::Compute => ShaderStage::Compute,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Ast,
    Ir,
    Glsl,
}

impl From<Output> for LanguageTarget {
    fn from(o: Output) -> Self {
        match o {
            Output::Ast => LanguageTarget::Ast,
            Output::Ir => LanguageTarget::Ir,
            Output::Glsl => LanguageTarget::Glsl,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Api {
    Compat,
    Core,
}

impl From<Api> for ApiProfile {
    fn from(a: Api) -> Self {
        match a {
            Api::Compat => ApiProfile::Compatibility,
            Api::Core => ApiProfile::Core,
        }
    }
}

fn parse_pass(s: &str) -> Result<PassId, String> {
    PassId::from_name(s).ok_or_else(|| {
        let known: Vec<&str> = PassId::ALL.iter().map(|p| p.name()).collect();
        format!("unknown pass '{s}' (known: {})", known.join(", "))
    })
}

/// Stderr logger for `-v`.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn options(cli: &Cli) -> ConvertOptions {
    let mut optimization = if cli.no_passes {
        OptimizationOptions::no_passes()
    } else {
        OptimizationOptions::default()
    };
    for pass in &cli.disable {
        optimization.passes.set(*pass, false);
    }
    for pass in &cli.enable {
        optimization.passes.set(*pass, true);
    }
    if let Some(n) = cli.max_passes {
        optimization.max_passes = n;
    }
    if let Some(n) = cli.max_unroll {
        optimization.limits.max_unroll_iterations = n;
    }

    let mut options = ConvertOptions {
        optimization,
        ..ConvertOptions::default()
    };
    options.control.partial_shader = cli.partial;
    options.control.skip_preprocessing = cli.skip_preprocessing;
    options
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = std::fs::read_to_string(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;

    let converter = Converter::new();
    let result = converter.optimize(
        &source,
        cli.stage.into(),
        cli.api.into(),
        cli.target.into(),
        cli.glsl_version,
        &options(&cli),
    );
    let text = match result {
        Ok(text) => text,
        Err(ConvertError::Frontend { log }) => {
            eprint!("{log}");
            return Err(miette::miette!("{} failed to compile", cli.input.display()));
        }
        Err(e) => return Err(miette::miette!("optimization failed: {e}")),
    };

    match &cli.output {
        Some(path) => std::fs::write(path, text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => print!("{text}"),
    }
    Ok(())
}
