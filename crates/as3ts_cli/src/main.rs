//! as3ts: Convert ActionScript 3 sources to TypeScript.
//!
//! Usage:
//!   as3ts [options] <file...>
//!
//! Each input is converted independently; a file that fails to parse is
//! reported and skipped while the rest are still written.

mod logger;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use as3ts_compiler::{output_path, ConvertOutput, Converter, SourceFile};
use as3ts_diagnostics::DiagnosticCategory;
use as3ts_emitter::EmitterOptions;
use as3ts_options::{parse_config_file, ConverterConfig, LineSeparator};
use clap::{Parser as ClapParser, ValueEnum};
use miette::{IntoDiagnostic, Report, WrapErr};
use tracing::{debug, info};

use crate::logger::LogLevel;

#[derive(ClapParser, Debug)]
#[command(name = "as3ts", version, about = "Convert ActionScript 3 sources to TypeScript")]
struct Cli {
    /// ActionScript files to convert.
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Path to a JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write outputs to this directory instead of next to each input.
    #[arg(short, long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Keep packages as TypeScript namespaces.
    #[arg(long)]
    namespaces: bool,

    /// Line ending of the converted files.
    #[arg(long = "line-separator", value_enum)]
    line_separator: Option<LineEnding>,

    /// Show informational diagnostics and debug logs.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report failures.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LineEnding {
    Lf,
    Crlf,
}

impl From<LineEnding> for LineSeparator {
    fn from(ending: LineEnding) -> Self {
        match ending {
            LineEnding::Lf => LineSeparator::Lf,
            LineEnding::Crlf => LineSeparator::Crlf,
        }
    }
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Error
        } else {
            LogLevel::Info
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    converted: usize,
    failed: usize,
    warnings: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_with_level(cli.log_level());

    let start = Instant::now();
    match run(&cli) {
        Ok(summary) => {
            info!(
                converted = summary.converted,
                failed = summary.failed,
                warnings = summary.warnings,
                "finished in {:.2}s",
                start.elapsed().as_secs_f64()
            );
            if summary.failed > 0 {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> miette::Result<Summary> {
    let config = match &cli.config {
        Some(path) => parse_config_file(path)
            .into_diagnostic()
            .wrap_err("failed to load configuration")?,
        None => ConverterConfig::default(),
    };
    let options = build_options(cli, &config)?;
    debug!(?options, "options");

    if let Some(dir) = &cli.out_dir {
        std::fs::create_dir_all(dir)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot create output directory {}", dir.display()))?;
    }

    let mut summary = Summary::default();
    let mut sources = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        match SourceFile::load(path) {
            Ok(source) => sources.push(source),
            Err(error) => {
                summary.failed += 1;
                print_report(Report::from_err(error).wrap_err(format!("cannot read {}", path.display())));
            }
        }
    }

    let converter = Converter::new(options);
    let extension = config.output_extension();
    for outcome in converter.convert_batch(&sources) {
        match outcome.result {
            Ok(output) => {
                print_diagnostics(cli, &output);
                summary.warnings += output.warning_count();
                let target = output_path(Path::new(&outcome.file_name), cli.out_dir.as_deref(), extension);
                match std::fs::write(&target, &output.text) {
                    Ok(()) => {
                        debug!(from = %outcome.file_name, to = %target.display(), "written");
                        summary.converted += 1;
                    }
                    Err(error) => {
                        summary.failed += 1;
                        print_report(Report::from_err(error).wrap_err(format!("cannot write {}", target.display())));
                    }
                }
            }
            Err(error) => {
                summary.failed += 1;
                print_report(Report::from_err(error));
            }
        }
    }
    Ok(summary)
}

/// Configuration file first, then command-line overrides.
fn build_options(cli: &Cli, config: &ConverterConfig) -> miette::Result<EmitterOptions> {
    let mut options = EmitterOptions::from_config(config)
        .into_diagnostic()
        .wrap_err("invalid import rewrite pattern")?;
    if cli.namespaces {
        options.use_namespaces = true;
    }
    if let Some(ending) = cli.line_separator {
        options.line_separator = LineSeparator::from(ending).as_str().to_string();
    }
    Ok(options)
}

fn print_diagnostics(cli: &Cli, output: &ConvertOutput) {
    if cli.quiet {
        return;
    }
    for diagnostic in &output.diagnostics {
        if diagnostic.category == DiagnosticCategory::Message && !cli.verbose {
            continue;
        }
        eprintln!("{diagnostic}");
    }
}

fn print_report(report: Report) {
    eprintln!("{report:?}");
}
