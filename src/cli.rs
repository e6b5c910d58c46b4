// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `inkflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "inkflow",
    version,
    about = "Generate a comic book page by page: cover, story pages and back cover.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Inkflow.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Inkflow.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `INKFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the page plan, but don't call any model.
    #[arg(long)]
    pub dry_run: bool,

    /// Read reader commands (`sheet 3`, `next`, `reink 2`, ...) from stdin
    /// instead of generating the whole book and exiting.
    #[arg(long)]
    pub interactive: bool,

    /// Export directory; overrides `[session].output_dir`.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
