//! CLI argument definitions for transform-myd.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "transform-myd",
    version,
    about = "Resolve source fields to SAP migration target fields",
    long_about = "Index source and target field lists and build field mappings.\n\n\
                  Matching runs skip rules, manual mappings, exact names, synonyms\n\
                  and fuzzy similarity, in that order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Project root holding the input and output directories.
    #[arg(long = "root", value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Configuration file (default: <ROOT>/config.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Profile the source file's header into index_source.json.
    IndexSource(IndexSourceArgs),

    /// Parse the target field list into index_target.json.
    IndexTarget(ObjectArgs),

    /// Match source fields to target fields and write mapping.json.
    Map(MapArgs),
}

#[derive(Args)]
pub struct ObjectArgs {
    /// Migration object, e.g. m140.
    #[arg(long = "object", value_name = "OBJECT")]
    pub object: String,

    /// Variant of the object, e.g. bnka.
    #[arg(long = "variant", value_name = "VARIANT")]
    pub variant: String,
}

#[derive(Args)]
pub struct IndexSourceArgs {
    #[command(flatten)]
    pub selection: ObjectArgs,

    /// Overwrite an existing index_source.json.
    #[arg(long = "force")]
    pub force: bool,
}

#[derive(Args)]
pub struct MapArgs {
    #[command(flatten)]
    pub selection: ObjectArgs,

    /// Minimum similarity for fuzzy matches, 0.0 to 1.0.
    #[arg(long = "fuzzy-threshold", value_name = "SCORE")]
    pub fuzzy_threshold: Option<f64>,

    /// Suggestions listed per unmapped source field.
    #[arg(long = "max-suggestions", value_name = "N")]
    pub max_suggestions: Option<usize>,

    /// Exact matches and override rules only.
    #[arg(long = "disable-fuzzy")]
    pub disable_fuzzy: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
