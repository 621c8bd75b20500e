//! CLI argument definitions for aecdata.

use std::path::PathBuf;

use aec_model::{Metric, OutlierMethod};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "aecdata",
    version,
    about = "Normalize, convert and summarize construction product LCA data",
    long_about = "Work with construction product records and their life-cycle assessment data.\n\n\
                  Flattens nested product records, rescales LCA values between units,\n\
                  computes grouped statistics with outlier removal, and exports EPDx."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (text for humans, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Flatten product records and write them as CSV or JSON.
    Normalize(NormalizeArgs),

    /// Express every product in another unit.
    Convert(ConvertArgs),

    /// List the units products can be expressed in.
    Units(InputArgs),

    /// Compute grouped statistics of numeric fields.
    Stats(StatsArgs),

    /// Export products as EPDx records.
    Epdx(EpdxArgs),
}

#[derive(Args)]
pub struct InputArgs {
    /// JSON file with a product array or an API page object, or a
    /// normalized product table saved as `.csv`.
    #[arg(value_name = "PRODUCTS")]
    pub input: PathBuf,
}

#[derive(Args)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: TableFormatArg,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Target unit, or `declared_unit` to keep each product's own unit.
    #[arg(long = "unit", default_value = "declared_unit")]
    pub unit: String,

    /// Multiplier applied after unit conversion.
    #[arg(long = "amount", default_value_t = 1.0)]
    pub amount: f64,

    /// Write the converted table as CSV (stdout when omitted).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Unit all products are expressed in before computing statistics.
    #[arg(long = "unit", default_value = "kg")]
    pub unit: String,

    /// Grouping fields (default: product_type).
    #[arg(long = "group-by", value_delimiter = ',')]
    pub group_by: Vec<String>,

    /// Numeric fields (default: every available field).
    #[arg(long = "fields", value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Metrics to compute (default: count, mean, median).
    #[arg(long = "metrics", value_delimiter = ',')]
    pub metrics: Vec<Metric>,

    /// Outlier detection method.
    #[arg(long = "method", default_value = "IQR")]
    pub method: OutlierMethod,

    /// Keep outliers.
    #[arg(long = "keep-outliers")]
    pub keep_outliers: bool,

    /// Detect outliers on the raw values instead of their square roots.
    #[arg(long = "no-sqrt")]
    pub no_sqrt: bool,

    /// Minimum number of values for a group or field to be reported.
    #[arg(long = "min-count", default_value_t = 4)]
    pub min_count: usize,

    /// Include products whose scaling factor is estimated.
    #[arg(long = "include-estimated")]
    pub include_estimated: bool,

    /// Also write the statistics table as CSV.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct EpdxArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output JSON file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TableFormatArg {
    Csv,
    Json,
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
    Text,
    Json,
}
