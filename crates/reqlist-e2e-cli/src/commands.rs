//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqlist_e2e::DriverKind;
use std::path::PathBuf;

/// reqlist-e2e: browser-driven requisition-list redirect scenarios
#[derive(Parser, Debug)]
#[command(name = "reqlist-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against a storefront
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),

    /// Print the effective selector registry
    Selectors(SelectorsArgs),
}

/// Scenario selection shared by `run` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Only scenarios whose id or title contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only scenarios carrying this tag (leading '@' optional)
    #[arg(short, long)]
    pub tag: Option<String>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Storefront root URL
    #[arg(long, env = "REQLIST_E2E_BASE_URL")]
    pub base_url: Option<String>,

    /// YAML configuration file (defaults to ./reqlist-e2e.yaml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding userInfo.json
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Scenarios run concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip remaining scenarios after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Driver implementation
    #[arg(long)]
    pub driver: Option<DriverArg>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the chromium binary
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Do not capture screenshots on failure
    #[arg(long)]
    pub no_screenshots: bool,

    /// Result format on stdout
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Output directory for results.json and screenshots
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Arguments for the selectors command
#[derive(Args, Debug, Clone, Default)]
pub struct SelectorsArgs {
    /// YAML configuration file whose overrides apply
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print as a `selectors:` YAML block
    #[arg(long)]
    pub yaml: bool,
}

/// Driver argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverArg {
    /// Real Chromium over CDP
    Chromium,
    /// In-memory storefront model
    Simulated,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Chromium => Self::Chromium,
            DriverArg::Simulated => Self::Simulated,
        }
    }
}

/// Result format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
    /// TAP (Test Anything Protocol)
    Tap,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
            FormatArg::Tap => Self::Tap,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
