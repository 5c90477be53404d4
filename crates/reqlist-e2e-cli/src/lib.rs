//! reqlist-e2e CLI library
//!
//! Command surface, configuration layering and reporting for the
//! requisition-list redirect suite.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, DriverArg, FormatArg, ListArgs, RunArgs, SelectionArgs,
    SelectorsArgs,
};
pub use config::{
    apply_run_args, config_file, load_base, CliConfig, ColorChoice, Verbosity,
    DEFAULT_CONFIG_FILE,
};
pub use error::{CliError, CliResult};
pub use output::{
    render, render_scenarios, render_selectors, render_tap, OutputFormat, ProgressReporter,
};
pub use runner::SuiteRunner;
