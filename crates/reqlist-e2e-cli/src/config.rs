//! CLI configuration and run-config layering

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use reqlist_e2e::RunConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file picked up from the working directory when `--config`
/// is absent
pub const DEFAULT_CONFIG_FILE: &str = "reqlist-e2e.yaml";

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info,reqlist_e2e=info",
            Self::Debug => "info,reqlist_e2e=debug,reqlist_e2e_cli=debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => stderr_is_terminal(),
        }
    }
}

/// Progress and summaries go to stderr
fn stderr_is_terminal() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

/// Configuration file to read: the explicit one, or the default file when
/// it exists in `cwd`
#[must_use]
pub fn config_file(explicit: Option<&Path>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let fallback = cwd.join(DEFAULT_CONFIG_FILE);
    fallback.is_file().then_some(fallback)
}

/// Load the base layer: defaults, overlaid by a YAML file when one applies.
///
/// An explicit `--config` that names no file is a configuration error.
pub fn load_base(explicit: Option<&Path>) -> CliResult<RunConfig> {
    if let Some(path) = explicit.filter(|p| !p.is_file()) {
        return Err(CliError::config(format!(
            "config file {} not found",
            path.display()
        )));
    }
    let cwd = std::env::current_dir()?;
    match config_file(explicit, &cwd) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration file");
            Ok(RunConfig::load(&path)?)
        }
        None => Ok(RunConfig::default()),
    }
}

/// Overlay `run` flags (and the environment values clap folded into them)
/// on `base`, then validate
pub fn apply_run_args(mut config: RunConfig, args: &RunArgs) -> CliResult<RunConfig> {
    if let Some(url) = &args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(dir) = &args.fixtures {
        config.fixtures_dir = Some(dir.clone());
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if args.fail_fast {
        config.fail_fast = true;
    }
    if let Some(driver) = args.driver {
        config.driver = driver.into();
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(path) = &args.chromium_path {
        config.browser.chromium_path = Some(path.clone());
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    if args.no_screenshots {
        config.screenshot_on_failure = false;
    }
    if let Some(dir) = &args.output {
        config.output_dir.clone_from(dir);
    }
    Ok(config.validate()?)
}
