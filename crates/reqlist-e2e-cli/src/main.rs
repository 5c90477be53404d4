//! reqlist-e2e: run requisition-list redirect scenarios
//!
//! ## Usage
//!
//! ```bash
//! reqlist-e2e run --base-url https://shop.example   # Run the suite in Chromium
//! reqlist-e2e run --driver simulated --format tap   # Dry run against the model
//! reqlist-e2e list --filter complex                 # Show selected scenarios
//! reqlist-e2e selectors --yaml                      # Dump the selector registry
//! ```

use clap::Parser;
use reqlist_e2e::{scenario, SelectorRegistry};
use reqlist_e2e_cli::{
    apply_run_args, load_base, render_scenarios, render_selectors, Cli, CliConfig, CliError,
    CliResult, ColorChoice, Commands, ListArgs, RunArgs, SelectorsArgs, SuiteRunner, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        // the summary already said so
        Err(CliError::ScenariosFailed { .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => run_suite(config, &args),
        Commands::List(args) => {
            run_list(&args);
            Ok(())
        }
        Commands::Selectors(args) => run_selectors(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

/// `RUST_LOG` wins; otherwise the level follows `-q`/`-v`
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
    if let Err(e) = installed {
        eprintln!("Warning: logging disabled: {e}");
    }
}

fn run_suite(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let base = load_base(args.config.as_deref())?;
    let run_config = apply_run_args(base, args)?;
    tracing::debug!(?run_config, "effective configuration");

    let mut runner = SuiteRunner::new(config);
    runner.run(
        run_config,
        args.selection.filter.as_deref(),
        args.selection.tag.as_deref(),
        args.format.into(),
    )?;
    Ok(())
}

fn run_list(args: &ListArgs) {
    let selected = scenario::select(args.selection.filter.as_deref(), args.selection.tag.as_deref());
    print!("{}", render_scenarios(&selected));
}

fn run_selectors(args: &SelectorsArgs) -> CliResult<()> {
    let base = load_base(args.config.as_deref())?;
    let registry = SelectorRegistry::new().with_overrides(&base.selectors)?;
    print!("{}", render_selectors(&registry, args.yaml)?);
    Ok(())
}
