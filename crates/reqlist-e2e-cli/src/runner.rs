//! Suite runner behind the `run` command

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render, OutputFormat, ProgressReporter};
use reqlist_e2e::{scenario, RunConfig, ScenarioRunner, SuiteResults};
use std::time::Duration;

/// Runs the selected scenarios and reports them
#[derive(Debug)]
pub struct SuiteRunner {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl SuiteRunner {
    /// Create a new suite runner
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run the scenarios `filter` and `tag` select under `run_config`.
    ///
    /// Writes `results.json` into the output directory and prints results in
    /// `format`. Fails with [`CliError::ScenariosFailed`] unless every
    /// selected scenario passed.
    pub fn run(
        &mut self,
        run_config: RunConfig,
        filter: Option<&str>,
        tag: Option<&str>,
        format: OutputFormat,
    ) -> CliResult<SuiteResults> {
        let scenarios = scenario::select(filter, tag);
        if scenarios.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches filter {filter:?} and tag {tag:?}"
            )));
        }

        let runner = ScenarioRunner::from_config(run_config)?;
        let output_dir = runner.config().output_dir.clone();

        self.reporter.header(scenario::SUITE_NAME);
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!(
                "{} driver against {}",
                runner.config().driver,
                runner.config().base_url
            ));
        }
        self.reporter
            .start_progress(scenarios.len() as u64, "running scenarios");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let reporter = &self.reporter;
        let results =
            runtime.block_on(runner.run_with(scenarios, |result| reporter.scenario(result)))?;
        self.reporter.finish();

        let path = results.write_json(&output_dir)?;
        self.reporter.info(&format!(
            "started {}, results written to {}",
            results
                .started_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S"),
            path.display()
        ));

        if let Some(document) = render(&results, format)? {
            println!("{document}");
        }
        self.reporter.summary(
            results.passed_count(),
            results.failed_count(),
            results.skipped_count(),
            Duration::from_millis(results.duration_ms),
        );

        if results.all_passed() {
            Ok(results)
        } else {
            Err(CliError::ScenariosFailed {
                failed: results.failed_count(),
                skipped: results.skipped_count(),
            })
        }
    }

    /// Get the reporter (for testing)
    #[must_use]
    pub const fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorChoice, Verbosity};
    use reqlist_e2e::{DriverKind, Timeouts, RESULTS_FILE};

    fn quiet_runner() -> SuiteRunner {
        SuiteRunner::new(
            CliConfig::new()
                .with_verbosity(Verbosity::Quiet)
                .with_color(ColorChoice::Never),
        )
    }

    fn simulated(dir: &std::path::Path) -> RunConfig {
        RunConfig::default()
            .with_driver(DriverKind::Simulated)
            .with_timeouts(Timeouts::fast())
            .with_output_dir(dir)
    }

    #[test]
    fn test_new_runner_respects_quiet() {
        let runner = quiet_runner();
        assert!(runner.reporter().quiet);
        assert!(!runner.reporter().use_color);
    }

    #[test]
    fn test_simulated_run_passes_and_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let results = quiet_runner()
            .run(simulated(dir.path()), None, None, OutputFormat::Text)
            .unwrap();
        assert_eq!(results.total(), 4);
        assert!(dir.path().join(RESULTS_FILE).is_file());
    }

    #[test]
    fn test_empty_selection_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let err = quiet_runner()
            .run(
                simulated(dir.path()),
                Some("checkout"),
                None,
                OutputFormat::Text,
            )
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_invalid_config_surfaces_library_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = quiet_runner()
            .run(
                simulated(dir.path()).with_base_url("ftp://nope"),
                None,
                None,
                OutputFormat::Json,
            )
            .unwrap_err();
        assert!(matches!(err, CliError::E2e(_)));
    }
}
