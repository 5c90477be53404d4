//! Suite harness: runs scenarios against fresh driver sessions.
//!
//! Each scenario gets its own driver from the [`DriverFactory`] and its own
//! freshly provisioned shopper; scenarios share only the immutable registry
//! and config. With `jobs > 1` up to that many run at once. With fail-fast,
//! scenarios that have not started when the first failure lands are
//! reported as skipped.

use crate::browser::ChromiumFactory;
use crate::config::RunConfig;
use crate::driver::{DriverFactory, DriverKind};
use crate::fixture::{FixtureStore, SignUpInfo};
use crate::provisioning::provision;
use crate::result::{E2eResult, FailureKind};
use crate::scenario::{Scenario, SUITE_NAME};
use crate::selectors::SelectorRegistry;
use crate::session::{Session, StepRecord};
use crate::simulated::SimulatedFactory;
use crate::state::ScenarioState;
use crate::storefront::{ExpectedOutcome, ProductSource};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// File name of the machine-readable summary
pub const RESULTS_FILE: &str = "results.json";

/// Final status of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Outcome verified
    Passed,
    /// A step failed
    Failed,
    /// Not started because of fail-fast
    Skipped,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario identifier
    pub id: String,
    /// Scenario title
    pub name: String,
    /// Scenario tags
    pub tags: Vec<String>,
    /// Final status
    pub status: TestStatus,
    /// Error class when failed
    pub failure_kind: Option<FailureKind>,
    /// Error message when failed
    pub error: Option<String>,
    /// Journey state at the end
    pub final_state: ScenarioState,
    /// Listing heuristic relied on for product kind
    pub product_source: ProductSource,
    /// Outcome asserted
    pub expected_outcome: ExpectedOutcome,
    /// Shopper signed up for this scenario
    pub user_email: Option<String>,
    /// Step log
    pub steps: Vec<StepRecord>,
    /// Failure screenshot, if one was captured
    pub screenshot: Option<PathBuf>,
    /// Wall time
    pub duration_ms: u64,
}

impl ScenarioResult {
    fn new(scenario: &dyn Scenario, status: TestStatus) -> Self {
        Self {
            id: scenario.id().to_string(),
            name: scenario.name().to_string(),
            tags: scenario.tags().iter().map(|t| (*t).to_string()).collect(),
            status,
            failure_kind: None,
            error: None,
            final_state: ScenarioState::default(),
            product_source: scenario.source(),
            expected_outcome: scenario.expected(),
            user_email: None,
            steps: Vec::new(),
            screenshot: None,
            duration_ms: 0,
        }
    }

    /// Result for a scenario that never started
    #[must_use]
    pub fn skipped(scenario: &dyn Scenario) -> Self {
        Self::new(scenario, TestStatus::Skipped)
    }

    /// Whether the scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Results from running a suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// Suite title
    pub suite_name: String,
    /// Driver used
    pub driver: String,
    /// Storefront under test
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end
    pub finished_at: DateTime<Utc>,
    /// Wall time
    pub duration_ms: u64,
    /// Per-scenario results, in suite order
    pub results: Vec<ScenarioResult>,
}

impl SuiteResults {
    /// Whether every selected scenario passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ScenarioResult::passed)
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.count(TestStatus::Passed)
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(TestStatus::Failed)
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(TestStatus::Skipped)
    }

    fn count(&self, status: TestStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .collect()
    }

    /// Write `results.json` into `dir`
    pub fn write_json(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(RESULTS_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

/// Runs scenarios, one fresh driver session each
pub struct ScenarioRunner {
    factory: Arc<dyn DriverFactory>,
    registry: Arc<SelectorRegistry>,
    config: Arc<RunConfig>,
    fixtures: FixtureStore,
}

impl std::fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("driver", &self.factory.name())
            .field("base_url", &self.config.base_url)
            .field("jobs", &self.config.jobs)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Runner with an explicit factory
    #[must_use]
    pub fn new(
        factory: Arc<dyn DriverFactory>,
        registry: Arc<SelectorRegistry>,
        config: Arc<RunConfig>,
    ) -> Self {
        let fixtures = config
            .fixtures_dir
            .as_ref()
            .map_or_else(FixtureStore::bundled, FixtureStore::from_dir);
        Self {
            factory,
            registry,
            config,
            fixtures,
        }
    }

    /// Runner whose registry and driver come from `config`
    pub fn from_config(config: RunConfig) -> E2eResult<Self> {
        let config = Arc::new(config.validate()?);
        let registry = Arc::new(SelectorRegistry::new().with_overrides(&config.selectors)?);
        let factory: Arc<dyn DriverFactory> = match config.driver {
            DriverKind::Chromium => Arc::new(ChromiumFactory::new(config.browser.clone())),
            DriverKind::Simulated => Arc::new(SimulatedFactory::new(
                config.base_url.clone(),
                Arc::clone(&registry),
            )),
        };
        Ok(Self::new(factory, registry, config))
    }

    /// Effective configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Effective selector registry
    #[must_use]
    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Run the scenarios and collect results
    pub async fn run(&self, scenarios: Vec<Arc<dyn Scenario>>) -> E2eResult<SuiteResults> {
        self.run_with(scenarios, |_| {}).await
    }

    /// Run the scenarios, reporting each result as it completes
    pub async fn run_with<F>(
        &self,
        scenarios: Vec<Arc<dyn Scenario>>,
        mut on_result: F,
    ) -> E2eResult<SuiteResults>
    where
        F: FnMut(&ScenarioResult),
    {
        let user = self.fixtures.user_info()?.sign_up;
        let started_at = Utc::now();
        let clock = Instant::now();
        let failed = AtomicBool::new(false);
        tracing::info!(
            suite = SUITE_NAME,
            driver = self.factory.name(),
            scenarios = scenarios.len(),
            jobs = self.config.jobs,
            "suite started"
        );

        let mut indexed: Vec<(usize, ScenarioResult)> = Vec::with_capacity(scenarios.len());
        {
            let failed = &failed;
            let user = &user;
            let mut pending = stream::iter(scenarios.iter().enumerate())
                .map(|(index, scenario)| async move {
                    let result = if self.config.fail_fast && failed.load(Ordering::SeqCst) {
                        ScenarioResult::skipped(scenario.as_ref())
                    } else {
                        self.run_one(scenario.as_ref(), user).await
                    };
                    if result.status == TestStatus::Failed {
                        failed.store(true, Ordering::SeqCst);
                    }
                    (index, result)
                })
                .buffer_unordered(self.config.jobs.max(1));
            while let Some((index, result)) = pending.next().await {
                on_result(&result);
                indexed.push((index, result));
            }
        }
        indexed.sort_by_key(|(index, _)| *index);

        let results = SuiteResults {
            suite_name: SUITE_NAME.to_string(),
            driver: self.factory.name().to_string(),
            base_url: self.config.base_url.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: clock.elapsed().as_millis() as u64,
            results: indexed.into_iter().map(|(_, r)| r).collect(),
        };
        tracing::info!(
            passed = results.passed_count(),
            failed = results.failed_count(),
            skipped = results.skipped_count(),
            "suite finished"
        );
        Ok(results)
    }

    /// Run one scenario on a fresh session
    pub async fn run_one(&self, scenario: &dyn Scenario, base_user: &SignUpInfo) -> ScenarioResult {
        let span = tracing::info_span!("scenario", id = scenario.id());
        self.run_one_inner(scenario, base_user).instrument(span).await
    }

    async fn run_one_inner(&self, scenario: &dyn Scenario, base_user: &SignUpInfo) -> ScenarioResult {
        let clock = Instant::now();
        let mut result = ScenarioResult::new(scenario, TestStatus::Failed);
        let user = base_user.with_unique_email();
        result.user_email = Some(user.email.clone());
        tracing::info!(name = scenario.name(), source = %scenario.source(), "scenario started");

        let driver = match self.factory.open().await {
            Ok(driver) => driver,
            Err(e) => {
                tracing::warn!(error = %e, "could not open driver session");
                result.failure_kind = Some(e.kind());
                result.error = Some(e.to_string());
                result.duration_ms = clock.elapsed().as_millis() as u64;
                return result;
            }
        };
        let mut session = Session::new(driver, Arc::clone(&self.registry), Arc::clone(&self.config));

        let outcome = async {
            provision(&mut session, &user).await?;
            scenario.run(&mut session).await?;
            session.advance(ScenarioState::OutcomeVerified)
        }
        .await;

        match outcome {
            Ok(()) => {
                result.status = TestStatus::Passed;
                tracing::info!("scenario passed");
            }
            Err(e) => {
                session.fail();
                tracing::warn!(kind = %e.kind(), error = %e, "scenario failed");
                result.failure_kind = Some(e.kind());
                result.error = Some(e.to_string());
                result.screenshot = self.capture_failure(&session, scenario.id()).await;
            }
        }

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "closing driver session failed");
        }
        result.final_state = session.state();
        result.steps = session.take_steps();
        result.duration_ms = clock.elapsed().as_millis() as u64;
        result
    }

    async fn capture_failure(&self, session: &Session, id: &str) -> Option<PathBuf> {
        if !self.config.screenshot_on_failure {
            return None;
        }
        let png = match session.screenshot().await {
            Ok(png) if !png.is_empty() => png,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "screenshot failed");
                return None;
            }
        };
        let dir = self.config.output_dir.join("screenshots");
        let path = dir.join(format!("{id}-{}.png", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
        let written = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => tokio::fs::write(&path, png).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "failure screenshot saved");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save screenshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::suite;

    fn sample_results(statuses: &[TestStatus]) -> SuiteResults {
        let scenarios = suite();
        SuiteResults {
            suite_name: SUITE_NAME.to_string(),
            driver: "simulated".to_string(),
            base_url: "http://storefront.test".to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 5,
            results: statuses
                .iter()
                .zip(scenarios.iter())
                .map(|(status, s)| ScenarioResult::new(s.as_ref(), *status))
                .collect(),
        }
    }

    mod suite_results_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let results = sample_results(&[
                TestStatus::Passed,
                TestStatus::Failed,
                TestStatus::Skipped,
            ]);
            assert_eq!(results.total(), 3);
            assert_eq!(results.passed_count(), 1);
            assert_eq!(results.failed_count(), 1);
            assert_eq!(results.skipped_count(), 1);
            assert_eq!(results.failures().len(), 1);
            assert!(!results.all_passed());
        }

        #[test]
        fn test_skipped_is_not_passed() {
            let results = sample_results(&[TestStatus::Passed, TestStatus::Skipped]);
            assert!(!results.all_passed());
        }

        #[test]
        fn test_write_json() {
            let dir = tempfile::tempdir().unwrap();
            let results = sample_results(&[TestStatus::Passed]);
            let path = results.write_json(&dir.path().join("out")).unwrap();
            let text = std::fs::read_to_string(path).unwrap();
            let json: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(json["results"][0]["status"], "passed");
            assert_eq!(json["results"][0]["product_source"]["via"], "search");
            assert_eq!(json["suite_name"], SUITE_NAME);
        }
    }

    mod runner_tests {
        use super::*;

        #[test]
        fn test_from_config_rejects_unknown_selector_override() {
            let mut config = RunConfig::default().with_driver(DriverKind::Simulated);
            config
                .selectors
                .insert("checkoutButton".to_string(), ".checkout".to_string());
            assert!(ScenarioRunner::from_config(config).is_err());
        }

        #[test]
        fn test_from_config_applies_overrides() {
            let mut config = RunConfig::default().with_driver(DriverKind::Simulated);
            config
                .selectors
                .insert("navDrop".to_string(), ".mega-menu".to_string());
            let runner = ScenarioRunner::from_config(config).unwrap();
            assert_eq!(runner.registry().css("navDrop").unwrap(), ".mega-menu");
        }
    }

    mod screenshot_tests {
        use super::*;
        use crate::driver::PageDriver;
        use crate::locator::Selector;
        use crate::result::E2eError;
        use async_trait::async_trait;

        const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

        /// A page that can only be photographed
        struct Camera;

        fn unsupported<T>() -> E2eResult<T> {
            Err(E2eError::page("not supported"))
        }

        #[async_trait]
        impl PageDriver for Camera {
            async fn goto(&mut self, _url: &str) -> E2eResult<()> {
                unsupported()
            }
            async fn current_url(&self) -> E2eResult<String> {
                Ok("about:blank".to_string())
            }
            async fn count(&self, _selector: &Selector) -> E2eResult<usize> {
                Ok(0)
            }
            async fn is_visible(&self, _selector: &Selector) -> E2eResult<bool> {
                Ok(false)
            }
            async fn is_enabled(&self, _selector: &Selector) -> E2eResult<Option<bool>> {
                Ok(None)
            }
            async fn text_content(&self, _selector: &Selector) -> E2eResult<Option<String>> {
                Ok(None)
            }
            async fn click(&mut self, _selector: &Selector) -> E2eResult<()> {
                unsupported()
            }
            async fn hover(&mut self, _selector: &Selector) -> E2eResult<()> {
                unsupported()
            }
            async fn type_text(&mut self, _selector: &Selector, _text: &str) -> E2eResult<()> {
                unsupported()
            }
            async fn option_labels(&self, _selector: &Selector) -> E2eResult<Option<Vec<String>>> {
                Ok(None)
            }
            async fn select_option(&mut self, _selector: &Selector, _label: &str) -> E2eResult<()> {
                unsupported()
            }
            async fn scroll_into_view(&mut self, _selector: &Selector) -> E2eResult<()> {
                unsupported()
            }
            async fn screenshot(&self) -> E2eResult<Vec<u8>> {
                Ok(PNG.to_vec())
            }
            async fn close(&mut self) -> E2eResult<()> {
                Ok(())
            }
        }

        fn runner_and_session(config: RunConfig) -> (ScenarioRunner, Session) {
            let registry = Arc::new(SelectorRegistry::new());
            let config = Arc::new(config);
            let factory = Arc::new(SimulatedFactory::new(
                config.base_url.clone(),
                Arc::clone(&registry),
            ));
            let session = Session::new(Box::new(Camera), Arc::clone(&registry), Arc::clone(&config));
            (ScenarioRunner::new(factory, registry, config), session)
        }

        #[tokio::test]
        async fn test_failure_screenshot_is_written() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("out");
            let (runner, session) = runner_and_session(RunConfig::default().with_output_dir(&out));
            let path = runner
                .capture_failure(&session, "complex-new-list")
                .await
                .unwrap();
            assert!(path.starts_with(out.join("screenshots")));
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("complex-new-list-"));
            assert!(name.ends_with(".png"));
            assert_eq!(tokio::fs::read(&path).await.unwrap(), PNG);
        }

        #[tokio::test]
        async fn test_screenshots_disabled() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = RunConfig::default().with_output_dir(dir.path());
            config.screenshot_on_failure = false;
            let (runner, session) = runner_and_session(config);
            assert!(runner.capture_failure(&session, "simple").await.is_none());
            assert!(!dir.path().join("screenshots").exists());
        }
    }
}
