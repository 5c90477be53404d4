//! Run configuration shared (read-only) by every scenario.

use crate::browser::BrowserConfig;
use crate::driver::DriverKind;
use crate::result::{E2eError, E2eResult};
use crate::wait::{WaitOptions, DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default storefront URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Bounded waits, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Ordinary element waits
    pub command_ms: u64,
    /// Product grid on a listing page
    pub grid_ms: u64,
    /// Requisition list form fields and save button
    pub form_ms: u64,
    /// PDP alert after a redirect
    pub alert_ms: u64,
    /// How long an unchanged URL is watched after a simple-product add
    pub settle_ms: u64,
    /// Interval between probes
    pub poll_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            grid_ms: 10_000,
            form_ms: 10_000,
            alert_ms: 5_000,
            settle_ms: 2_000,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Timeouts {
    /// Millisecond-scale timeouts for the in-memory storefront
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            command_ms: 200,
            grid_ms: 200,
            form_ms: 200,
            alert_ms: 200,
            settle_ms: 20,
            poll_ms: 2,
        }
    }

    /// Wait options for a given timeout
    #[must_use]
    pub const fn wait(&self, timeout_ms: u64) -> WaitOptions {
        WaitOptions {
            timeout_ms,
            poll_interval_ms: self.poll_ms,
        }
    }

    /// Wait options for ordinary commands
    #[must_use]
    pub const fn command(&self) -> WaitOptions {
        self.wait(self.command_ms)
    }

    /// Grid timeout as a duration
    #[must_use]
    pub const fn grid(&self) -> Duration {
        Duration::from_millis(self.grid_ms)
    }

    /// Form timeout as a duration
    #[must_use]
    pub const fn form(&self) -> Duration {
        Duration::from_millis(self.form_ms)
    }

    /// Alert timeout as a duration
    #[must_use]
    pub const fn alert(&self) -> Duration {
        Duration::from_millis(self.alert_ms)
    }

    /// Settle window as a duration
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Configuration for a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Storefront root URL, without trailing slash
    pub base_url: String,
    /// Driver implementation
    pub driver: DriverKind,
    /// Bounded waits
    pub timeouts: Timeouts,
    /// Chromium settings
    pub browser: BrowserConfig,
    /// Scenarios run concurrently
    pub jobs: usize,
    /// Skip remaining scenarios after the first failure
    pub fail_fast: bool,
    /// Capture a PNG when a scenario fails
    pub screenshot_on_failure: bool,
    /// Where screenshots and `results.json` go
    pub output_dir: PathBuf,
    /// Directory holding `userInfo.json`; bundled fixture when `None`
    pub fixtures_dir: Option<PathBuf>,
    /// Registry overrides: semantic name to CSS
    pub selectors: BTreeMap<String, String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            driver: DriverKind::default(),
            timeouts: Timeouts::default(),
            browser: BrowserConfig::default(),
            jobs: 1,
            fail_fast: false,
            screenshot_on_failure: true,
            output_dir: PathBuf::from("target/reqlist-e2e"),
            fixtures_dir: None,
            selectors: BTreeMap::new(),
        }
    }
}

impl RunConfig {
    /// Parse a YAML document; absent keys keep their defaults
    pub fn from_yaml(text: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()
    }

    /// Load a YAML file
    pub fn load(path: &Path) -> E2eResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| E2eError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_yaml(&text)
    }

    /// Set the storefront URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the driver
    #[must_use]
    pub const fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    /// Set the timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set concurrency
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enable fail-fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Check invariants and normalise the base URL
    pub fn validate(mut self) -> E2eResult<Self> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config {
                message: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if self.jobs == 0 {
            return Err(E2eError::Config {
                message: "jobs must be at least 1".to_string(),
            });
        }
        if self.timeouts.poll_ms == 0 {
            return Err(E2eError::Config {
                message: "timeouts.poll_ms must be positive".to_string(),
            });
        }
        Ok(self)
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod timeouts_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let t = Timeouts::default();
            assert_eq!(t.command_ms, 4_000);
            assert_eq!(t.grid(), Duration::from_secs(10));
            assert_eq!(t.settle(), Duration::from_secs(2));
            assert_eq!(t.command().poll_interval_ms, 50);
        }

        #[test]
        fn test_wait_uses_poll_interval() {
            let t = Timeouts::fast();
            let opts = t.wait(123);
            assert_eq!(opts.timeout_ms, 123);
            assert_eq!(opts.poll_interval_ms, t.poll_ms);
        }
    }

    mod run_config_tests {
        use super::*;

        #[test]
        fn test_partial_yaml() {
            let config = RunConfig::from_yaml(
                "base_url: https://shop.test/\njobs: 2\ntimeouts:\n  grid_ms: 15000\n",
            )
            .unwrap();
            assert_eq!(config.base_url, "https://shop.test");
            assert_eq!(config.jobs, 2);
            assert_eq!(config.timeouts.grid_ms, 15_000);
            assert_eq!(config.timeouts.alert_ms, 5_000);
            assert!(config.screenshot_on_failure);
        }

        #[test]
        fn test_selector_overrides_parse() {
            let config =
                RunConfig::from_yaml("selectors:\n  navDrop: \".mega-menu\"\n").unwrap();
            assert_eq!(config.selectors["navDrop"], ".mega-menu");
        }

        #[test]
        fn test_rejects_non_http_base_url() {
            let err = RunConfig::from_yaml("base_url: ftp://shop\n").unwrap_err();
            assert!(matches!(err, E2eError::Config { .. }));
        }

        #[test]
        fn test_rejects_zero_jobs() {
            assert!(RunConfig::default().with_jobs(0).validate().is_err());
        }

        #[test]
        fn test_type_mismatch_is_yaml_error() {
            let err = RunConfig::from_yaml("jobs: many\n").unwrap_err();
            assert!(matches!(err, E2eError::Yaml(_)));
        }

        #[test]
        fn test_url_join() {
            let config = RunConfig::default().with_base_url("https://shop.test");
            assert_eq!(config.url("/customer/create"), "https://shop.test/customer/create");
            assert_eq!(config.url("search?q=x"), "https://shop.test/search?q=x");
        }

        #[test]
        fn test_load_from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("reqlist-e2e.yaml");
            std::fs::write(&path, "driver: simulated\nfail_fast: true\n").unwrap();
            let config = RunConfig::load(&path).unwrap();
            assert_eq!(config.driver, DriverKind::Simulated);
            assert!(config.fail_fast);
        }

        #[test]
        fn test_load_missing_file_is_config_error() {
            let err = RunConfig::load(Path::new("/nonexistent/reqlist.yaml")).unwrap_err();
            assert!(matches!(err, E2eError::Config { .. }));
        }
    }
}
