//! Scenario session: the context handle threaded through every step.
//!
//! A [`Session`] owns one driver, borrows the shared registry and config,
//! tracks the journey [`ScenarioState`] and keeps a step log. Every action
//! waits (bounded) for its target first; every `expect_*` polls until it
//! holds or its timeout runs out. Nothing is retried after a failure.
//!
//! Failure classification:
//! - an element that never shows up is a [`Timeout`](E2eError::Timeout)
//! - an element or URL that shows up with the wrong value is an
//!   [`AssertionFailed`](E2eError::AssertionFailed)

use crate::config::RunConfig;
use crate::driver::PageDriver;
use crate::locator::{Locator, Selector};
use crate::result::{E2eError, E2eResult};
use crate::selectors::SelectorRegistry;
use crate::state::ScenarioState;
use crate::wait::{hold_steady, poll_until, PollTimeout, Probe, WaitOptions};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One entry in a scenario's step log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// What the step did
    pub description: String,
    /// Wall time spent
    pub duration_ms: u64,
    /// Whether it succeeded
    pub ok: bool,
}

/// Context handle for one scenario
pub struct Session {
    driver: Box<dyn PageDriver>,
    registry: Arc<SelectorRegistry>,
    config: Arc<RunConfig>,
    state: ScenarioState,
    steps: Vec<StepRecord>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("state", &self.state)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn timed_out(locator: &Locator, condition: &str, t: &PollTimeout) -> E2eError {
    E2eError::timeout(
        format!("{locator} to {condition} (last: {})", t.last_observed),
        millis(t.elapsed),
    )
}

impl Session {
    /// Wrap a freshly opened driver
    #[must_use]
    pub fn new(
        driver: Box<dyn PageDriver>,
        registry: Arc<SelectorRegistry>,
        config: Arc<RunConfig>,
    ) -> Self {
        Self {
            driver,
            registry,
            config,
            state: ScenarioState::default(),
            steps: Vec::new(),
        }
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Current journey state
    #[must_use]
    pub const fn state(&self) -> ScenarioState {
        self.state
    }

    /// Steps taken so far
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Take the step log
    pub fn take_steps(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.steps)
    }

    /// Locator for a registry name
    pub fn locate(&self, name: &str) -> E2eResult<Locator> {
        self.registry.locate(name)
    }

    /// Move the journey forward
    pub fn advance(&mut self, next: ScenarioState) -> E2eResult<()> {
        self.state = self.state.advance(next)?;
        tracing::debug!(state = %self.state, "scenario state");
        Ok(())
    }

    /// Mark the journey failed; no-op once terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = ScenarioState::Failed;
        }
    }

    fn record(&mut self, description: String, started: Instant, ok: bool) {
        let duration_ms = millis(started.elapsed());
        if ok {
            tracing::debug!(step = %description, duration_ms, "step ok");
        } else {
            tracing::warn!(step = %description, duration_ms, "step failed");
        }
        self.steps.push(StepRecord {
            description,
            duration_ms,
            ok,
        });
    }

    fn options_for(&self, locator: &Locator) -> WaitOptions {
        let timeouts = &self.config.timeouts;
        let default = Duration::from_millis(timeouts.command_ms);
        timeouts.wait(millis(locator.timeout_or(default)))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Load an application path
    pub async fn visit(&mut self, path: &str) -> E2eResult<()> {
        let started = Instant::now();
        let url = self.config.url(path);
        let result = self.driver.goto(&url).await;
        self.record(format!("visit {path}"), started, result.is_ok());
        result
    }

    /// Current absolute URL
    pub async fn url(&self) -> E2eResult<String> {
        self.driver.current_url().await
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    async fn wait_visible(&self, locator: &Locator) -> E2eResult<()> {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            if driver.is_visible(selector).await? {
                return Ok(Probe::Ready(()));
            }
            let n = driver.count(selector).await?;
            Ok(Probe::Pending(if n == 0 {
                "absent".to_string()
            } else {
                "hidden".to_string()
            }))
        })
        .await?;
        outcome
            .map(|_| ())
            .map_err(|t| timed_out(locator, "be visible", &t))
    }

    async fn wait_exists(&self, locator: &Locator) -> E2eResult<()> {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            Ok(if driver.count(selector).await? > 0 {
                Probe::Ready(())
            } else {
                Probe::Pending("absent".to_string())
            })
        })
        .await?;
        outcome
            .map(|_| ())
            .map_err(|t| timed_out(locator, "exist", &t))
    }

    async fn wait_enabled(&self, locator: &Locator) -> E2eResult<()> {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            Ok(match driver.is_enabled(selector).await? {
                Some(true) => Probe::Ready(()),
                Some(false) => Probe::Pending("disabled".to_string()),
                None => Probe::Pending("absent".to_string()),
            })
        })
        .await?;
        outcome
            .map(|_| ())
            .map_err(|t| timed_out(locator, "be enabled", &t))
    }

    async fn wait_option(&self, locator: &Locator, label: &str) -> E2eResult<()> {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            Ok(match driver.option_labels(selector).await? {
                Some(labels) if labels.iter().any(|l| l == label) => Probe::Ready(()),
                Some(labels) => Probe::Pending(format!("options {labels:?}")),
                None => Probe::Pending("absent".to_string()),
            })
        })
        .await?;
        outcome
            .map(|_| ())
            .map_err(|t| timed_out(locator, &format!("offer '{label}'"), &t))
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Click once the target is visible and enabled
    pub async fn click(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = async {
            self.wait_visible(locator).await?;
            self.wait_enabled(locator).await?;
            self.driver.click(locator.selector()).await
        }
        .await;
        self.record(format!("click {locator}"), started, result.is_ok());
        result
    }

    /// Hover once the target is visible
    pub async fn hover(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = async {
            self.wait_visible(locator).await?;
            self.driver.hover(locator.selector()).await
        }
        .await;
        self.record(format!("hover {locator}"), started, result.is_ok());
        result
    }

    /// Type into an input once it is visible
    pub async fn type_text(&mut self, locator: &Locator, text: &str) -> E2eResult<()> {
        let started = Instant::now();
        let result = async {
            self.wait_visible(locator).await?;
            self.driver.type_text(locator.selector(), text).await
        }
        .await;
        self.record(format!("type into {locator}"), started, result.is_ok());
        result
    }

    /// Choose `label` in a select once the option is offered
    pub async fn select_option(&mut self, locator: &Locator, label: &str) -> E2eResult<()> {
        let started = Instant::now();
        let result = async {
            self.wait_option(locator, label).await?;
            self.driver.select_option(locator.selector(), label).await
        }
        .await;
        self.record(
            format!("select '{label}' in {locator}"),
            started,
            result.is_ok(),
        );
        result
    }

    /// Scroll the target into view once it exists
    pub async fn scroll_into_view(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = async {
            self.wait_exists(locator).await?;
            self.driver.scroll_into_view(locator.selector()).await
        }
        .await;
        self.record(format!("scroll to {locator}"), started, result.is_ok());
        result
    }

    // ------------------------------------------------------------------
    // Expectations
    // ------------------------------------------------------------------

    /// The target exists within its timeout
    pub async fn expect_exists(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = self.wait_exists(locator).await;
        self.record(format!("expect {locator} exists"), started, result.is_ok());
        result
    }

    /// The target is visible within its timeout
    pub async fn expect_visible(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = self.wait_visible(locator).await;
        self.record(format!("expect {locator} visible"), started, result.is_ok());
        result
    }

    /// The target is enabled within its timeout
    pub async fn expect_enabled(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let result = self.wait_enabled(locator).await;
        self.record(format!("expect {locator} enabled"), started, result.is_ok());
        result
    }

    /// No element matches the target within its timeout
    pub async fn expect_not_exists(&mut self, locator: &Locator) -> E2eResult<()> {
        let started = Instant::now();
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            let n = driver.count(selector).await?;
            Ok(if n == 0 {
                Probe::Ready(())
            } else {
                Probe::Pending(format!("{n} present"))
            })
        })
        .await;
        let result = match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(t)) => Err(E2eError::assertion(
                format!("{locator} absent"),
                t.last_observed,
            )),
            Err(e) => Err(e),
        };
        self.record(format!("expect {locator} absent"), started, result.is_ok());
        result
    }

    /// Exactly `expected` elements match within the timeout
    pub async fn expect_count(&mut self, locator: &Locator, expected: usize) -> E2eResult<()> {
        let started = Instant::now();
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            let n = driver.count(selector).await?;
            Ok(if n == expected {
                Probe::Ready(())
            } else {
                Probe::Pending(n.to_string())
            })
        })
        .await;
        let result = match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(t)) => Err(E2eError::assertion(
                format!("{expected} x {locator}"),
                format!("{} x {locator}", t.last_observed),
            )),
            Err(e) => Err(e),
        };
        self.record(
            format!("expect {expected} x {locator}"),
            started,
            result.is_ok(),
        );
        result
    }

    async fn wait_text<P>(&self, locator: &Locator, condition: &str, accept: P) -> E2eResult<String>
    where
        P: Fn(&str) -> bool + Copy,
    {
        let driver = &*self.driver;
        let selector = locator.selector();
        let outcome = poll_until(&self.options_for(locator), move || async move {
            Ok(match driver.text_content(selector).await? {
                Some(text) if accept(&text) => Probe::Ready(text),
                Some(text) => Probe::Pending(text),
                None => Probe::Pending("absent".to_string()),
            })
        })
        .await?;
        match outcome {
            Ok(res) => Ok(res.value),
            Err(t) => match self.driver.text_content(selector).await? {
                None => Err(timed_out(locator, "exist", &t)),
                Some(text) => Err(E2eError::assertion(
                    format!("{locator} {condition}"),
                    format!("{text:?}"),
                )),
            },
        }
    }

    /// The target's text is non-blank
    pub async fn expect_not_empty(&mut self, locator: &Locator) -> E2eResult<String> {
        let started = Instant::now();
        let result = self
            .wait_text(locator, "to have text", |t| !t.trim().is_empty())
            .await;
        self.record(
            format!("expect {locator} not empty"),
            started,
            result.is_ok(),
        );
        result
    }

    /// The target's text matches `pattern`
    pub async fn expect_text_matches(
        &mut self,
        locator: &Locator,
        pattern: &Regex,
    ) -> E2eResult<String> {
        let started = Instant::now();
        let condition = format!("to match /{}/", pattern.as_str());
        let result = self
            .wait_text(locator, &condition, |t| pattern.is_match(t))
            .await;
        self.record(
            format!("expect {locator} {condition}"),
            started,
            result.is_ok(),
        );
        result
    }

    async fn wait_url<P>(&self, timeout: Duration, condition: &str, accept: P) -> E2eResult<String>
    where
        P: Fn(&str) -> bool + Copy,
    {
        let driver = &*self.driver;
        let opts = self.config.timeouts.wait(millis(timeout));
        let outcome = poll_until(&opts, move || async move {
            let url = driver.current_url().await?;
            Ok(if accept(&url) {
                Probe::Ready(url)
            } else {
                Probe::Pending(url)
            })
        })
        .await?;
        outcome
            .map(|res| res.value)
            .map_err(|t| E2eError::assertion(format!("URL {condition}"), t.last_observed))
    }

    /// The URL moves away from `before`
    pub async fn expect_url_changed(&mut self, before: &str, timeout: Duration) -> E2eResult<String> {
        let started = Instant::now();
        let result = self
            .wait_url(timeout, &format!("different from {before}"), |u| u != before)
            .await;
        self.record("expect URL changed".to_string(), started, result.is_ok());
        result
    }

    /// The URL contains `fragment`
    pub async fn expect_url_contains(
        &mut self,
        fragment: &str,
        timeout: Duration,
    ) -> E2eResult<String> {
        let started = Instant::now();
        let result = self
            .wait_url(timeout, &format!("containing '{fragment}'"), |u| {
                u.contains(fragment)
            })
            .await;
        self.record(
            format!("expect URL contains {fragment}"),
            started,
            result.is_ok(),
        );
        result
    }

    /// The URL stays exactly `before` for the whole `window`
    pub async fn expect_url_unchanged(&mut self, before: &str, window: Duration) -> E2eResult<()> {
        let started = Instant::now();
        let driver = &*self.driver;
        let poll = self.config.timeouts.wait(0).poll_interval();
        let held = hold_steady(window, poll, move || async move {
            let url = driver.current_url().await?;
            Ok(if url == before {
                Probe::Ready(())
            } else {
                Probe::Pending(url)
            })
        })
        .await;
        let result = match held {
            Ok(Ok(())) => Ok(()),
            Ok(Err(observed)) => Err(E2eError::assertion(before, observed)),
            Err(e) => Err(e),
        };
        self.record(
            format!("expect URL unchanged for {}ms", millis(window)),
            started,
            result.is_ok(),
        );
        result
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// PNG of the current page
    pub async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    /// Release the driver
    pub async fn close(&mut self) -> E2eResult<()> {
        self.driver.close().await
    }
}

/// Locator for an inline DOM-contract class
#[must_use]
pub fn dom_locator(css: &str) -> Locator {
    Locator::from_selector(Selector::css(css))
}
