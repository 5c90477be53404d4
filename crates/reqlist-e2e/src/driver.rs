//! PageDriver - Abstract Browser Automation Trait
//!
//! Scenarios never talk to a browser directly. They go through
//! [`PageDriver`], which has two implementations:
//!
//! - `ChromiumDriver` (feature `browser`): CDP via chromiumoxide
//! - [`SimulatedStorefront`](crate::SimulatedStorefront): an in-memory model
//!   of the storefront used by the crate's tests and `--driver simulated`
//!
//! A [`DriverFactory`] opens one fresh driver per scenario, so scenarios
//! never share browser state.

use crate::locator::Selector;
use crate::result::E2eResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Abstract driver trait for browser automation.
///
/// Query methods act on the first element matching the selector.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&mut self, url: &str) -> E2eResult<()>;

    /// Current absolute URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Number of matching elements
    async fn count(&self, selector: &Selector) -> E2eResult<usize>;

    /// Whether the first match is rendered and visible
    async fn is_visible(&self, selector: &Selector) -> E2eResult<bool>;

    /// Whether the first match is enabled; `None` when absent
    async fn is_enabled(&self, selector: &Selector) -> E2eResult<Option<bool>>;

    /// Text content of the first match; `None` when absent
    async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>>;

    /// Click the first match
    async fn click(&mut self, selector: &Selector) -> E2eResult<()>;

    /// Hover the first match (mouseenter)
    async fn hover(&mut self, selector: &Selector) -> E2eResult<()>;

    /// Append text to the first matching input
    async fn type_text(&mut self, selector: &Selector, text: &str) -> E2eResult<()>;

    /// Option labels of the first matching `<select>`; `None` when absent
    async fn option_labels(&self, selector: &Selector) -> E2eResult<Option<Vec<String>>>;

    /// Choose an option by label in the first matching `<select>`
    async fn select_option(&mut self, selector: &Selector, label: &str) -> E2eResult<()>;

    /// Scroll the first match into view
    async fn scroll_into_view(&mut self, selector: &Selector) -> E2eResult<()>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    /// Release the session
    async fn close(&mut self) -> E2eResult<()>;
}

/// Opens an independent driver session per scenario
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Open a fresh session
    async fn open(&self) -> E2eResult<Box<dyn PageDriver>>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Which driver implementation a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Real Chromium over CDP
    #[default]
    Chromium,
    /// In-memory storefront model
    Simulated,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chromium => f.write_str("chromium"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}

impl std::str::FromStr for DriverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Self::Chromium),
            "simulated" | "sim" => Ok(Self::Simulated),
            other => Err(format!("unknown driver '{other}' (expected chromium or simulated)")),
        }
    }
}
