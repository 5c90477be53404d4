//! Result and error types for the requisition-list suite.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for suite operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum E2eError {
    /// Browser executable not found
    #[error("Browser not found. Install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error (script evaluation, element interaction)
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// An element never reached the expected state within its timeout
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// What was waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// An expected value was not observed
    #[error("Assertion failed: expected {expected}, got {actual}")]
    AssertionFailed {
        /// Expected value or state
        expected: String,
        /// Last observed value or state
        actual: String,
    },

    /// Sign-up or authentication did not complete
    #[error("Setup failed during {step}: {source}")]
    SetupFailed {
        /// Setup step that failed
        step: String,
        /// Underlying failure
        #[source]
        source: Box<E2eError>,
    },

    /// Semantic selector name missing from the registry
    #[error("Unknown selector name: {name}")]
    UnknownSelector {
        /// Requested name
        name: String,
    },

    /// Scenario state machine violation
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidState {
        /// Current state
        from: String,
        /// Requested state
        to: String,
    },

    /// Fixture could not be loaded
    #[error("Fixture error: {message}")]
    FixtureError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Coarse failure classification used in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected value not observed
    Assertion,
    /// Element never reached the expected state
    Timeout,
    /// Sign-up/authentication precondition failed
    Setup,
    /// Browser, config, fixture or state-machine problem
    Infrastructure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Assertion => "assertion",
            Self::Timeout => "timeout",
            Self::Setup => "setup",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(s)
    }
}

/// CDP messages raised while a navigation replaces the execution context
const TRANSIENT_PAGE_ERRORS: &[&str] = &[
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Inspected target navigated or closed",
];

impl E2eError {
    /// Create a timeout error
    #[must_use]
    pub fn timeout(waited_for: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            waited_for: waited_for.into(),
            ms,
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::AssertionFailed {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Wrap an error as a setup failure
    #[must_use]
    pub fn setup(step: impl Into<String>, source: Self) -> Self {
        Self::SetupFailed {
            step: step.into(),
            source: Box::new(source),
        }
    }

    /// Whether a page error comes from a navigation swapping out the
    /// document mid-evaluation; the next evaluation lands in the new page
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::PageError { message } => TRANSIENT_PAGE_ERRORS
                .iter()
                .any(|needle| message.contains(needle)),
            _ => false,
        }
    }

    /// Classify this error for reporting
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::AssertionFailed { .. } => FailureKind::Assertion,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::SetupFailed { .. } => FailureKind::Setup,
            _ => FailureKind::Infrastructure,
        }
    }
}
