//! Locator abstraction for element selection.
//!
//! A [`Selector`] describes *how* to find elements; a [`Locator`] pairs it
//! with a human-readable description and an optional timeout override.
//! Drivers that talk to a real page turn selectors into JavaScript through
//! the `*_script` methods; the simulated storefront matches them directly.
//!
//! Every query acts on the first match in document order, the same way a
//! `get(...).first()` chain does.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Deepest element whose text content includes the string
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
    /// CSS selector filtered by text content
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// Child selector scoped to the first match of a parent selector
    Within {
        /// Scope
        parent: Box<Selector>,
        /// Selector evaluated inside the scope
        child: Box<Selector>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Scope `child` to the first element matching `self`
    #[must_use]
    pub fn within(self, child: Self) -> Self {
        Self::Within {
            parent: Box::new(self),
            child: Box::new(child),
        }
    }

    /// JavaScript expression evaluating to an array of matches under `root`
    #[must_use]
    pub fn all_in(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({}))", js_str(s)),
            Self::TestId(id) => format!(
                "Array.from({root}.querySelectorAll({}))",
                js_str(&format!("[data-testid=\"{id}\"]"))
            ),
            Self::Text(t) => {
                let t = js_str(t);
                let skip = js_str(NON_RENDERED);
                format!(
                    "Array.from({root}.querySelectorAll('*')).filter(el => \
                     !el.closest({skip}) && \
                     el.textContent.includes({t}) && \
                     !Array.from(el.children).some(c => c.textContent.includes({t})))"
                )
            }
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({})).filter(el => el.textContent.includes({}))",
                js_str(css),
                js_str(text)
            ),
            Self::Within { parent, child } => format!(
                "(() => {{ const scope = {}[0]; return scope ? {} : []; }})()",
                parent.all_in(root),
                child.all_in("scope")
            ),
        }
    }

    /// Convert to JavaScript query expression for the first match
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("({}[0] ?? null)", self.all_in("document"))
    }

    /// Convert to query for counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.all_in("document"))
    }

    /// Script returning whether the first match is rendered and visible
    #[must_use]
    pub fn visible_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
             return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()",
            self.to_query()
        )
    }

    /// Script returning whether the first match is enabled (null when absent)
    #[must_use]
    pub fn enabled_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return null; return !el.disabled; }})()",
            self.to_query()
        )
    }

    /// Script returning the first match's text content (null when absent)
    #[must_use]
    pub fn text_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; return el ? el.textContent : null; }})()",
            self.to_query()
        )
    }

    /// Script clicking the first match; returns false when absent
    #[must_use]
    pub fn click_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; el.click(); return true; }})()",
            self.to_query()
        )
    }

    /// Script dispatching hover events on the first match
    #[must_use]
    pub fn hover_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             for (const t of ['mouseover', 'mouseenter']) {{ \
             el.dispatchEvent(new MouseEvent(t, {{ bubbles: t === 'mouseover' }})); }} \
             return true; }})()",
            self.to_query()
        )
    }

    /// Script scrolling the first match into view
    #[must_use]
    pub fn scroll_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             el.scrollIntoView({{ block: 'center' }}); return true; }})()",
            self.to_query()
        )
    }

    /// Script appending `text` to an input through the native value setter
    #[must_use]
    pub fn type_script(&self, text: &str) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; el.focus(); \
             const proto = Object.getPrototypeOf(el); \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value').set; \
             setter.call(el, el.value + {}); \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()",
            self.to_query(),
            js_str(text)
        )
    }

    /// Script listing the trimmed option labels of a `<select>` (null when absent)
    #[must_use]
    pub fn options_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el || !el.options) return null; \
             return Array.from(el.options).map(o => o.textContent.trim()); }})()",
            self.to_query()
        )
    }

    /// Script choosing the option labelled `label` in a `<select>`.
    ///
    /// Returns `"missing"` when the select is absent, `"no-option"` when no
    /// option has that label or value, and `"ok"` otherwise.
    #[must_use]
    pub fn select_script(&self, label: &str) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return 'missing'; const want = {}; \
             const opt = Array.from(el.options).find(o => o.textContent.trim() === want || o.value === want); \
             if (!opt) return 'no-option'; el.value = opt.value; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return 'ok'; }})()",
            self.to_query(),
            js_str(label)
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text {t:?}"),
            Self::TestId(id) => write!(f, "[data-testid=\"{id}\"]"),
            Self::CssWithText { css, text } => write!(f, "{css} containing {text:?}"),
            Self::Within { parent, child } => write!(f, "{child} within {parent}"),
        }
    }
}

/// Containers whose text never renders; text matching skips them
const NON_RENDERED: &str = "head,script,style,noscript,template";

/// Encode a Rust string as a JavaScript string literal
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

/// A locator for finding elements, with an optional timeout override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    description: String,
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        let description = selector.to_string();
        Self {
            selector,
            description,
            timeout: None,
        }
    }

    /// Locate the deepest element containing `text`
    #[must_use]
    pub fn contains(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Locate an element by `data-testid`
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::from_selector(Selector::test_id(id))
    }

    /// Narrow to a child of the first match
    #[must_use]
    pub fn find(self, child: Selector) -> Self {
        let description = format!("{child} within {}", self.description);
        Self {
            selector: self.selector.within(child),
            description,
            timeout: self.timeout,
        }
    }

    /// Narrow to the deepest descendant containing `text`
    #[must_use]
    pub fn find_text(self, text: impl Into<String>) -> Self {
        self.find(Selector::text(text))
    }

    /// Replace the description used in logs and errors
    #[must_use]
    pub fn named(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Timeout override, if any
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Timeout override or the supplied default
    #[must_use]
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}
