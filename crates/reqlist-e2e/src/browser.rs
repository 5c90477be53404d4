//! Browser control for headless testing.
//!
//! When compiled with the `browser` feature this module drives Chromium over
//! the Chrome `DevTools` Protocol via chromiumoxide. Every DOM interaction is
//! a script generated from the [`Selector`](crate::Selector), evaluated in
//! the page and returned as JSON. Without the feature, [`ChromiumFactory`]
//! still exists but refuses to open sessions.

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Timeout for a single CDP request, including page loads
    pub request_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
            request_timeout_ms: 30_000,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{DriverFactory, PageDriver};
    use crate::locator::Selector;
    use crate::result::{E2eError, E2eResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::de::DeserializeOwned;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// A Chromium process with one page, owned by a single scenario
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<CdpBrowser>,
        page: Mutex<CdpPage>,
        handle: tokio::task::JoinHandle<()>,
        profile_dir: PathBuf,
    }

    impl ChromiumDriver {
        /// Launch a new browser instance with real CDP
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: &BrowserConfig) -> E2eResult<Self> {
            let profile_dir =
                std::env::temp_dir().join(format!("reqlist-e2e-{}", uuid::Uuid::new_v4()));

            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                })
                .request_timeout(Duration::from_millis(config.request_timeout_ms))
                .user_data_dir(&profile_dir);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(|message| {
                if message.contains("detect") {
                    E2eError::BrowserNotFound
                } else {
                    E2eError::BrowserLaunchError { message }
                }
            })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                E2eError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            // Spawn handler task
            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| E2eError::page(e.to_string()))?;

            tracing::debug!(profile = %profile_dir.display(), "chromium launched");

            Ok(Self {
                browser: Mutex::new(browser),
                page: Mutex::new(page),
                handle,
                profile_dir,
            })
        }

        /// Evaluate `expr` and decode its JSON-serialised value.
        ///
        /// Values go through `JSON.stringify` so that `null` survives the
        /// round trip instead of arriving as a missing remote value.
        async fn eval<T: DeserializeOwned>(&self, expr: &str) -> E2eResult<T> {
            let wrapped = format!("JSON.stringify({expr})");
            let page = self.page.lock().await;
            let raw: String = page
                .evaluate(wrapped.as_str())
                .await
                .map_err(|e| E2eError::page(e.to_string()))?
                .into_value()
                .map_err(|e| E2eError::page(e.to_string()))?;
            Ok(serde_json::from_str(&raw)?)
        }

        async fn act(&self, script: String, selector: &Selector, verb: &str) -> E2eResult<()> {
            if self.eval::<bool>(&script).await? {
                Ok(())
            } else {
                Err(E2eError::page(format!("cannot {verb}: nothing matches {selector}")))
            }
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumDriver {
        async fn goto(&mut self, url: &str) -> E2eResult<()> {
            self.page
                .lock()
                .await
                .goto(url)
                .await
                .map_err(|e| E2eError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> E2eResult<String> {
            // location.href follows client-side route changes
            self.eval("window.location.href").await
        }

        async fn count(&self, selector: &Selector) -> E2eResult<usize> {
            self.eval(&selector.to_count_query()).await
        }

        async fn is_visible(&self, selector: &Selector) -> E2eResult<bool> {
            self.eval(&selector.visible_script()).await
        }

        async fn is_enabled(&self, selector: &Selector) -> E2eResult<Option<bool>> {
            self.eval(&selector.enabled_script()).await
        }

        async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>> {
            self.eval(&selector.text_script()).await
        }

        async fn click(&mut self, selector: &Selector) -> E2eResult<()> {
            self.act(selector.click_script(), selector, "click").await
        }

        async fn hover(&mut self, selector: &Selector) -> E2eResult<()> {
            self.act(selector.hover_script(), selector, "hover").await
        }

        async fn type_text(&mut self, selector: &Selector, text: &str) -> E2eResult<()> {
            self.act(selector.type_script(text), selector, "type into")
                .await
        }

        async fn option_labels(&self, selector: &Selector) -> E2eResult<Option<Vec<String>>> {
            self.eval(&selector.options_script()).await
        }

        async fn select_option(&mut self, selector: &Selector, label: &str) -> E2eResult<()> {
            let status: String = self.eval(&selector.select_script(label)).await?;
            match status.as_str() {
                "ok" => Ok(()),
                "no-option" => Err(E2eError::assertion(
                    format!("an option labelled '{label}' in {selector}"),
                    "no such option",
                )),
                _ => Err(E2eError::page(format!(
                    "cannot select: nothing matches {selector}"
                ))),
            }
        }

        async fn scroll_into_view(&mut self, selector: &Selector) -> E2eResult<()> {
            self.act(selector.scroll_script(), selector, "scroll to")
                .await
        }

        async fn screenshot(&self) -> E2eResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot = self
                .page
                .lock()
                .await
                .execute(params)
                .await
                .map_err(|e| E2eError::page(e.to_string()))?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| E2eError::page(e.to_string()))
        }

        async fn close(&mut self) -> E2eResult<()> {
            let result = self
                .browser
                .get_mut()
                .close()
                .await
                .map(|_| ())
                .map_err(|e| E2eError::BrowserLaunchError {
                    message: e.to_string(),
                });
            self.handle.abort();
            let _ = std::fs::remove_dir_all(&self.profile_dir);
            result
        }
    }

    /// Launches one Chromium process per scenario
    #[derive(Debug, Clone, Default)]
    pub struct ChromiumFactory {
        config: BrowserConfig,
    }

    impl ChromiumFactory {
        /// Create a factory for the given browser settings
        #[must_use]
        pub const fn new(config: BrowserConfig) -> Self {
            Self { config }
        }
    }

    #[async_trait]
    impl DriverFactory for ChromiumFactory {
        async fn open(&self) -> E2eResult<Box<dyn PageDriver>> {
            Ok(Box::new(ChromiumDriver::launch(&self.config).await?))
        }

        fn name(&self) -> &str {
            "chromium"
        }
    }
}

// ============================================================================
// Stand-in when the `browser` feature is NOT enabled
// ============================================================================

#[cfg(not(feature = "browser"))]
mod unavailable {
    use super::BrowserConfig;
    use crate::driver::{DriverFactory, PageDriver};
    use crate::result::{E2eError, E2eResult};
    use async_trait::async_trait;

    /// Chromium factory for builds without the `browser` feature
    #[derive(Debug, Clone, Default)]
    pub struct ChromiumFactory {
        #[allow(dead_code)]
        config: BrowserConfig,
    }

    impl ChromiumFactory {
        /// Create a factory for the given browser settings
        #[must_use]
        pub const fn new(config: BrowserConfig) -> Self {
            Self { config }
        }
    }

    #[async_trait]
    impl DriverFactory for ChromiumFactory {
        async fn open(&self) -> E2eResult<Box<dyn PageDriver>> {
            Err(E2eError::BrowserLaunchError {
                message: "Browser feature not enabled. Enable 'browser' feature for real CDP support."
                    .to_string(),
            })
        }

        fn name(&self) -> &str {
            "chromium"
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumFactory};

#[cfg(not(feature = "browser"))]
pub use unavailable::ChromiumFactory;
