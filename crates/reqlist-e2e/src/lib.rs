//! reqlist-e2e: browser-driven E2E scenarios for storefront requisition lists
//!
//! Verifies that adding a *complex* (configurable) product to a requisition
//! list from a product listing redirects the shopper to the product detail
//! page with a "select product options" prompt, while *simple* products are
//! added in place.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  reqlist-e2e Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Scenario   │    │ Session    │    │ PageDriver         │    │
//! │   │ Runner     │───►│ (waits,    │───►│  Chromium (CDP)    │    │
//! │   │ (harness)  │    │  expects)  │    │  simulated model   │    │
//! │   └────────────┘    └────────────┘    └────────────────────┘    │
//! │         │                 │                                     │
//! │   fixtures +        SelectorRegistry                            │
//! │   provisioning      (semantic names)                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use reqlist_e2e::prelude::*;
//!
//! # async fn demo() -> E2eResult<()> {
//! let config = RunConfig::default()
//!     .with_base_url("https://storefront.example")
//!     .with_driver(DriverKind::Simulated);
//! let runner = ScenarioRunner::from_config(config)?;
//! let results = runner.run(scenario::suite()).await?;
//! assert!(results.all_passed());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod browser;
mod config;
mod driver;
mod fixture;
mod harness;
mod locator;
mod provisioning;
mod result;
pub mod scenario;
mod selectors;
mod session;
mod simulated;
mod state;
mod storefront;
mod wait;

pub use browser::{BrowserConfig, ChromiumFactory};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{RunConfig, Timeouts, DEFAULT_BASE_URL};
pub use driver::{DriverFactory, DriverKind, PageDriver};
pub use fixture::{FixtureStore, SignUpInfo, UserInfo, USER_INFO};
pub use harness::{ScenarioResult, ScenarioRunner, SuiteResults, TestStatus, RESULTS_FILE};
pub use locator::{Locator, Selector};
pub use provisioning::{assert_auth_user, provision, sign_up_user, SIGN_UP_PATH};
pub use result::{E2eError, E2eResult, FailureKind};
pub use scenario::{Scenario, SUITE_NAME, SUITE_TAG};
pub use selectors::{dom, fields, SelectorRegistry};
pub use session::{Session, StepRecord};
pub use simulated::{
    Catalog, Product, Regression, SimulatedFactory, SimulatedStorefront, StoredList,
    StorefrontSnapshot, SELECT_OPTIONS_ALERT,
};
pub use state::ScenarioState;
pub use storefront::{
    add_first_product_to_list, create_list, create_list_from_first_product, expect_list_rows,
    expect_no_lists, open_requisition_lists, select_options_regex, ExpectedOutcome,
    ProductSource, ACCOUNT_PATH, CREATE_LIST_OPTION, PDP_PATH_FRAGMENT, SELECT_OPTIONS_PATTERN,
};
pub use wait::{
    hold_steady, poll_until, PollTimeout, Probe, WaitOptions, WaitResult,
    DEFAULT_COMMAND_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::scenario;
    pub use super::{
        BrowserConfig, DriverKind, E2eError, E2eResult, ExpectedOutcome, FailureKind, Locator,
        ProductSource, Regression, RunConfig, Scenario, ScenarioResult, ScenarioRunner,
        ScenarioState, Selector, SelectorRegistry, Session, SimulatedFactory, SuiteResults,
        TestStatus, Timeouts,
    };
}
