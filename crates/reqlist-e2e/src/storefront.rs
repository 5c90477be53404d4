//! Storefront journeys shared by the scenarios.
//!
//! Each function is one user-visible step of a journey (open the lists page,
//! pick a list on a product card, ...) expressed through [`Session`]
//! actions. Outcome checks live in [`ExpectedOutcome::verify`].

use crate::locator::{Locator, Selector};
use crate::result::{E2eError, E2eResult};
use crate::selectors::{dom, fields};
use crate::session::{dom_locator, Session};
use crate::state::ScenarioState;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Path of the account landing page
pub const ACCOUNT_PATH: &str = "/customer/account";

/// Fragment every PDP URL contains
pub const PDP_PATH_FRAGMENT: &str = "/products/";

/// Pattern the PDP alert must match
pub const SELECT_OPTIONS_PATTERN: &str = "(?i)select product options";

/// Label of the "create new list" option in the product card control
pub const CREATE_LIST_OPTION: &str = "Create Requisition List";

/// Compiled [`SELECT_OPTIONS_PATTERN`]
pub fn select_options_regex() -> E2eResult<&'static Regex> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SELECT_OPTIONS_PATTERN))
        .as_ref()
        .map_err(|e| E2eError::Config {
            message: e.to_string(),
        })
}

/// How a scenario reaches a listing whose first card has the wanted kind.
///
/// Product complexity is never read from the page. Each source is a
/// heuristic about catalog contents, and the run log says which one was
/// relied on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "via")]
pub enum ProductSource {
    /// Category page opened from the nav menu
    Category {
        /// Menu entry text
        menu_label: String,
    },
    /// Search results page
    Search {
        /// Query string
        query: String,
    },
}

impl ProductSource {
    /// Apparel category; first card assumed simple
    #[must_use]
    pub fn apparel() -> Self {
        Self::Category {
            menu_label: "Apparel".to_string(),
        }
    }

    /// Search for `configurable`; first card assumed complex
    #[must_use]
    pub fn configurable_search() -> Self {
        Self::Search {
            query: "configurable".to_string(),
        }
    }

    /// Reach the listing and wait for its grid
    pub async fn open(&self, session: &mut Session) -> E2eResult<()> {
        tracing::warn!(source = %self, "product kind inferred from listing heuristic");
        match self {
            Self::Category { menu_label } => {
                let nav = session.locate(fields::NAV_DROP)?;
                session.hover(&nav).await?;
                session.click(&Locator::contains(menu_label.as_str())).await?;
            }
            Self::Search { query } => {
                session.visit(&format!("/search?q={query}")).await?;
            }
        }
        wait_for_grid(session).await?;
        session.advance(ScenarioState::Navigated)
    }
}

impl fmt::Display for ProductSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category { menu_label } => write!(f, "category '{menu_label}'"),
            Self::Search { query } => write!(f, "search '{query}'"),
        }
    }
}

async fn wait_for_grid(session: &mut Session) -> E2eResult<()> {
    let grid = session
        .locate(fields::PRODUCT_LIST_GRID)?
        .with_timeout(session.config().timeouts.grid());
    session.expect_visible(&grid).await
}

fn first_card_select(session: &Session) -> E2eResult<Locator> {
    Ok(session
        .locate(fields::REQUISITION_LIST_NAMES_ON_PLP)?
        .find(Selector::css("select")))
}

/// Open Requisition Lists from the account page
pub async fn open_requisition_lists(session: &mut Session) -> E2eResult<()> {
    session.click(&Locator::contains("Requisition Lists")).await
}

/// The lists page shows its empty state
pub async fn expect_no_lists(session: &mut Session) -> E2eResult<()> {
    let empty = session.locate(fields::REQ_LIST_GRID_EMPTY_LIST)?;
    session.expect_exists(&empty).await?;
    session
        .expect_visible(&empty.find_text("No Requisition Lists found"))
        .await
}

/// Fill the name and description fields of an open list form
async fn fill_list_form(session: &mut Session, name: &str, description: &str) -> E2eResult<()> {
    let form_timeout = session.config().timeouts.form();
    let name_field = session
        .locate(fields::REQUISITION_LIST_FORM_NAME)?
        .with_timeout(form_timeout);
    session.expect_enabled(&name_field).await?;
    session.type_text(&name_field, name).await?;

    let description_field = session.locate(fields::REQUISITION_LIST_FORM_DESCRIPTION)?;
    session.expect_enabled(&description_field).await?;
    session.type_text(&description_field, description).await
}

/// Create a list from the lists page and wait for its row
pub async fn create_list(session: &mut Session, name: &str, description: &str) -> E2eResult<()> {
    session
        .click(&Locator::contains("Add new Requisition List"))
        .await?;
    fill_list_form(session, name, description).await?;
    session.expect_visible(&Locator::contains("Cancel")).await?;
    session.click(&Locator::contains("Save")).await?;
    session.expect_visible(&Locator::contains(name)).await
}

/// Exactly `expected` list rows are shown
pub async fn expect_list_rows(session: &mut Session, expected: usize) -> E2eResult<()> {
    let rows = session.locate(fields::REQUISITION_LIST_ITEM_ROW)?;
    session.expect_count(&rows, expected).await
}

/// Pick an existing list on the first product card
///
/// Returns the listing URL as it was before the action.
pub async fn add_first_product_to_list(session: &mut Session, list_name: &str) -> E2eResult<String> {
    let control = session.locate(fields::REQUISITION_LIST_NAMES_ON_PLP)?;
    session.expect_exists(&control).await?;
    let before = session.url().await?;
    let select = first_card_select(session)?;
    session.select_option(&select, list_name).await?;
    session.advance(ScenarioState::ActionTaken)?;
    Ok(before)
}

/// Choose "Create Requisition List" on the first product card and submit
/// the form
///
/// Returns the listing URL as it was before the action.
pub async fn create_list_from_first_product(
    session: &mut Session,
    name: &str,
    description: &str,
) -> E2eResult<String> {
    let control = session.locate(fields::REQUISITION_LIST_NAMES_ON_PLP)?;
    session.expect_exists(&control).await?;
    let before = session.url().await?;
    let select = first_card_select(session)?;
    session.select_option(&select, CREATE_LIST_OPTION).await?;
    fill_list_form(session, name, description).await?;

    let save = Locator::test_id(dom::REQUISITION_LIST_FORM_SAVE_TEST_ID);
    session.expect_visible(&save).await?;
    session.scroll_into_view(&save).await?;
    session.click(&save).await?;
    session.advance(ScenarioState::ActionTaken)?;
    Ok(before)
}

/// What a requisition-list action on a listing must lead to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    /// Complex product: PDP with the "select options" alert
    RedirectToProductDetail,
    /// Simple product: the listing stays put, no alert
    StayOnListing,
}

impl ExpectedOutcome {
    /// Check the outcome against the URL captured before the action
    pub async fn verify(self, session: &mut Session, before: &str) -> E2eResult<()> {
        let timeouts = session.config().timeouts;
        match self {
            Self::RedirectToProductDetail => {
                session.expect_url_changed(before, timeouts.alert()).await?;
                session
                    .expect_url_contains(PDP_PATH_FRAGMENT, timeouts.alert())
                    .await?;
                session
                    .expect_exists(&dom_locator(dom::PRODUCT_DETAILS_WRAPPER))
                    .await?;

                let alert =
                    dom_locator(dom::PRODUCT_DETAILS_ALERT).with_timeout(timeouts.alert());
                session.expect_visible(&alert).await?;
                session.expect_not_empty(&alert).await?;
                let text = session
                    .expect_text_matches(&alert, select_options_regex()?)
                    .await?;
                tracing::debug!(alert = %text.trim(), "redirected to product detail");

                session
                    .expect_exists(&dom_locator(dom::PRODUCT_DETAILS_OPTIONS))
                    .await
            }
            Self::StayOnListing => {
                session
                    .expect_url_unchanged(before, timeouts.settle())
                    .await?;
                session
                    .expect_not_exists(&dom_locator(dom::SEARCH_ALERT))
                    .await
            }
        }
    }
}

impl fmt::Display for ExpectedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedirectToProductDetail => f.write_str("redirect to product detail"),
            Self::StayOnListing => f.write_str("stay on listing"),
        }
    }
}
