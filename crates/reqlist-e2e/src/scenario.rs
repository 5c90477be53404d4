//! Requisition-list redirect scenarios.
//!
//! Every scenario starts from an authenticated session (the harness signs a
//! fresh shopper up first) and ends with its outcome verified. The suite is
//! "Verify Complex Product Requisition List Redirect", tagged `@B2BSaas`.

use crate::result::E2eResult;
use crate::session::Session;
use crate::storefront::{
    add_first_product_to_list, create_list, create_list_from_first_product,
    expect_list_rows, expect_no_lists, open_requisition_lists, ExpectedOutcome, ProductSource,
    ACCOUNT_PATH,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Suite title
pub const SUITE_NAME: &str = "Verify Complex Product Requisition List Redirect";

/// Tag carried by every scenario in the suite
pub const SUITE_TAG: &str = "@B2BSaas";

/// One journey against the storefront
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Short stable identifier (filters, screenshot names)
    fn id(&self) -> &'static str;

    /// Human-readable title
    fn name(&self) -> &'static str;

    /// Selection tags
    fn tags(&self) -> &'static [&'static str] {
        &[SUITE_TAG]
    }

    /// Listing heuristic the scenario relies on for product kind
    fn source(&self) -> ProductSource;

    /// Outcome the scenario asserts
    fn expected(&self) -> ExpectedOutcome;

    /// Run the journey on an authenticated session
    async fn run(&self, session: &mut Session) -> E2eResult<()>;

    /// Whether `filter` (case-insensitive substring of id or name) and
    /// `tag` select this scenario
    fn matches(&self, filter: Option<&str>, tag: Option<&str>) -> bool {
        let by_filter = filter.map_or(true, |f| {
            let f = f.to_lowercase();
            self.id().contains(&f) || self.name().to_lowercase().contains(&f)
        });
        let by_tag = tag.map_or(true, |t| {
            let t = t.trim_start_matches('@');
            self.tags()
                .iter()
                .any(|own| own.trim_start_matches('@').eq_ignore_ascii_case(t))
        });
        by_filter && by_tag
    }
}

/// Complex product added to an existing list from the listing redirects to
/// the PDP. Also covers list creation from an empty lists page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexProductExistingList;

#[async_trait]
impl Scenario for ComplexProductExistingList {
    fn id(&self) -> &'static str {
        "complex-existing-list"
    }

    fn name(&self) -> &'static str {
        "Should redirect to PDP when trying to add a complex product to requisition list from PLP"
    }

    fn source(&self) -> ProductSource {
        ProductSource::configurable_search()
    }

    fn expected(&self) -> ExpectedOutcome {
        ExpectedOutcome::RedirectToProductDetail
    }

    async fn run(&self, session: &mut Session) -> E2eResult<()> {
        const LIST: &str = "Test Requisition List";

        open_requisition_lists(session).await?;
        expect_no_lists(session).await?;
        create_list(session, LIST, "Test description").await?;
        expect_list_rows(session, 1).await?;

        ProductSource::apparel().open(session).await?;
        self.source().open(session).await?;

        let before = add_first_product_to_list(session, LIST).await?;
        self.expected().verify(session, &before).await
    }
}

/// Complex product with "Create Requisition List" redirects instead of
/// creating the list
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexProductNewList;

#[async_trait]
impl Scenario for ComplexProductNewList {
    fn id(&self) -> &'static str {
        "complex-new-list"
    }

    fn name(&self) -> &'static str {
        "Should also redirect when trying to create a new requisition list with a complex product from PLP"
    }

    fn source(&self) -> ProductSource {
        ProductSource::configurable_search()
    }

    fn expected(&self) -> ExpectedOutcome {
        ExpectedOutcome::RedirectToProductDetail
    }

    async fn run(&self, session: &mut Session) -> E2eResult<()> {
        self.source().open(session).await?;
        let before = create_list_from_first_product(
            session,
            "New List from Complex Product",
            "Test description",
        )
        .await?;
        self.expected().verify(session, &before).await?;

        // the redirect replaces the create, so the account still has no lists
        session.visit(ACCOUNT_PATH).await?;
        open_requisition_lists(session).await?;
        expect_no_lists(session).await
    }
}

/// Simple product is added from the listing without leaving it
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleProductNoRedirect;

#[async_trait]
impl Scenario for SimpleProductNoRedirect {
    fn id(&self) -> &'static str {
        "simple-existing-list"
    }

    fn name(&self) -> &'static str {
        "Should allow adding a simple product to requisition list from PLP without redirect"
    }

    fn source(&self) -> ProductSource {
        ProductSource::apparel()
    }

    fn expected(&self) -> ExpectedOutcome {
        ExpectedOutcome::StayOnListing
    }

    async fn run(&self, session: &mut Session) -> E2eResult<()> {
        const LIST: &str = "Simple Product List";

        open_requisition_lists(session).await?;
        create_list(session, LIST, "For simple products").await?;

        self.source().open(session).await?;
        let before = add_first_product_to_list(session, LIST).await?;
        self.expected().verify(session, &before).await
    }
}

/// The redirect happens on every attempt, not just the first
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexProductRepeatRedirect;

#[async_trait]
impl Scenario for ComplexProductRepeatRedirect {
    fn id(&self) -> &'static str {
        "complex-repeat"
    }

    fn name(&self) -> &'static str {
        "Should redirect to PDP on every attempt to add a complex product from PLP"
    }

    fn source(&self) -> ProductSource {
        ProductSource::configurable_search()
    }

    fn expected(&self) -> ExpectedOutcome {
        ExpectedOutcome::RedirectToProductDetail
    }

    async fn run(&self, session: &mut Session) -> E2eResult<()> {
        const LISTS: [(&str, &str); 2] = [
            ("First Redirect List", "First attempt"),
            ("Second Redirect List", "Second attempt"),
        ];

        open_requisition_lists(session).await?;
        for (name, description) in LISTS {
            create_list(session, name, description).await?;
        }
        expect_list_rows(session, LISTS.len()).await?;

        for (attempt, (name, _)) in LISTS.iter().enumerate() {
            tracing::debug!(attempt = attempt + 1, list = %name, "redirect attempt");
            self.source().open(session).await?;
            let before = add_first_product_to_list(session, name).await?;
            self.expected().verify(session, &before).await?;
        }
        Ok(())
    }
}

/// All scenarios of the suite, in run order
#[must_use]
pub fn suite() -> Vec<Arc<dyn Scenario>> {
    vec![
        Arc::new(ComplexProductExistingList),
        Arc::new(ComplexProductNewList),
        Arc::new(SimpleProductNoRedirect),
        Arc::new(ComplexProductRepeatRedirect),
    ]
}

/// Scenarios selected by an optional filter and tag
#[must_use]
pub fn select(filter: Option<&str>, tag: Option<&str>) -> Vec<Arc<dyn Scenario>> {
    suite()
        .into_iter()
        .filter(|s| s.matches(filter, tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_order_and_ids_unique() {
        let ids: Vec<_> = suite().iter().map(|s| s.id()).collect();
        assert_eq!(
            ids,
            vec![
                "complex-existing-list",
                "complex-new-list",
                "simple-existing-list",
                "complex-repeat"
            ]
        );
    }

    #[test]
    fn test_only_simple_scenario_stays_on_listing() {
        let staying: Vec<_> = suite()
            .into_iter()
            .filter(|s| s.expected() == ExpectedOutcome::StayOnListing)
            .map(|s| s.id())
            .collect();
        assert_eq!(staying, vec!["simple-existing-list"]);
    }

    #[test]
    fn test_filter_by_id_and_name() {
        assert_eq!(select(Some("repeat"), None).len(), 1);
        assert_eq!(select(Some("SIMPLE PRODUCT"), None).len(), 1);
        assert_eq!(select(Some("complex"), None).len(), 3);
        assert!(select(Some("checkout"), None).is_empty());
    }

    #[test]
    fn test_filter_by_tag() {
        assert_eq!(select(None, Some("@B2BSaas")).len(), 4);
        assert_eq!(select(None, Some("b2bsaas")).len(), 4);
        assert!(select(None, Some("@Smoke")).is_empty());
    }
}
