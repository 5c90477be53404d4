//! Selector Registry: semantic element names mapped to locators.
//!
//! Scenarios ask for elements by the names in [`fields`]; only the registry
//! knows the concrete CSS. Deployments whose markup differs can override
//! entries from the config file without touching scenario code.
//!
//! The DOM-contract locators in [`dom`] are intentionally not part of the
//! registry: their class names are a fixed compatibility surface with the
//! storefront and must stay bit-exact.

use crate::locator::{Locator, Selector};
use crate::result::{E2eError, E2eResult};
use std::collections::BTreeMap;

/// Semantic names understood by the registry
pub mod fields {
    /// Empty-state block of the requisition list grid
    pub const REQ_LIST_GRID_EMPTY_LIST: &str = "reqListGridEmptyList";
    /// Name input of the requisition list form
    pub const REQUISITION_LIST_FORM_NAME: &str = "requisitionListFormName";
    /// Description input of the requisition list form
    pub const REQUISITION_LIST_FORM_DESCRIPTION: &str = "requisitionListFormDescription";
    /// One row of the requisition list grid
    pub const REQUISITION_LIST_ITEM_ROW: &str = "requisitionListItemRow";
    /// Top navigation dropdown trigger
    pub const NAV_DROP: &str = "navDrop";
    /// Product grid on category and search pages
    pub const PRODUCT_LIST_GRID: &str = "productListGrid";
    /// Per-product requisition list control on the PLP
    pub const REQUISITION_LIST_NAMES_ON_PLP: &str = "requisitionListNamesOnPLP";
    /// Sign-up form: first name
    pub const SIGN_UP_FIRST_NAME: &str = "signUpFirstName";
    /// Sign-up form: last name
    pub const SIGN_UP_LAST_NAME: &str = "signUpLastName";
    /// Sign-up form: email
    pub const SIGN_UP_EMAIL: &str = "signUpEmail";
    /// Sign-up form: password
    pub const SIGN_UP_PASSWORD: &str = "signUpPassword";
    /// Sign-up form: submit button
    pub const SIGN_UP_SUBMIT: &str = "signUpSubmit";
}

/// Fixed DOM contract with the storefront
pub mod dom {
    /// Product detail page wrapper
    pub const PRODUCT_DETAILS_WRAPPER: &str = ".product-details__wrapper";
    /// Alert shown on the product detail page
    pub const PRODUCT_DETAILS_ALERT: &str = ".product-details__alert";
    /// Configurable options region on the product detail page
    pub const PRODUCT_DETAILS_OPTIONS: &str = ".product-details__options";
    /// Alert shown on listing pages
    pub const SEARCH_ALERT: &str = ".search__alert";
    /// Save button of the requisition list form
    pub const REQUISITION_LIST_FORM_SAVE_TEST_ID: &str = "requisition-list-form-save";
}

/// Built-in locators for the storefront's drop-in markup
const DEFAULTS: &[(&str, &str)] = &[
    (
        fields::REQ_LIST_GRID_EMPTY_LIST,
        ".requisition-list-grid-wrapper__empty-list",
    ),
    (
        fields::REQUISITION_LIST_FORM_NAME,
        ".requisition-list-form input[name=\"name\"]",
    ),
    (
        fields::REQUISITION_LIST_FORM_DESCRIPTION,
        ".requisition-list-form textarea[name=\"description\"]",
    ),
    (
        fields::REQUISITION_LIST_ITEM_ROW,
        ".requisition-list-grid-wrapper__list-item",
    ),
    (fields::NAV_DROP, ".nav-drop"),
    (fields::PRODUCT_LIST_GRID, ".product-list-page__grid"),
    (
        fields::REQUISITION_LIST_NAMES_ON_PLP,
        ".product-list-page__requisition-list-names",
    ),
    (fields::SIGN_UP_FIRST_NAME, "input[name=\"firstName\"]"),
    (fields::SIGN_UP_LAST_NAME, "input[name=\"lastName\"]"),
    (fields::SIGN_UP_EMAIL, "input[name=\"email\"]"),
    (fields::SIGN_UP_PASSWORD, "input[name=\"password\"]"),
    (
        fields::SIGN_UP_SUBMIT,
        ".auth-sign-up-form button[type=\"submit\"]",
    ),
];

/// Registry of semantic selector names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRegistry {
    entries: BTreeMap<String, String>,
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self {
            entries: DEFAULTS
                .iter()
                .map(|(name, css)| ((*name).to_string(), (*css).to_string()))
                .collect(),
        }
    }
}

impl SelectorRegistry {
    /// Create the registry with built-in locators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override known entries.
    ///
    /// Unknown names are rejected so a typo in a config file fails the run
    /// instead of silently leaving the default in place.
    pub fn with_overrides<'a, I>(mut self, overrides: I) -> E2eResult<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, css) in overrides {
            match self.entries.get_mut(name) {
                Some(slot) => {
                    tracing::debug!(name = %name, css = %css, "selector override");
                    slot.clone_from(css);
                }
                None => {
                    return Err(E2eError::UnknownSelector { name: name.clone() });
                }
            }
        }
        Ok(self)
    }

    /// Resolve a semantic name to its CSS
    pub fn css(&self, name: &str) -> E2eResult<&str> {
        self.entries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| E2eError::UnknownSelector {
                name: name.to_string(),
            })
    }

    /// Resolve a semantic name to a locator described by that name
    pub fn locate(&self, name: &str) -> E2eResult<Locator> {
        let css = self.css(name)?;
        Ok(Locator::from_selector(Selector::css(css)).named(name))
    }

    /// Iterate `(name, css)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_field() {
        let registry = SelectorRegistry::new();
        for name in [
            fields::REQ_LIST_GRID_EMPTY_LIST,
            fields::REQUISITION_LIST_FORM_NAME,
            fields::REQUISITION_LIST_FORM_DESCRIPTION,
            fields::REQUISITION_LIST_ITEM_ROW,
            fields::NAV_DROP,
            fields::PRODUCT_LIST_GRID,
            fields::REQUISITION_LIST_NAMES_ON_PLP,
            fields::SIGN_UP_FIRST_NAME,
            fields::SIGN_UP_LAST_NAME,
            fields::SIGN_UP_EMAIL,
            fields::SIGN_UP_PASSWORD,
            fields::SIGN_UP_SUBMIT,
        ] {
            assert!(registry.css(name).is_ok(), "missing {name}");
        }
        assert_eq!(registry.len(), DEFAULTS.len());
    }

    #[test]
    fn test_locate_uses_semantic_name() {
        let registry = SelectorRegistry::new();
        let loc = registry.locate(fields::PRODUCT_LIST_GRID).unwrap();
        assert_eq!(loc.description(), "productListGrid");
        assert_eq!(loc.selector(), &Selector::css(".product-list-page__grid"));
    }

    #[test]
    fn test_unknown_name() {
        let registry = SelectorRegistry::new();
        let err = registry.locate("cartButton").unwrap_err();
        assert!(matches!(err, E2eError::UnknownSelector { ref name } if name == "cartButton"));
    }

    #[test]
    fn test_override_known_entry() {
        let overrides: BTreeMap<String, String> =
            [(fields::NAV_DROP.to_string(), "#main-nav".to_string())].into();
        let registry = SelectorRegistry::new().with_overrides(&overrides).unwrap();
        assert_eq!(registry.css(fields::NAV_DROP).unwrap(), "#main-nav");
    }

    #[test]
    fn test_override_unknown_entry_rejected() {
        let overrides: BTreeMap<String, String> =
            [("navdrop".to_string(), "#main-nav".to_string())].into();
        let err = SelectorRegistry::new()
            .with_overrides(&overrides)
            .unwrap_err();
        assert!(err.to_string().contains("navdrop"));
    }

    #[test]
    fn test_dom_contract_is_bit_exact() {
        assert_eq!(dom::PRODUCT_DETAILS_ALERT, ".product-details__alert");
        assert_eq!(dom::PRODUCT_DETAILS_OPTIONS, ".product-details__options");
        assert_eq!(dom::PRODUCT_DETAILS_WRAPPER, ".product-details__wrapper");
        assert_eq!(dom::SEARCH_ALERT, ".search__alert");
    }
}
