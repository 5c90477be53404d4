//! In-memory storefront model implementing [`PageDriver`].
//!
//! The model renders a flat element tree for the current route from its own
//! state (account, requisition lists, open form, alerts) and answers
//! selectors the same way the page scripts do: first match in document
//! order, text selectors hitting the deepest element. Element CSS comes from
//! the [`SelectorRegistry`], so registry overrides flow through.
//!
//! A [`Regression`] can be switched on to make the model misbehave in one
//! specific way; the crate's tests use it to prove each scenario catches
//! the failure it is meant to catch.

use crate::driver::{DriverFactory, PageDriver};
use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use crate::selectors::{dom, fields, SelectorRegistry};
use crate::storefront::CREATE_LIST_OPTION;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Alert text shown on the PDP after a redirect
pub const SELECT_OPTIONS_ALERT: &str =
    "Please select product options before adding this product to a requisition list.";

/// Alert a broken PDP shows in place of the options prompt
const WRONG_PDP_ALERT: &str = "Product has been added to your requisition list.";

/// Placeholder option of the PLP control
const PLACEHOLDER_OPTION: &str = "Add to Requisition List";

/// A catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stock keeping unit
    pub sku: String,
    /// Display name
    pub name: String,
    /// URL key used in the PDP path
    pub url_key: String,
    /// Category slug
    pub category: String,
    /// Whether options must be chosen before adding
    pub complex: bool,
}

impl Product {
    fn new(sku: &str, name: &str, category: &str, complex: bool) -> Self {
        Self {
            sku: sku.to_string(),
            name: name.to_string(),
            url_key: name.to_ascii_lowercase().replace(' ', "-"),
            category: category.to_string(),
            complex,
        }
    }

    /// PDP path for this product
    #[must_use]
    pub fn path(&self) -> String {
        format!("/products/{}/{}", self.url_key, self.sku)
    }
}

/// Products and categories served by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Category `(slug, menu label)` pairs in menu order
    pub categories: Vec<(String, String)>,
    /// Products in listing order
    pub products: Vec<Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::sample()
    }
}

impl Catalog {
    /// Apparel and Gear with a mix of simple and configurable products
    #[must_use]
    pub fn sample() -> Self {
        Self {
            categories: vec![
                ("apparel".to_string(), "Apparel".to_string()),
                ("gear".to_string(), "Gear".to_string()),
            ],
            products: vec![
                Product::new("ADB-TEE-01", "Crew Neck Tee", "apparel", false),
                Product::new("ADB-HOOD-01", "Configurable Hoodie", "apparel", true),
                Product::new("ADB-JOG-01", "Configurable Joggers", "apparel", true),
                Product::new("ADB-TOTE-01", "Canvas Tote", "gear", false),
            ],
        }
    }

    fn in_category(&self, slug: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.category == slug).collect()
    }

    fn search(&self, query: &str) -> Vec<&Product> {
        let q = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&q))
            .collect()
    }

    fn by_sku(&self, sku: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.sku == sku)
    }
}

/// A deliberate storefront defect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regression {
    /// Behave correctly
    #[default]
    None,
    /// Complex products are added inline instead of redirecting
    ComplexAddedInline,
    /// Simple products redirect to the PDP
    SimpleRedirected,
    /// The PDP redirect happens without the options alert
    AlertMissing,
    /// Listing pages never render the product grid
    GridNeverLoads,
    /// Sign-up submissions are rejected
    SignUpRejected,
    /// Listings show the options alert after an inline add
    ListingAlert,
    /// The PDP renders without its options block
    OptionsMissing,
    /// The PDP redirect shows an alert with the wrong text
    WrongAlertText,
}

/// Requisition list as stored by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredList {
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// SKUs added to the list
    pub skus: Vec<String>,
}

/// State of one storefront session when it was closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSnapshot {
    /// Email of the account created in the session
    pub account_email: Option<String>,
    /// Lists owned by that account
    pub lists: Vec<StoredList>,
    /// Paths visited, in order
    pub visited: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    SignUp,
    Account,
    RequisitionLists,
    Category(String),
    Search(String),
    Product(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormOrigin {
    ListsPage,
    Product(String),
}

#[derive(Debug, Clone)]
struct ListForm {
    origin: FormOrigin,
    name: String,
    description: String,
}

#[derive(Debug, Clone, Default)]
struct SignUpDraft {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct Account {
    first_name: String,
    email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    FirstName,
    LastName,
    Email,
    Password,
    ListName,
    ListDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SubmitSignUp,
    OpenListForm,
    SaveListForm,
    CancelListForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    Static,
    Menu,
    Link(String),
    Button(Action),
    Input(Field),
    Select { sku: String, options: Vec<String> },
}

#[derive(Debug, Clone)]
struct Element {
    parent: Option<usize>,
    css: Vec<String>,
    text: String,
    visible: bool,
    enabled: bool,
    role: Role,
}

/// CSS the model attaches to registry-named elements
#[derive(Debug, Clone)]
struct Css {
    empty_list: String,
    form_name: String,
    form_description: String,
    item_row: String,
    nav_drop: String,
    grid: String,
    plp_control: String,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    submit: String,
}

impl Css {
    fn from_registry(registry: &SelectorRegistry) -> E2eResult<Self> {
        let get = |name: &str| registry.css(name).map(str::to_string);
        Ok(Self {
            empty_list: get(fields::REQ_LIST_GRID_EMPTY_LIST)?,
            form_name: get(fields::REQUISITION_LIST_FORM_NAME)?,
            form_description: get(fields::REQUISITION_LIST_FORM_DESCRIPTION)?,
            item_row: get(fields::REQUISITION_LIST_ITEM_ROW)?,
            nav_drop: get(fields::NAV_DROP)?,
            grid: get(fields::PRODUCT_LIST_GRID)?,
            plp_control: get(fields::REQUISITION_LIST_NAMES_ON_PLP)?,
            first_name: get(fields::SIGN_UP_FIRST_NAME)?,
            last_name: get(fields::SIGN_UP_LAST_NAME)?,
            email: get(fields::SIGN_UP_EMAIL)?,
            password: get(fields::SIGN_UP_PASSWORD)?,
            submit: get(fields::SIGN_UP_SUBMIT)?,
        })
    }
}

/// Flat element tree under construction
#[derive(Debug, Default)]
struct Tree {
    elements: Vec<Element>,
}

impl Tree {
    fn push(
        &mut self,
        parent: Option<usize>,
        css: &[&str],
        text: impl Into<String>,
        role: Role,
    ) -> usize {
        self.elements.push(Element {
            parent,
            css: css.iter().map(|s| (*s).to_string()).collect(),
            text: text.into(),
            visible: true,
            enabled: true,
            role,
        });
        self.elements.len() - 1
    }

    fn hide(&mut self, idx: usize) {
        self.elements[idx].visible = false;
    }

    fn disable(&mut self, idx: usize) {
        self.elements[idx].enabled = false;
    }

    fn is_descendant(&self, mut idx: usize, ancestor: usize) -> bool {
        while let Some(parent) = self.elements[idx].parent {
            if parent == ancestor {
                return true;
            }
            idx = parent;
        }
        false
    }

    fn subtree_text(&self, idx: usize) -> String {
        let mut text = self.elements[idx].text.clone();
        for i in idx + 1..self.elements.len() {
            if self.is_descendant(i, idx) {
                text.push_str(&self.elements[i].text);
            }
        }
        text
    }

    fn is_visible(&self, mut idx: usize) -> bool {
        loop {
            let el = &self.elements[idx];
            if !el.visible {
                return false;
            }
            match el.parent {
                Some(parent) => idx = parent,
                None => return true,
            }
        }
    }

    fn matches(&self, idx: usize, selector: &Selector) -> bool {
        let el = &self.elements[idx];
        match selector {
            Selector::Css(css) => el.css.iter().any(|c| c == css),
            Selector::TestId(id) => {
                let attr = format!("[data-testid=\"{id}\"]");
                el.css.iter().any(|c| *c == attr)
            }
            Selector::Text(text) => el.text.contains(text.as_str()),
            Selector::CssWithText { css, text } => {
                el.css.iter().any(|c| c == css) && self.subtree_text(idx).contains(text.as_str())
            }
            Selector::Within { .. } => false,
        }
    }

    fn query_all(&self, selector: &Selector) -> Vec<usize> {
        match selector {
            Selector::Within { parent, child } => match self.query_all(parent).first() {
                Some(&scope) => self
                    .query_all(child)
                    .into_iter()
                    .filter(|&i| self.is_descendant(i, scope))
                    .collect(),
                None => Vec::new(),
            },
            other => (0..self.elements.len())
                .filter(|&i| self.matches(i, other))
                .collect(),
        }
    }

    fn first(&self, selector: &Selector) -> Option<&Element> {
        self.query_all(selector)
            .first()
            .map(|&i| &self.elements[i])
    }
}

/// In-memory storefront session
#[derive(Debug)]
pub struct SimulatedStorefront {
    base_url: String,
    css: Css,
    catalog: Arc<Catalog>,
    regression: Regression,
    path: String,
    route: Route,
    account: Option<Account>,
    draft: SignUpDraft,
    sign_up_error: Option<String>,
    lists: Vec<StoredList>,
    form: Option<ListForm>,
    menu_open: bool,
    pdp_alert: Option<String>,
    listing_alert: Option<String>,
    visited: Vec<String>,
    closed: Option<Arc<Mutex<Vec<StorefrontSnapshot>>>>,
}

impl SimulatedStorefront {
    /// Create a storefront session at `about:blank`
    pub fn new(
        base_url: impl Into<String>,
        registry: &SelectorRegistry,
        catalog: Arc<Catalog>,
        regression: Regression,
    ) -> E2eResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            css: Css::from_registry(registry)?,
            catalog,
            regression,
            path: String::from("about:blank"),
            route: Route::Unknown,
            account: None,
            draft: SignUpDraft::default(),
            sign_up_error: None,
            lists: Vec::new(),
            form: None,
            menu_open: false,
            pdp_alert: None,
            listing_alert: None,
            visited: Vec::new(),
            closed: None,
        })
    }

    /// Current path (without the base URL)
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lists owned by the signed-in account
    #[must_use]
    pub fn lists(&self) -> &[StoredList] {
        &self.lists
    }

    /// Capture the session state
    #[must_use]
    pub fn snapshot(&self) -> StorefrontSnapshot {
        StorefrontSnapshot {
            account_email: self.account.as_ref().map(|a| a.email.clone()),
            lists: self.lists.clone(),
            visited: self.visited.clone(),
        }
    }

    fn navigate(&mut self, path: &str) {
        self.path = path.to_string();
        self.visited.push(path.to_string());
        self.menu_open = false;
        self.form = None;
        self.pdp_alert = None;
        self.listing_alert = None;
        self.sign_up_error = None;
        self.route = self.parse_route(path);
        tracing::trace!(path, route = ?self.route, "simulated navigation");
    }

    fn parse_route(&self, path: &str) -> Route {
        let (route_path, query) = path.split_once('?').unwrap_or((path, ""));
        let signed_in = self.account.is_some();
        match route_path.trim_end_matches('/') {
            "/customer/create" => Route::SignUp,
            "/customer/account" if signed_in => Route::Account,
            "/customer/account/requisition-lists" if signed_in => Route::RequisitionLists,
            "/search" => {
                let q = query
                    .split('&')
                    .find_map(|kv| kv.strip_prefix("q="))
                    .unwrap_or("")
                    .replace('+', " ")
                    .replace("%20", " ");
                Route::Search(q)
            }
            p => {
                if let Some(rest) = p.strip_prefix("/products/") {
                    let sku = rest.rsplit('/').next().unwrap_or("");
                    if self.catalog.by_sku(sku).is_some() {
                        return Route::Product(sku.to_string());
                    }
                    return Route::Unknown;
                }
                let slug = p.trim_start_matches('/');
                if self.catalog.categories.iter().any(|(s, _)| s == slug) {
                    Route::Category(slug.to_string())
                } else {
                    Route::Unknown
                }
            }
        }
    }

    fn redirect_to_product(&mut self, sku: &str) {
        let Some(path) = self.catalog.by_sku(sku).map(Product::path) else {
            return;
        };
        self.navigate(&path);
        self.pdp_alert = match self.regression {
            Regression::AlertMissing => None,
            Regression::WrongAlertText => Some(WRONG_PDP_ALERT.to_string()),
            _ => Some(SELECT_OPTIONS_ALERT.to_string()),
        };
    }

    /// Whether adding `sku` from a listing must go through the PDP
    fn needs_redirect(&self, sku: &str) -> bool {
        let complex = self.catalog.by_sku(sku).is_some_and(|p| p.complex);
        match self.regression {
            Regression::ComplexAddedInline => false,
            Regression::SimpleRedirected => true,
            _ => complex,
        }
    }

    fn add_to_list(&mut self, sku: &str, list_name: &str) {
        if self.needs_redirect(sku) {
            self.redirect_to_product(sku);
            return;
        }
        if self.regression == Regression::ListingAlert {
            self.listing_alert = Some(SELECT_OPTIONS_ALERT.to_string());
        }
        if let Some(list) = self.lists.iter_mut().find(|l| l.name == list_name) {
            list.skus.push(sku.to_string());
        }
    }

    fn submit_sign_up(&mut self) {
        let d = &self.draft;
        let valid = !d.first_name.is_empty()
            && !d.last_name.is_empty()
            && d.email.contains('@')
            && d.password.len() >= 8;
        if !valid || self.regression == Regression::SignUpRejected {
            self.sign_up_error = Some("Unable to create account".to_string());
            return;
        }
        self.account = Some(Account {
            first_name: d.first_name.clone(),
            email: d.email.clone(),
        });
        self.navigate("/customer/account");
    }

    fn save_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        match form.origin {
            FormOrigin::Product(sku) if self.needs_redirect(&sku) => {
                self.redirect_to_product(&sku);
            }
            FormOrigin::Product(sku) => {
                if self.regression == Regression::ListingAlert {
                    self.listing_alert = Some(SELECT_OPTIONS_ALERT.to_string());
                }
                self.lists.push(StoredList {
                    name: form.name,
                    description: form.description,
                    skus: vec![sku],
                });
            }
            FormOrigin::ListsPage => self.lists.push(StoredList {
                name: form.name,
                description: form.description,
                skus: Vec::new(),
            }),
        }
    }

    fn field_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::FirstName => Some(&mut self.draft.first_name),
            Field::LastName => Some(&mut self.draft.last_name),
            Field::Email => Some(&mut self.draft.email),
            Field::Password => Some(&mut self.draft.password),
            Field::ListName => self.form.as_mut().map(|f| &mut f.name),
            Field::ListDescription => self.form.as_mut().map(|f| &mut f.description),
        }
    }

    fn render(&self) -> Tree {
        let mut tree = Tree::default();
        if self.route == Route::Unknown && self.path == "about:blank" {
            return tree;
        }

        let header = tree.push(None, &[".header"], "", Role::Static);
        let nav = tree.push(Some(header), &[self.css.nav_drop.as_str()], "Shop", Role::Menu);
        for (slug, label) in &self.catalog.categories {
            let link = tree.push(
                Some(nav),
                &[".nav-drop__link"],
                label.as_str(),
                Role::Link(format!("/{slug}")),
            );
            if !self.menu_open {
                tree.hide(link);
            }
        }

        let main = tree.push(None, &["main"], "", Role::Static);
        match &self.route {
            Route::SignUp => self.render_sign_up(&mut tree, main),
            Route::Account => {
                self.render_account_nav(&mut tree, main);
                if let Some(account) = &self.account {
                    tree.push(
                        Some(main),
                        &[".customer-welcome"],
                        format!("Welcome, {}!", account.first_name),
                        Role::Static,
                    );
                }
            }
            Route::RequisitionLists => self.render_lists_page(&mut tree, main),
            Route::Category(slug) => {
                let products = self.catalog.in_category(slug);
                self.render_listing(&mut tree, main, &products);
            }
            Route::Search(query) => {
                let products = self.catalog.search(query);
                self.render_listing(&mut tree, main, &products);
            }
            Route::Product(sku) => self.render_product(&mut tree, main, sku),
            Route::Unknown => {
                tree.push(Some(main), &[".not-found"], "Page not found", Role::Static);
            }
        }
        tree
    }

    fn render_sign_up(&self, tree: &mut Tree, main: usize) {
        let form = tree.push(Some(main), &[".auth-sign-up-form"], "", Role::Static);
        for (css, field) in [
            (&self.css.first_name, Field::FirstName),
            (&self.css.last_name, Field::LastName),
            (&self.css.email, Field::Email),
            (&self.css.password, Field::Password),
        ] {
            tree.push(Some(form), &[css.as_str()], "", Role::Input(field));
        }
        tree.push(
            Some(form),
            &[self.css.submit.as_str()],
            "Create account",
            Role::Button(Action::SubmitSignUp),
        );
        if let Some(error) = &self.sign_up_error {
            tree.push(
                Some(form),
                &[".auth-sign-up-form__error"],
                error.as_str(),
                Role::Static,
            );
        }
    }

    fn render_account_nav(&self, tree: &mut Tree, main: usize) {
        let nav = tree.push(Some(main), &[".account-nav"], "", Role::Static);
        tree.push(
            Some(nav),
            &[".account-nav__link"],
            "Requisition Lists",
            Role::Link("/customer/account/requisition-lists".to_string()),
        );
    }

    fn render_lists_page(&self, tree: &mut Tree, main: usize) {
        self.render_account_nav(tree, main);
        let grid = tree.push(
            Some(main),
            &[".requisition-list-grid-wrapper"],
            "",
            Role::Static,
        );
        if self.lists.is_empty() {
            let empty = tree.push(Some(grid), &[self.css.empty_list.as_str()], "", Role::Static);
            tree.push(Some(empty), &["p"], "No Requisition Lists found", Role::Static);
        }
        for list in &self.lists {
            let row = tree.push(Some(grid), &[self.css.item_row.as_str()], "", Role::Static);
            tree.push(
                Some(row),
                &[".requisition-list-grid-wrapper__name"],
                list.name.as_str(),
                Role::Static,
            );
            tree.push(
                Some(row),
                &[".requisition-list-grid-wrapper__description"],
                list.description.as_str(),
                Role::Static,
            );
        }
        tree.push(
            Some(main),
            &["button.requisition-list-grid-wrapper__add"],
            "Add new Requisition List",
            Role::Button(Action::OpenListForm),
        );
        if matches!(
            self.form,
            Some(ListForm {
                origin: FormOrigin::ListsPage,
                ..
            })
        ) {
            self.render_form(tree, main);
        }
    }

    fn render_listing(&self, tree: &mut Tree, main: usize, products: &[&Product]) {
        if let Some(alert) = &self.listing_alert {
            tree.push(Some(main), &[dom::SEARCH_ALERT], alert.as_str(), Role::Static);
        }
        let grid = tree.push(Some(main), &[self.css.grid.as_str()], "", Role::Static);
        if self.regression == Regression::GridNeverLoads {
            tree.hide(grid);
        }
        let mut options = vec![PLACEHOLDER_OPTION.to_string()];
        options.extend(self.lists.iter().map(|l| l.name.clone()));
        options.push(CREATE_LIST_OPTION.to_string());

        for product in products {
            let card = tree.push(Some(grid), &[".product-card"], "", Role::Static);
            tree.push(
                Some(card),
                &[".product-card__name"],
                product.name.as_str(),
                Role::Static,
            );
            let control = tree.push(
                Some(card),
                &[self.css.plp_control.as_str()],
                "",
                Role::Static,
            );
            tree.push(
                Some(control),
                &["select"],
                "",
                Role::Select {
                    sku: product.sku.clone(),
                    options: options.clone(),
                },
            );
        }
        if matches!(
            self.form,
            Some(ListForm {
                origin: FormOrigin::Product(_),
                ..
            })
        ) {
            self.render_form(tree, main);
        }
    }

    fn render_product(&self, tree: &mut Tree, main: usize, sku: &str) {
        let Some(product) = self.catalog.by_sku(sku) else {
            return;
        };
        let wrapper = tree.push(Some(main), &[dom::PRODUCT_DETAILS_WRAPPER], "", Role::Static);
        tree.push(
            Some(wrapper),
            &[".product-details__title"],
            product.name.as_str(),
            Role::Static,
        );
        if let Some(alert) = &self.pdp_alert {
            tree.push(
                Some(wrapper),
                &[dom::PRODUCT_DETAILS_ALERT],
                alert.as_str(),
                Role::Static,
            );
        }
        if product.complex && self.regression != Regression::OptionsMissing {
            tree.push(
                Some(wrapper),
                &[dom::PRODUCT_DETAILS_OPTIONS],
                "Size Color",
                Role::Static,
            );
        }
    }

    fn render_form(&self, tree: &mut Tree, main: usize) {
        let Some(form) = &self.form else {
            return;
        };
        let container = tree.push(Some(main), &[".requisition-list-form"], "", Role::Static);
        tree.push(
            Some(container),
            &[self.css.form_name.as_str()],
            "",
            Role::Input(Field::ListName),
        );
        tree.push(
            Some(container),
            &[self.css.form_description.as_str()],
            "",
            Role::Input(Field::ListDescription),
        );
        tree.push(
            Some(container),
            &["button.requisition-list-form__cancel"],
            "Cancel",
            Role::Button(Action::CancelListForm),
        );
        let save_attr = format!("[data-testid=\"{}\"]", dom::REQUISITION_LIST_FORM_SAVE_TEST_ID);
        let save = tree.push(
            Some(container),
            &["button.requisition-list-form__save", save_attr.as_str()],
            "Save",
            Role::Button(Action::SaveListForm),
        );
        if form.name.trim().is_empty() {
            tree.disable(save);
        }
    }

    fn missing(selector: &Selector, verb: &str) -> E2eError {
        E2eError::page(format!("cannot {verb}: nothing matches {selector}"))
    }
}

#[async_trait]
impl PageDriver for SimulatedStorefront {
    async fn goto(&mut self, url: &str) -> E2eResult<()> {
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        if !path.starts_with('/') {
            return Err(E2eError::NavigationError {
                url: url.to_string(),
                message: format!("outside {}", self.base_url),
            });
        }
        self.navigate(path);
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        if self.path == "about:blank" {
            return Ok(self.path.clone());
        }
        Ok(format!("{}{}", self.base_url, self.path))
    }

    async fn count(&self, selector: &Selector) -> E2eResult<usize> {
        Ok(self.render().query_all(selector).len())
    }

    async fn is_visible(&self, selector: &Selector) -> E2eResult<bool> {
        let tree = self.render();
        Ok(tree
            .query_all(selector)
            .first()
            .is_some_and(|&i| tree.is_visible(i)))
    }

    async fn is_enabled(&self, selector: &Selector) -> E2eResult<Option<bool>> {
        Ok(self.render().first(selector).map(|el| el.enabled))
    }

    async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>> {
        let tree = self.render();
        Ok(tree
            .query_all(selector)
            .first()
            .map(|&i| tree.subtree_text(i)))
    }

    async fn click(&mut self, selector: &Selector) -> E2eResult<()> {
        let tree = self.render();
        let el = tree
            .first(selector)
            .ok_or_else(|| Self::missing(selector, "click"))?;
        if !el.enabled {
            return Ok(());
        }
        match el.role.clone() {
            Role::Link(path) => self.navigate(&path),
            Role::Button(Action::SubmitSignUp) => self.submit_sign_up(),
            Role::Button(Action::OpenListForm) => {
                self.form = Some(ListForm {
                    origin: FormOrigin::ListsPage,
                    name: String::new(),
                    description: String::new(),
                });
            }
            Role::Button(Action::SaveListForm) => self.save_form(),
            Role::Button(Action::CancelListForm) => self.form = None,
            Role::Menu => self.menu_open = !self.menu_open,
            Role::Static | Role::Input(_) | Role::Select { .. } => {}
        }
        Ok(())
    }

    async fn hover(&mut self, selector: &Selector) -> E2eResult<()> {
        let tree = self.render();
        let el = tree
            .first(selector)
            .ok_or_else(|| Self::missing(selector, "hover"))?;
        if el.role == Role::Menu {
            self.menu_open = true;
        }
        Ok(())
    }

    async fn type_text(&mut self, selector: &Selector, text: &str) -> E2eResult<()> {
        let tree = self.render();
        let el = tree
            .first(selector)
            .ok_or_else(|| Self::missing(selector, "type into"))?;
        let Role::Input(field) = el.role else {
            return Err(E2eError::page(format!("{selector} is not an input")));
        };
        if let Some(value) = self.field_mut(field) {
            value.push_str(text);
        }
        Ok(())
    }

    async fn option_labels(&self, selector: &Selector) -> E2eResult<Option<Vec<String>>> {
        Ok(match self.render().first(selector).map(|el| &el.role) {
            Some(Role::Select { options, .. }) => Some(options.clone()),
            _ => None,
        })
    }

    async fn select_option(&mut self, selector: &Selector, label: &str) -> E2eResult<()> {
        let tree = self.render();
        let el = tree
            .first(selector)
            .ok_or_else(|| Self::missing(selector, "select"))?;
        let Role::Select { sku, options } = el.role.clone() else {
            return Err(E2eError::page(format!("{selector} is not a select")));
        };
        if !options.iter().any(|o| o == label) {
            return Err(E2eError::assertion(
                format!("an option labelled '{label}' in {selector}"),
                "no such option",
            ));
        }
        match label {
            PLACEHOLDER_OPTION => {}
            CREATE_LIST_OPTION => {
                self.form = Some(ListForm {
                    origin: FormOrigin::Product(sku),
                    name: String::new(),
                    description: String::new(),
                });
            }
            list_name => self.add_to_list(&sku, list_name),
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, selector: &Selector) -> E2eResult<()> {
        self.render()
            .first(selector)
            .map(|_| ())
            .ok_or_else(|| Self::missing(selector, "scroll to"))
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if let Some(closed) = self.closed.take() {
            closed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self.snapshot());
        }
        Ok(())
    }
}

/// Opens simulated storefront sessions and keeps their final snapshots
#[derive(Debug, Clone)]
pub struct SimulatedFactory {
    base_url: String,
    registry: Arc<SelectorRegistry>,
    catalog: Arc<Catalog>,
    regression: Regression,
    closed: Arc<Mutex<Vec<StorefrontSnapshot>>>,
}

impl SimulatedFactory {
    /// Create a factory serving the sample catalog
    #[must_use]
    pub fn new(base_url: impl Into<String>, registry: Arc<SelectorRegistry>) -> Self {
        Self {
            base_url: base_url.into(),
            registry,
            catalog: Arc::new(Catalog::sample()),
            regression: Regression::None,
            closed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve a different catalog
    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Inject a storefront defect
    #[must_use]
    pub const fn with_regression(mut self, regression: Regression) -> Self {
        self.regression = regression;
        self
    }

    /// Snapshots of every closed session, in closing order
    #[must_use]
    pub fn snapshots(&self) -> Vec<StorefrontSnapshot> {
        self.closed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DriverFactory for SimulatedFactory {
    async fn open(&self) -> E2eResult<Box<dyn PageDriver>> {
        let mut storefront = SimulatedStorefront::new(
            self.base_url.clone(),
            &self.registry,
            Arc::clone(&self.catalog),
            self.regression,
        )?;
        storefront.closed = Some(Arc::clone(&self.closed));
        Ok(Box::new(storefront))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
