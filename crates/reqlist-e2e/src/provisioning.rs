//! Shopper provisioning: sign up a fresh account and confirm the session.

use crate::fixture::SignUpInfo;
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::selectors::fields;
use crate::session::Session;
use crate::state::ScenarioState;
use crate::storefront::ACCOUNT_PATH;

/// Path of the sign-up page
pub const SIGN_UP_PATH: &str = "/customer/create";

/// Fill and submit the sign-up form on the current page
pub async fn sign_up_user(session: &mut Session, info: &SignUpInfo) -> E2eResult<()> {
    for (field, value) in [
        (fields::SIGN_UP_FIRST_NAME, info.first_name.as_str()),
        (fields::SIGN_UP_LAST_NAME, info.last_name.as_str()),
        (fields::SIGN_UP_EMAIL, info.email.as_str()),
        (fields::SIGN_UP_PASSWORD, info.password.as_str()),
    ] {
        let input = session.locate(field)?;
        session.type_text(&input, value).await?;
    }
    let submit = session.locate(fields::SIGN_UP_SUBMIT)?;
    session.click(&submit).await
}

/// The session landed on the account page and greets the shopper
pub async fn assert_auth_user(session: &mut Session, info: &SignUpInfo) -> E2eResult<()> {
    let timeout = session.config().timeouts.form();
    session.expect_url_contains(ACCOUNT_PATH, timeout).await?;
    session
        .expect_visible(&Locator::contains(info.first_name.as_str()).with_timeout(timeout))
        .await
}

/// Sign up and verify; any failure is reported as a setup failure
pub async fn provision(session: &mut Session, info: &SignUpInfo) -> E2eResult<()> {
    tracing::info!(email = %info.email, "provisioning shopper");
    session
        .visit(SIGN_UP_PATH)
        .await
        .map_err(|e| E2eError::setup("open sign-up page", e))?;
    sign_up_user(session, info)
        .await
        .map_err(|e| E2eError::setup("sign up", e))?;
    assert_auth_user(session, info)
        .await
        .map_err(|e| E2eError::setup("confirm signed in", e))?;
    session.advance(ScenarioState::Authenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, Timeouts};
    use crate::result::FailureKind;
    use crate::selectors::SelectorRegistry;
    use crate::simulated::{Catalog, Regression, SimulatedStorefront};
    use std::sync::Arc;

    const BASE: &str = "http://storefront.test";

    fn session(regression: Regression) -> Session {
        let registry = Arc::new(SelectorRegistry::new());
        let config = Arc::new(
            RunConfig::default()
                .with_base_url(BASE)
                .with_timeouts(Timeouts::fast()),
        );
        let driver =
            SimulatedStorefront::new(BASE, &registry, Arc::new(Catalog::sample()), regression)
                .unwrap();
        Session::new(Box::new(driver), registry, config)
    }

    fn info() -> SignUpInfo {
        SignUpInfo {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            password: "CobolRules1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_provision_authenticates() {
        let mut s = session(Regression::None);
        provision(&mut s, &info()).await.unwrap();
        assert_eq!(s.state(), ScenarioState::Authenticated);
        assert!(s.url().await.unwrap().ends_with(ACCOUNT_PATH));
    }

    #[tokio::test]
    async fn test_rejected_sign_up_is_setup_failure() {
        let mut s = session(Regression::SignUpRejected);
        let err = provision(&mut s, &info()).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Setup);
        assert!(err.to_string().contains("confirm signed in"));
        assert_eq!(s.state(), ScenarioState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_short_password_is_setup_failure() {
        let mut s = session(Regression::None);
        let weak = SignUpInfo {
            password: "short".to_string(),
            ..info()
        };
        let err = provision(&mut s, &weak).await.unwrap_err();
        assert!(matches!(err, E2eError::SetupFailed { .. }));
    }
}
