//! Whole-suite runs against the in-memory storefront.

use reqlist_e2e::prelude::*;
use reqlist_e2e::{StorefrontSnapshot, CREATE_LIST_OPTION};
use std::sync::Arc;

const BASE: &str = "http://storefront.test";

struct Fixture {
    factory: SimulatedFactory,
    runner: ScenarioRunner,
    _out: tempfile::TempDir,
}

fn fixture(regression: Regression, configure: impl FnOnce(RunConfig) -> RunConfig) -> Fixture {
    let out = tempfile::tempdir().unwrap();
    let config = configure(
        RunConfig::default()
            .with_base_url(BASE)
            .with_driver(DriverKind::Simulated)
            .with_timeouts(Timeouts::fast())
            .with_output_dir(out.path()),
    );
    let registry = Arc::new(SelectorRegistry::new());
    let factory = SimulatedFactory::new(BASE, Arc::clone(&registry)).with_regression(regression);
    let runner = ScenarioRunner::new(Arc::new(factory.clone()), registry, Arc::new(config));
    Fixture {
        factory,
        runner,
        _out: out,
    }
}

fn result<'a>(results: &'a SuiteResults, id: &str) -> &'a ScenarioResult {
    results.results.iter().find(|r| r.id == id).unwrap()
}

fn snapshot_for(fx: &Fixture, r: &ScenarioResult) -> StorefrontSnapshot {
    fx.factory
        .snapshots()
        .into_iter()
        .find(|s| s.account_email == r.user_email)
        .unwrap()
}

mod healthy_storefront_tests {
    use super::*;

    #[tokio::test]
    async fn test_all_scenarios_pass() {
        let fx = fixture(Regression::None, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        assert!(results.all_passed(), "{:#?}", results.failures());
        assert_eq!(results.total(), 4);
        for r in &results.results {
            assert_eq!(r.final_state, ScenarioState::OutcomeVerified);
            assert!(r.steps.iter().all(|s| s.ok));
            assert!(r.failure_kind.is_none());
        }
    }

    #[tokio::test]
    async fn test_each_scenario_signs_up_a_fresh_user() {
        let fx = fixture(Regression::None, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        let mut emails: Vec<_> = results
            .results
            .iter()
            .map(|r| r.user_email.clone().unwrap())
            .collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 4);
    }

    #[tokio::test]
    async fn test_complex_products_never_land_in_lists() {
        let fx = fixture(Regression::None, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();

        let existing = snapshot_for(&fx, result(&results, "complex-existing-list"));
        assert_eq!(existing.lists.len(), 1);
        assert_eq!(existing.lists[0].name, "Test Requisition List");
        assert!(existing.lists[0].skus.is_empty());

        let created = snapshot_for(&fx, result(&results, "complex-new-list"));
        assert!(created.lists.is_empty());

        let repeat = snapshot_for(&fx, result(&results, "complex-repeat"));
        assert_eq!(repeat.lists.len(), 2);
        assert!(repeat.lists.iter().all(|l| l.skus.is_empty()));
        let pdp_visits = repeat
            .visited
            .iter()
            .filter(|p| p.starts_with("/products/"))
            .count();
        assert_eq!(pdp_visits, 2);
    }

    #[tokio::test]
    async fn test_simple_product_added_in_place() {
        let fx = fixture(Regression::None, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("simple"), None))
            .await
            .unwrap();
        assert!(results.all_passed());
        let snap = snapshot_for(&fx, &results.results[0]);
        assert_eq!(snap.lists[0].name, "Simple Product List");
        assert_eq!(snap.lists[0].skus.len(), 1);
        assert!(!snap.visited.iter().any(|p| p.starts_with("/products/")));
    }

    #[tokio::test]
    async fn test_parallel_jobs_keep_suite_order() {
        let fx = fixture(Regression::None, |c| c.with_jobs(4));
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        assert!(results.all_passed());
        let ids: Vec<_> = results.results.iter().map(|r| r.id.as_str()).collect();
        let expected: Vec<_> = scenario::suite().iter().map(|s| s.id()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_results_record_heuristic_and_outcome() {
        let fx = fixture(Regression::None, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        let simple = result(&results, "simple-existing-list");
        assert_eq!(simple.product_source, ProductSource::apparel());
        assert_eq!(simple.expected_outcome, ExpectedOutcome::StayOnListing);
        assert_eq!(simple.tags, vec!["@B2BSaas".to_string()]);
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_result() {
        let fx = fixture(Regression::None, |c| c);
        let mut seen = Vec::new();
        fx.runner
            .run_with(scenario::suite(), |r| seen.push(r.id.clone()))
            .await
            .unwrap();
        assert_eq!(seen.len(), 4);
    }
}

mod regressed_storefront_tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_complex_add_fails_redirect_scenarios() {
        let fx = fixture(Regression::ComplexAddedInline, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        for id in ["complex-existing-list", "complex-new-list", "complex-repeat"] {
            let r = result(&results, id);
            assert_eq!(r.status, TestStatus::Failed, "{id}");
            assert_eq!(r.failure_kind, Some(FailureKind::Assertion), "{id}");
            assert_eq!(r.final_state, ScenarioState::Failed);
        }
        assert!(result(&results, "simple-existing-list").passed());
    }

    #[tokio::test]
    async fn test_simple_redirect_fails_simple_scenario() {
        let fx = fixture(Regression::SimpleRedirected, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("simple"), None))
            .await
            .unwrap();
        let r = &results.results[0];
        assert_eq!(r.failure_kind, Some(FailureKind::Assertion));
        assert!(r.error.as_deref().unwrap().contains("/products/"));
    }

    #[tokio::test]
    async fn test_missing_alert_is_a_timeout() {
        let fx = fixture(Regression::AlertMissing, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("complex-existing"), None))
            .await
            .unwrap();
        let r = &results.results[0];
        assert_eq!(r.failure_kind, Some(FailureKind::Timeout));
        assert!(r.error.as_deref().unwrap().contains("product-details__alert"));
    }

    #[tokio::test]
    async fn test_listing_alert_fails_simple_scenario() {
        let fx = fixture(Regression::ListingAlert, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("simple"), None))
            .await
            .unwrap();
        let r = &results.results[0];
        assert_eq!(r.status, TestStatus::Failed);
        assert_eq!(r.failure_kind, Some(FailureKind::Assertion));
        assert!(r.error.as_deref().unwrap().contains("search__alert"));
    }

    #[tokio::test]
    async fn test_missing_options_block_is_a_timeout() {
        let fx = fixture(Regression::OptionsMissing, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("complex-existing"), None))
            .await
            .unwrap();
        let r = &results.results[0];
        assert_eq!(r.failure_kind, Some(FailureKind::Timeout));
        assert!(r.error.as_deref().unwrap().contains("product-details__options"));
    }

    #[tokio::test]
    async fn test_wrong_alert_text_is_an_assertion() {
        let fx = fixture(Regression::WrongAlertText, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        for id in ["complex-existing-list", "complex-new-list", "complex-repeat"] {
            let r = result(&results, id);
            assert_eq!(r.failure_kind, Some(FailureKind::Assertion), "{id}");
            assert!(r.error.as_deref().unwrap().contains("select product options"), "{id}");
        }
        assert!(result(&results, "simple-existing-list").passed());
    }

    #[tokio::test]
    async fn test_grid_never_loading_is_a_timeout() {
        let fx = fixture(Regression::GridNeverLoads, |c| c);
        let results = fx
            .runner
            .run(scenario::select(Some("simple"), None))
            .await
            .unwrap();
        let r = &results.results[0];
        assert_eq!(r.failure_kind, Some(FailureKind::Timeout));
        assert_eq!(r.final_state, ScenarioState::Failed);
        assert!(!r.steps.last().unwrap().ok);
    }

    #[tokio::test]
    async fn test_sign_up_failure_is_setup() {
        let fx = fixture(Regression::SignUpRejected, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        assert_eq!(results.failed_count(), 4);
        for r in &results.results {
            assert_eq!(r.failure_kind, Some(FailureKind::Setup));
            assert!(r.error.as_deref().unwrap().starts_with("Setup failed"));
        }
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining() {
        let fx = fixture(Regression::SignUpRejected, |c| c.with_fail_fast(true));
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        assert_eq!(results.failed_count(), 1);
        assert_eq!(results.skipped_count(), 3);
        assert_eq!(results.results[0].status, TestStatus::Failed);
        assert!(results.results[1..]
            .iter()
            .all(|r| r.status == TestStatus::Skipped && r.steps.is_empty()));
    }

    #[tokio::test]
    async fn test_no_screenshot_from_simulated_driver() {
        let fx = fixture(Regression::GridNeverLoads, |c| c);
        let results = fx.runner.run(scenario::suite()).await.unwrap();
        assert!(results.results.iter().all(|r| r.screenshot.is_none()));
    }
}

mod selector_override_tests {
    use super::*;

    #[tokio::test]
    async fn test_overridden_registry_flows_to_storefront() {
        let mut config = RunConfig::default()
            .with_base_url(BASE)
            .with_driver(DriverKind::Simulated)
            .with_timeouts(Timeouts::fast());
        config
            .selectors
            .insert("navDrop".to_string(), ".mega-menu".to_string());
        let runner = ScenarioRunner::from_config(config).unwrap();
        let results = runner
            .run(scenario::select(Some("simple"), None))
            .await
            .unwrap();
        assert!(results.all_passed(), "{:#?}", results.failures());
    }

    #[test]
    fn test_create_option_label() {
        assert_eq!(CREATE_LIST_OPTION, "Create Requisition List");
    }
}
