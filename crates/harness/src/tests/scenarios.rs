//! The three adversarial scenarios, end to end.

use gauntlet_cluster::mock::MockDriver;
use gauntlet_config::InstantClock;
use gauntlet_scenario::ScenarioKind;

use super::test_config;
use crate::{run_all, run_scenario};

#[tokio::test]
async fn test_no_malicious_producers_transaction_enters_chain() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    let verdict = run_scenario(ScenarioKind::NoMalicious, &config, &driver, &clock)
        .await
        .expect("scenario should pass");
    assert!(verdict.pass);
    assert!(verdict.message.contains("entered the chain"));
}

#[tokio::test]
async fn test_minority_malicious_producers_transaction_enters_chain() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    let verdict = run_scenario(ScenarioKind::MinorityMalicious, &config, &driver, &clock)
        .await
        .expect("scenario should pass");
    assert!(verdict.pass);
    assert!(verdict.message.contains("entered the chain"));
}

#[tokio::test]
async fn test_majority_malicious_producers_transaction_stays_out() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    let verdict = run_scenario(ScenarioKind::MajorityMalicious, &config, &driver, &clock)
        .await
        .expect("scenario should pass");
    assert!(verdict.pass);
    assert!(verdict.message.contains("stayed out"));
}

#[tokio::test]
async fn test_scenario_imports_contract_and_funded_keys() {
    let dir = tempfile::tempdir().unwrap();
    // keep_logs skips the post-pass cleanup that would reset the mock's
    // wallet state.
    let config = gauntlet_config::RunConfig { keep_logs: true, ..test_config(dir.path()) };
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    run_scenario(ScenarioKind::NoMalicious, &config, &driver, &clock)
        .await
        .expect("scenario should pass");
    assert_eq!(driver.imported_keys(), 2);
}

#[tokio::test]
async fn test_batch_runs_every_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    let report = run_all(&ScenarioKind::all(), &config, &driver, &clock).await;
    assert_eq!(report.scenarios.len(), 3);
    assert!(report.all_passed());
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    driver.fail_wallet(true);
    let clock = InstantClock::new();

    let report = run_all(&ScenarioKind::all(), &config, &driver, &clock).await;
    assert_eq!(report.scenarios.len(), 1);
    assert!(!report.all_passed());
    assert!(report.scenarios[0].result.is_err());
}

#[tokio::test]
async fn test_empty_batch_does_not_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let driver = MockDriver::new();
    let clock = InstantClock::new();

    let report = run_all(&[], &config, &driver, &clock).await;
    assert!(!report.all_passed());
}
