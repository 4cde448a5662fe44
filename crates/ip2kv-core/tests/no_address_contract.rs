//! Contract Test: Missing Address Policy
//!
//! Constraints verified:
//! - A container without an address never causes registry I/O
//! - Default mode reports it as a failure
//! - Quiet mode reports it as a success
//! - An inspection error is handled like a missing address

mod common;

use common::*;
use ip2kv_core::{SyncEngine, SyncOutcome};

#[tokio::test]
async fn empty_address_fails_by_default() {
    let runtime = FakeRuntime::new().with_container("abcdef123456", &["db"], "");
    let registry = MockRegistry::new();

    let (engine, _rx) = SyncEngine::new(
        Box::new(runtime),
        Box::new(registry.clone()),
        named_config(&["db"]),
    )
    .unwrap();
    let report = engine.run().await.unwrap();

    assert_eq!(
        report.outcomes(),
        &[SyncOutcome::NoAddress {
            target: "db".to_string(),
            container_id: "abcdef123456".to_string(),
            suppressed: false,
        }]
    );
    assert!(!report.is_success());
    assert_eq!(registry.get_call_count(), 0);
    assert_eq!(registry.write_count(), 0);
}

#[tokio::test]
async fn quiet_mode_reports_success() {
    let runtime = FakeRuntime::new().with_container("abcdef123456", &["db"], "");
    let registry = MockRegistry::new();

    let (engine, _rx) = SyncEngine::new(
        Box::new(runtime),
        Box::new(registry.clone()),
        named_config(&["db"]).with_quiet(true),
    )
    .unwrap();
    let report = engine.run().await.unwrap();

    assert!(report.is_success());
    assert!(matches!(
        report.outcomes(),
        [SyncOutcome::NoAddress { suppressed: true, .. }]
    ));
    assert_eq!(registry.write_count(), 0);
}

#[tokio::test]
async fn inspection_error_is_no_address() {
    let runtime = FakeRuntime::new().with_container("abcdef123456", &["db"], "10.0.0.5");
    runtime.fail_inspect(true);
    let registry = MockRegistry::new();

    let (engine, _rx) = SyncEngine::new(
        Box::new(runtime),
        Box::new(registry.clone()),
        named_config(&["db"]),
    )
    .unwrap();
    let report = engine.run().await.unwrap();

    assert!(matches!(report.outcomes(), [SyncOutcome::NoAddress { .. }]));
    assert_eq!(registry.get_call_count(), 0);
}

#[tokio::test]
async fn whitespace_address_counts_as_empty() {
    let runtime = FakeRuntime::new().with_container("abcdef123456", &["db"], "  ");
    let registry = MockRegistry::new();

    let (engine, _rx) = SyncEngine::new(
        Box::new(runtime),
        Box::new(registry.clone()),
        named_config(&["db"]),
    )
    .unwrap();
    let report = engine.run().await.unwrap();

    assert!(matches!(report.outcomes(), [SyncOutcome::NoAddress { .. }]));
    assert_eq!(registry.write_count(), 0);
}
