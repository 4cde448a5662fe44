//! Contract Test: All-Containers Mode
//!
//! Constraints verified:
//! - Every running container is processed exactly once
//! - Stopped containers are never touched
//! - The runtime is listed once per run
//! - Processing follows listing order
//! - A listing failure fails the run instead of silently doing nothing

mod common;

use common::*;
use ip2kv_core::{Error, SyncEngine, SyncEvent, SyncOutcome};

#[tokio::test]
async fn every_running_container_once() {
    let runtime = FakeRuntime::new()
        .with_container("aaaa11112222", &["web"], "10.0.0.2")
        .with_stopped("bbbb11112222", &["old"], "10.0.0.3")
        .with_container("cccc11112222", &[], "10.0.0.4");
    let registry = MockRegistry::new();

    let (engine, _rx) = SyncEngine::new(
        Box::new(runtime.clone()),
        Box::new(registry.clone()),
        all_config(),
    )
    .unwrap();
    let report = engine.run().await.unwrap();

    assert_eq!(runtime.list_call_count(), 1);
    assert_eq!(
        runtime.inspected(),
        vec!["aaaa11112222".to_string(), "cccc11112222".to_string()]
    );
    assert_eq!(report.outcomes().len(), 2);
    assert_eq!(report.updated(), 2);
    assert!(registry.value("/net/old/ip").is_none());
    assert!(registry.value("/net/bbbb11112222/ip").is_none());
}

#[tokio::test]
async fn outcomes_follow_listing_order() {
    let runtime = FakeRuntime::new()
        .with_container("zzzz00000000", &["zeta"], "10.0.0.9")
        .with_container("aaaa00000000", &["alpha"], "10.0.0.1");
    let registry = MockRegistry::new();

    let (engine, _rx) =
        SyncEngine::new(Box::new(runtime), Box::new(registry.clone()), all_config()).unwrap();
    let report = engine.run().await.unwrap();

    let targets: Vec<&str> = report.outcomes().iter().map(SyncOutcome::target).collect();
    assert_eq!(targets, vec!["zzzz00000000", "aaaa00000000"]);
}

#[tokio::test]
async fn empty_runtime_is_a_successful_no_op() {
    let runtime = FakeRuntime::new();
    let registry = MockRegistry::new();

    let (engine, _rx) =
        SyncEngine::new(Box::new(runtime), Box::new(registry.clone()), all_config()).unwrap();
    let report = engine.run().await.unwrap();

    assert!(report.outcomes().is_empty());
    assert!(report.is_success());
    assert_eq!(registry.get_call_count(), 0);
}

#[tokio::test]
async fn listing_failure_fails_the_run() {
    let runtime = FakeRuntime::new().with_container("aaaa11112222", &["web"], "10.0.0.2");
    runtime.fail_listing(true);
    let registry = MockRegistry::new();

    let (engine, _rx) =
        SyncEngine::new(Box::new(runtime), Box::new(registry.clone()), all_config()).unwrap();
    let result = engine.run().await;

    assert!(matches!(result, Err(Error::Runtime(_))));
    assert_eq!(registry.write_count(), 0);
}

#[tokio::test]
async fn events_describe_the_run() {
    let runtime = FakeRuntime::new()
        .with_container("aaaa11112222", &["web"], "10.0.0.2")
        .with_container("bbbb11112222", &["db"], "");
    let registry = MockRegistry::new().with_entry("/net/web/ip", "10.0.0.2");

    let (engine, mut event_rx) =
        SyncEngine::new(Box::new(runtime), Box::new(registry), all_config()).unwrap();
    engine.run().await.unwrap();
    drop(engine);

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.first(), Some(&SyncEvent::Started { all_containers: true }));
    assert_eq!(
        events.last(),
        Some(&SyncEvent::Finished {
            updated: 0,
            unchanged: 1,
            failed: 1,
        })
    );
    let finished = events
        .iter()
        .filter(|e| matches!(e, SyncEvent::TargetFinished(_)))
        .count();
    assert_eq!(finished, 2);
    assert!(events.contains(&SyncEvent::TargetResolved {
        target: "bbbb11112222".to_string(),
        container_id: "bbbb11112222".to_string(),
        key: "/net/db/ip".to_string(),
    }));
}
