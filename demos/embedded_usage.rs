//! Minimal embedding example for ip2kv-core
//!
//! Runs the sync engine against an in-process container table and the
//! in-memory registry, so it needs neither Docker nor etcd.

use ip2kv_core::traits::{ContainerRuntime, ContainerSummary};
use ip2kv_core::{Error, MemoryRegistry, Result, SyncConfig, SyncEngine, TargetSelection};
use std::sync::{Arc, Mutex};

/// Container table shared with the application
#[derive(Clone, Default)]
struct EmbeddedRuntime {
    containers: Arc<Mutex<Vec<(ContainerSummary, String)>>>,
}

impl EmbeddedRuntime {
    fn add(&self, id: &str, name: &str, address: &str) {
        let summary = ContainerSummary::new(id, vec![format!("/{}", name)]);
        self.lock().push((summary, address.to_string()));
    }

    /// Simulate a container being recreated with a new address
    fn readdress(&self, name: &str, address: &str) {
        for (summary, current) in self.lock().iter_mut() {
            if summary.has_name(name) {
                *current = address.to_string();
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ContainerSummary, String)>> {
        self.containers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for EmbeddedRuntime {
    async fn list_running(&self) -> Result<Vec<ContainerSummary>> {
        Ok(self.lock().iter().map(|(summary, _)| summary.clone()).collect())
    }

    async fn inspect_address(&self, container_id: &str) -> Result<String> {
        self.lock()
            .iter()
            .find(|(summary, _)| summary.id == container_id)
            .map(|(_, address)| address.clone())
            .ok_or_else(|| Error::runtime(format!("No such container: {}", container_id)))
    }

    fn runtime_name(&self) -> &'static str {
        "embedded"
    }
}

/// Run one pass and print what happened
async fn run_pass(
    label: &str,
    runtime: &EmbeddedRuntime,
    registry: &MemoryRegistry,
    targets: TargetSelection,
) -> Result<()> {
    let config = SyncConfig::new("/demo", targets);
    let (engine, mut event_rx) =
        SyncEngine::new(Box::new(runtime.clone()), Box::new(registry.clone()), config)?;

    let event_listener = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(event) = event_rx.recv().await {
            println!("   [Event] {:?}", event);
            count += 1;
        }
        count
    });

    println!("{}", label);
    let report = engine.run().await?;
    drop(engine);

    let events = event_listener.await.unwrap_or(0);
    for outcome in report.outcomes() {
        println!("   {}", outcome);
    }
    println!(
        "   -> {} updated, {} unchanged, {} failed ({} events)\n",
        report.updated(),
        report.unchanged(),
        report.failed(),
        events
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("=== Embedded ip2kv-core Example ===\n");

    let runtime = EmbeddedRuntime::default();
    runtime.add("3f4e5d6c7b8a9f0e1d2c", "db", "10.0.0.5");
    runtime.add("a1b2c3d4e5f60718293a", "web", "10.0.0.6");

    let registry = MemoryRegistry::new();

    run_pass(
        "1. First pass writes both keys",
        &runtime,
        &registry,
        TargetSelection::named(["db", "web"]),
    )
    .await?;

    run_pass(
        "2. Second pass is a no-op",
        &runtime,
        &registry,
        TargetSelection::named(["db", "web"]),
    )
    .await?;

    runtime.readdress("db", "10.0.0.9");
    run_pass(
        "3. db moved; only its key is rewritten",
        &runtime,
        &registry,
        TargetSelection::named(["db", "web"]),
    )
    .await?;

    run_pass(
        "4. All running containers, keyed by name",
        &runtime,
        &registry,
        TargetSelection::All,
    )
    .await?;

    println!("Registry after {} writes:", registry.write_count());
    for key in ["/demo/db/ip", "/demo/web/ip"] {
        println!("   {} = {:?}", key, registry.peek(key).await);
    }

    Ok(())
}
