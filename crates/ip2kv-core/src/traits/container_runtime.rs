// # Container Runtime Trait
//
// Defines the interface for discovering running containers.
//
// ## Implementations
//
// - Docker Engine API: `ip2kv-runtime-docker` crate
//
// ## Usage
//
// ```rust,ignore
// use ip2kv_core::ContainerRuntime;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let runtime = /* ContainerRuntime implementation */;
//
//     for container in runtime.list_running().await? {
//         let address = runtime.inspect_address(&container.id).await?;
//         println!("{} -> {}", container.id, address);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A running container as reported by the runtime listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Canonical container ID
    pub id: String,
    /// Display names in runtime order, stored with a leading `/`
    pub names: Vec<String>,
}

impl ContainerSummary {
    /// Create a new container summary
    pub fn new(id: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            id: id.into(),
            names,
        }
    }

    /// Check whether `identifier` names this container
    ///
    /// The identifier is unprefixed; stored names carry the runtime's
    /// leading separator.
    pub fn has_name(&self, identifier: &str) -> bool {
        self.names
            .iter()
            .any(|name| name.strip_prefix('/') == Some(identifier))
    }

    /// Display names joined with `:`, or `None` for an unnamed container
    pub fn joined_names(&self) -> Option<String> {
        let joined = self.names.join(":");
        (!joined.is_empty()).then_some(joined)
    }

    /// Key segment for this container: its names, else its truncated ID
    pub fn identity_segment(&self) -> String {
        self.joined_names()
            .unwrap_or_else(|| crate::key::truncate_id(&self.id).to_string())
    }
}

/// Trait for container runtime implementations
///
/// Two capabilities are all the sync engine needs:
/// 1. **list_running()**: Enumerate the currently running containers
/// 2. **inspect_address()**: Read one container's current network address
///
/// # Read-Only
///
/// Implementations must never start, stop or otherwise modify containers.
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed calls (the engine reports failures, it does not retry)
/// - ❌ Cache listings between calls (each call reflects the runtime now)
/// - ❌ Include stopped containers in `list_running()`
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List running containers
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ContainerSummary>)`: Running containers, in runtime order
    /// - `Err(Error)`: If the runtime could not be queried
    async fn list_running(&self) -> Result<Vec<ContainerSummary>, crate::Error>;

    /// Get the current network address of a container
    ///
    /// # Parameters
    ///
    /// - `container_id`: Canonical container ID
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address, empty if none is assigned
    /// - `Err(Error)`: If the container could not be inspected
    async fn inspect_address(&self, container_id: &str) -> Result<String, crate::Error>;

    /// Get the runtime name (for logging/debugging)
    fn runtime_name(&self) -> &'static str;
}

/// Helper trait for constructing container runtimes from configuration
pub trait ContainerRuntimeFactory: Send + Sync {
    /// Create a ContainerRuntime instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Runtime configuration
    /// - `timeout_secs`: Per-request timeout
    fn create(
        &self,
        config: &crate::config::RuntimeConfig,
        timeout_secs: u64,
    ) -> Result<Box<dyn ContainerRuntime>, crate::Error>;
}
