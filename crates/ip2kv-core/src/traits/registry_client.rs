// # Registry Client Trait
//
// Defines the interface for the key-value registry that receives
// container addresses.
//
// ## Implementations
//
// - etcd v2 keys API: `ip2kv-registry-etcd` crate
// - In-memory: [`MemoryRegistry`](crate::memory::MemoryRegistry)
//
// ## Usage
//
// ```rust,ignore
// use ip2kv_core::RegistryClient;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let registry = /* RegistryClient implementation */;
//
//     if registry.get("/net/db/ip").await?.as_deref() != Some("10.0.0.5") {
//         registry.set("/net/db/ip", "10.0.0.5").await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for key-value registry clients
///
/// # Trust Level: Untrusted
///
/// Registry clients execute single-shot requests against their endpoints.
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed requests (failures are reported per target)
/// - ❌ Decide whether a write is needed (owned by `SyncEngine`)
/// - ❌ Use compare-and-swap tokens (writes are last-writer-wins)
/// - ❌ Spawn tasks or threads
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Get the value stored at a key
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored value
    /// - `Ok(None)`: The key does not exist
    /// - `Err(Error)`: The registry could not be read
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Set the value at a key, overwriting unconditionally
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Value written
    /// - `Err(Error)`: The write failed
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Get the registry name (for logging/debugging)
    fn registry_name(&self) -> &'static str;
}

/// Helper trait for constructing registry clients from configuration
pub trait RegistryClientFactory: Send + Sync {
    /// Create a RegistryClient instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Registry configuration
    /// - `timeout_secs`: Per-request timeout
    fn create(
        &self,
        config: &crate::config::RegistryConfig,
        timeout_secs: u64,
    ) -> Result<Box<dyn RegistryClient>, crate::Error>;
}
