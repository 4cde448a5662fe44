// # Memory Registry
//
// In-memory implementation of RegistryClient.
//
// ## Purpose
//
// Provides a registry that lives only as long as the process. Useful for
// tests, embedding, and dry runs where no external registry is available.
//
// Clones share the same map and counters, so a test can keep a handle
// while the engine owns another.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::RegistryClient;

/// In-memory registry client
///
/// # Example
///
/// ```rust,no_run
/// use ip2kv_core::MemoryRegistry;
/// use ip2kv_core::traits::RegistryClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = MemoryRegistry::new();
///
///     registry.set("/net/db/ip", "10.0.0.5").await?;
///
///     let value = registry.get("/net/db/ip").await?;
///     assert_eq!(value.as_deref(), Some("10.0.0.5"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<RwLock<HashMap<String, String>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    /// Read a value without counting it as a client read
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    /// Number of keys stored
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Number of `get` calls served
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls served
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn registry_name(&self) -> &'static str {
        "memory"
    }
}
