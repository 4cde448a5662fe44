//! Plugin-based backend registry
//!
//! The registry lets container runtimes and registry clients be registered
//! by name at startup, so the binary never hardcodes which backends exist.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ip2kv_core::BackendRegistry;
//!
//! let backends = BackendRegistry::new();
//! ip2kv_runtime_docker::register(&backends);
//! ip2kv_registry_etcd::register(&backends);
//!
//! let runtime = backends.create_runtime(&config.runtime, 30)?;
//! let registry = backends.create_registry(&config.registry, 30)?;
//! ```

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{RegistryConfig, RuntimeConfig};
use crate::error::{Error, Result};
use crate::traits::{ContainerRuntime, ContainerRuntimeFactory, RegistryClient, RegistryClientFactory};

/// Registry of runtime and registry-client factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock allows concurrent reads and exclusive
/// writes.
#[derive(Default)]
pub struct BackendRegistry {
    /// Registered container runtime factories
    runtimes: RwLock<HashMap<String, Box<dyn ContainerRuntimeFactory>>>,

    /// Registered registry client factories
    registries: RwLock<HashMap<String, Box<dyn RegistryClientFactory>>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container runtime factory
    ///
    /// # Parameters
    ///
    /// - `name`: Runtime type name (e.g., "docker")
    /// - `factory`: Factory object for creating runtime instances
    pub fn register_runtime(&self, name: impl Into<String>, factory: Box<dyn ContainerRuntimeFactory>) {
        write(&self.runtimes).insert(name.into(), factory);
    }

    /// Register a registry client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Registry type name (e.g., "etcd")
    /// - `factory`: Factory object for creating client instances
    pub fn register_registry(&self, name: impl Into<String>, factory: Box<dyn RegistryClientFactory>) {
        write(&self.registries).insert(name.into(), factory);
    }

    /// Create a container runtime from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ContainerRuntime>)`: Created runtime
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_runtime(
        &self,
        config: &RuntimeConfig,
        timeout_secs: u64,
    ) -> Result<Box<dyn ContainerRuntime>> {
        let runtime_type = config.type_name();
        let runtimes = read(&self.runtimes);

        let factory = runtimes
            .get(runtime_type)
            .ok_or_else(|| Error::config(format!("Unknown runtime type: {}", runtime_type)))?;

        factory.create(config, timeout_secs)
    }

    /// Create a registry client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RegistryClient>)`: Created client
    /// - `Err(Error)`: If the type is not registered or creation fails
    pub fn create_registry(
        &self,
        config: &RegistryConfig,
        timeout_secs: u64,
    ) -> Result<Box<dyn RegistryClient>> {
        let registry_type = config.type_name();
        let registries = read(&self.registries);

        let factory = registries
            .get(registry_type)
            .ok_or_else(|| Error::config(format!("Unknown registry type: {}", registry_type)))?;

        factory.create(config, timeout_secs)
    }

    /// List all registered runtime types
    pub fn list_runtimes(&self) -> Vec<String> {
        read(&self.runtimes).keys().cloned().collect()
    }

    /// List all registered registry types
    pub fn list_registries(&self) -> Vec<String> {
        read(&self.registries).keys().cloned().collect()
    }

    /// Check if a runtime type is registered
    pub fn has_runtime(&self, name: &str) -> bool {
        read(&self.runtimes).contains_key(name)
    }

    /// Check if a registry type is registered
    pub fn has_registry(&self, name: &str) -> bool {
        read(&self.registries).contains_key(name)
    }
}

// Factories are inserted whole, so a poisoned map is still consistent
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
