//! Test doubles and common utilities for contract tests
//!
//! This module provides deterministic stand-ins for the container runtime
//! and the registry so contract tests run without Docker or etcd.

#![allow(dead_code)]

use ip2kv_core::config::{SyncConfig, TargetSelection};
use ip2kv_core::error::{Error, Result};
use ip2kv_core::traits::{ContainerRuntime, ContainerSummary, RegistryClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeContainer {
    id: String,
    names: Vec<String>,
    address: String,
    running: bool,
}

/// A container runtime backed by an in-memory container table
///
/// Clones share the table and counters, so a test can mutate containers
/// after handing a clone to the engine.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    containers: Arc<Mutex<Vec<FakeContainer>>>,
    list_call_count: Arc<AtomicUsize>,
    inspected: Arc<Mutex<Vec<String>>>,
    fail_listing: Arc<AtomicBool>,
    fail_inspect: Arc<AtomicBool>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a running container; names are given unprefixed
    pub fn with_container(self, id: &str, names: &[&str], address: &str) -> Self {
        self.containers.lock().unwrap().push(FakeContainer {
            id: id.to_string(),
            names: names.iter().map(|n| format!("/{}", n)).collect(),
            address: address.to_string(),
            running: true,
        });
        self
    }

    /// Add a stopped container
    pub fn with_stopped(self, id: &str, names: &[&str], address: &str) -> Self {
        let runtime = self.with_container(id, names, address);
        runtime.stop(id);
        runtime
    }

    pub fn set_address(&self, id: &str, address: &str) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.iter_mut().find(|c| c.id == id) {
            c.address = address.to_string();
        }
    }

    pub fn stop(&self, id: &str) {
        let mut containers = self.containers.lock().unwrap();
        if let Some(c) = containers.iter_mut().find(|c| c.id == id) {
            c.running = false;
        }
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inspect(&self, fail: bool) {
        self.fail_inspect.store(fail, Ordering::SeqCst);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// IDs passed to inspect_address(), in call order
    pub fn inspected(&self) -> Vec<String> {
        self.inspected.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_running(&self) -> Result<Vec<ContainerSummary>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(Error::runtime("Cannot connect to the Docker daemon"));
        }

        Ok(self
            .containers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.running)
            .map(|c| ContainerSummary::new(c.id.clone(), c.names.clone()))
            .collect())
    }

    async fn inspect_address(&self, container_id: &str) -> Result<String> {
        self.inspected.lock().unwrap().push(container_id.to_string());
        if self.fail_inspect.load(Ordering::SeqCst) {
            return Err(Error::runtime("No such container"));
        }

        self.containers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == container_id)
            .map(|c| c.address.clone())
            .ok_or_else(|| Error::runtime(format!("No such container: {}", container_id)))
    }

    fn runtime_name(&self) -> &'static str {
        "fake"
    }
}

/// A registry that records every call and can be told to fail
#[derive(Clone, Default)]
pub struct MockRegistry {
    state: Arc<Mutex<HashMap<String, String>>>,
    get_call_count: Arc<AtomicUsize>,
    written: Arc<Mutex<Vec<(String, String)>>>,
    fail_reads: Arc<AtomicBool>,
    failing_write_keys: Arc<Mutex<Vec<String>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing_write_keys.lock().unwrap().push(key.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.state.lock().unwrap().get(key).cloned()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Successful and failed writes, in call order
    pub fn writes(&self) -> Vec<(String, String)> {
        self.written.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.written.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RegistryClient for MockRegistry {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::registry("connection refused"));
        }
        Ok(self.state.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.written
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));

        if self
            .failing_write_keys
            .lock()
            .unwrap()
            .iter()
            .any(|k| k == key)
        {
            return Err(Error::registry("cluster unavailable"));
        }

        self.state
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn registry_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a config for explicit targets under `/net`
pub fn named_config(identifiers: &[&str]) -> SyncConfig {
    SyncConfig::new("/net", TargetSelection::named(identifiers.iter().copied()))
}

/// Helper to create an all-containers config under `/net`
pub fn all_config() -> SyncConfig {
    SyncConfig::new("/net", TargetSelection::All)
}
