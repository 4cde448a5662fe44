//! Core traits for ip2kv
//!
//! This module defines the abstract interfaces the sync engine talks to.
//!
//! - [`ContainerRuntime`]: List running containers and read their address
//! - [`RegistryClient`]: Read and write key-value pairs

pub mod container_runtime;
pub mod registry_client;

pub use container_runtime::{ContainerRuntime, ContainerRuntimeFactory, ContainerSummary};
pub use registry_client::{RegistryClient, RegistryClientFactory};
