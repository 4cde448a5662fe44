//! Container resolution
//!
//! The resolver turns a user-supplied identifier into a running container.
//! Matching runs in two passes over the running set:
//!
//! 1. Exact name match (the identifier is unprefixed, stored names carry `/`)
//! 2. Substring match against the canonical ID (partial and full IDs alike)
//!
//! A name match anywhere in the listing beats an ID substring match, so a
//! container named `cache` wins over another whose ID happens to contain
//! `cache`.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::key::truncate_id;
use crate::traits::{ContainerRuntime, ContainerSummary};

/// Find the container matching `identifier` in a listing
///
/// The identifier is matched as given; whitespace is stripped once, when
/// the target selection is built. Returns `None` for an empty identifier
/// or when nothing matches.
pub fn find_match<'a>(
    containers: &'a [ContainerSummary],
    identifier: &str,
) -> Option<&'a ContainerSummary> {
    if identifier.is_empty() {
        return None;
    }

    containers
        .iter()
        .find(|c| c.has_name(identifier))
        .or_else(|| containers.iter().find(|c| c.id.contains(identifier)))
}

/// Resolves identifiers against the running containers of a runtime
pub struct Resolver<'a> {
    runtime: &'a dyn ContainerRuntime,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a container runtime
    pub fn new(runtime: &'a dyn ContainerRuntime) -> Self {
        Self { runtime }
    }

    /// Resolve one identifier to a running container
    ///
    /// A listing error is logged and treated as a lookup miss.
    pub async fn resolve(&self, identifier: &str) -> Option<ContainerSummary> {
        let containers = match self.runtime.list_running().await {
            Ok(containers) => containers,
            Err(e) => {
                warn!(
                    "Failed to list containers from {}: {}",
                    self.runtime.runtime_name(),
                    e
                );
                return None;
            }
        };

        let found = find_match(&containers, identifier).cloned();
        match &found {
            Some(container) => debug!("Resolved {} to container {}", identifier, container.id),
            None => debug!("No running container matches {}", identifier),
        }
        found
    }

    /// List every running container once and index it for key composition
    pub async fn snapshot(&self) -> Result<ContainerIndex> {
        let containers = self.runtime.list_running().await?;
        Ok(ContainerIndex::new(containers))
    }
}

/// One listing of the running containers plus an ID → names map
///
/// Built once per all-containers run and read-only afterwards. The map is
/// keyed by the full ID: truncated IDs can collide, names must not.
#[derive(Debug, Clone)]
pub struct ContainerIndex {
    containers: Vec<ContainerSummary>,
    names_by_id: HashMap<String, String>,
}

impl ContainerIndex {
    /// Build an index from a runtime listing
    pub fn new(containers: Vec<ContainerSummary>) -> Self {
        let names_by_id = containers
            .iter()
            .filter_map(|c| c.joined_names().map(|names| (c.id.clone(), names)))
            .collect();

        Self {
            containers,
            names_by_id,
        }
    }

    /// Containers in listing order
    pub fn containers(&self) -> &[ContainerSummary] {
        &self.containers
    }

    /// Number of indexed containers
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Joined display names for a container ID, if it has any
    pub fn names_for(&self, container_id: &str) -> Option<&str> {
        self.names_by_id.get(container_id).map(String::as_str)
    }

    /// Key segment for a container: its names if known, else its truncated ID
    pub fn identity_segment<'s>(&'s self, container_id: &'s str) -> &'s str {
        self.names_for(container_id)
            .unwrap_or_else(|| truncate_id(container_id))
    }
}
