// # Docker Container Runtime
//
// This crate provides a Docker Engine implementation of `ContainerRuntime`.
//
// ## Behavior
//
// - Lists running containers only (`all = false`)
// - Reads the address from `NetworkSettings.IPAddress`, falling back to the
//   first network (by name) that reports an IPv4, then a global IPv6 address
// - Never starts, stops or modifies containers
// - ❌ NO retry logic (failures are reported per target by the engine)
//
// ## Endpoints
//
// - `unix:///var/run/docker.sock` (default) or a bare socket path
// - `tcp://host:2375` / `http://host:2375`

use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerInspectResponse;
use bollard::{API_DEFAULT_VERSION, Docker};
use ip2kv_core::config::RuntimeConfig;
use ip2kv_core::traits::{ContainerRuntime, ContainerRuntimeFactory, ContainerSummary};
use ip2kv_core::{BackendRegistry, Error, Result};

/// How to reach the Docker daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    /// Unix domain socket path
    Unix(String),
    /// Plain HTTP address (`host:port`)
    Http(String),
}

impl DockerEndpoint {
    /// Parse an endpoint string
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();

        if let Some(path) = endpoint.strip_prefix("unix://") {
            return Ok(Self::Unix(path.to_string()));
        }
        if endpoint.starts_with('/') {
            return Ok(Self::Unix(endpoint.to_string()));
        }
        if let Some(addr) = endpoint
            .strip_prefix("tcp://")
            .or_else(|| endpoint.strip_prefix("http://"))
        {
            return Ok(Self::Http(addr.to_string()));
        }

        Err(Error::config(format!(
            "Unsupported Docker endpoint: {}. Use unix:// or tcp://",
            endpoint
        )))
    }
}

/// Docker Engine container runtime
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to a Docker daemon
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Endpoint string (unix://, tcp:// or http://)
    /// - `timeout_secs`: Per-request timeout
    pub fn connect(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let docker = match DockerEndpoint::parse(endpoint)? {
            DockerEndpoint::Unix(path) => {
                Docker::connect_with_unix(&path, timeout_secs, API_DEFAULT_VERSION)
            }
            DockerEndpoint::Http(addr) => {
                Docker::connect_with_http(&addr, timeout_secs, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| Error::backend("docker", format!("Failed to connect to {}: {}", endpoint, e)))?;

        tracing::debug!("Docker client configured for {}", endpoint);
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> Result<Vec<ContainerSummary>> {
        let opts = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(opts))
            .await
            .map_err(|e| Error::runtime(format!("Failed to list containers: {}", e)))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                Some(ContainerSummary::new(id, c.names.unwrap_or_default()))
            })
            .collect())
    }

    async fn inspect_address(&self, container_id: &str) -> Result<String> {
        let detail = self
            .docker
            .inspect_container(container_id, None)
            .await
            .map_err(|e| Error::runtime(format!("Failed to inspect {}: {}", container_id, e)))?;

        Ok(container_address(&detail))
    }

    fn runtime_name(&self) -> &'static str {
        "docker"
    }
}

/// Extract the container's address from an inspect response
///
/// Returns an empty string when no address is assigned.
fn container_address(detail: &ContainerInspectResponse) -> String {
    let Some(settings) = &detail.network_settings else {
        return String::new();
    };

    if let Some(ip) = settings.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
        return ip.to_string();
    }

    let Some(networks) = &settings.networks else {
        return String::new();
    };

    let mut names: Vec<&String> = networks.keys().collect();
    names.sort();

    let ipv4 = names
        .iter()
        .filter_map(|name| networks[*name].ip_address.as_deref())
        .find(|ip| !ip.is_empty());
    let ipv6 = || {
        names
            .iter()
            .filter_map(|name| networks[*name].global_ipv6_address.as_deref())
            .find(|ip| !ip.is_empty())
    };

    ipv4.or_else(ipv6).unwrap_or_default().to_string()
}

/// Factory for creating Docker runtimes
pub struct DockerFactory;

impl ContainerRuntimeFactory for DockerFactory {
    fn create(&self, config: &RuntimeConfig, timeout_secs: u64) -> Result<Box<dyn ContainerRuntime>> {
        match config {
            RuntimeConfig::Docker { endpoint } => {
                Ok(Box::new(DockerRuntime::connect(endpoint, timeout_secs)?))
            }
            _ => Err(Error::config("Invalid config for Docker runtime")),
        }
    }
}

/// Register the Docker runtime with a backend registry
///
/// # Example
///
/// ```rust
/// use ip2kv_core::BackendRegistry;
///
/// let backends = BackendRegistry::new();
/// ip2kv_runtime_docker::register(&backends);
/// assert!(backends.has_runtime("docker"));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_runtime("docker", Box::new(DockerFactory));
}
