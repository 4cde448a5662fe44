//! Configuration types for ip2kv
//!
//! A [`SyncConfig`] is built once before any core logic runs and is
//! passed by value into the engine; nothing reads ambient state later.

use serde::{Deserialize, Serialize};

/// Default Docker endpoint
pub const DEFAULT_DOCKER_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Default etcd endpoint
pub const DEFAULT_ETCD_ENDPOINT: &str = "http://127.0.0.1:4001";

/// Default registry base key
pub const DEFAULT_BASE_KEY: &str = "/test";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Registry base key (e.g. "/net")
    pub base_key: String,

    /// Which containers to synchronize
    pub targets: TargetSelection,

    /// Treat a container without an address as success
    #[serde(default)]
    pub quiet: bool,

    /// Container runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration with default endpoints
    pub fn new(base_key: impl Into<String>, targets: TargetSelection) -> Self {
        Self {
            base_key: base_key.into(),
            targets,
            quiet: false,
            runtime: RuntimeConfig::default(),
            registry: RegistryConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Suppress the no-address failure
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the runtime configuration
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Set the registry configuration
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.base_key.is_empty() {
            return Err(crate::Error::config("Base key cannot be empty"));
        }
        if !self.base_key.starts_with('/') {
            return Err(crate::Error::config(format!(
                "Base key must start with '/'. Got: {}",
                self.base_key
            )));
        }

        self.targets.validate()?;
        self.runtime.validate()?;
        self.registry.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Containers selected for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "identifiers", rename_all = "snake_case")]
pub enum TargetSelection {
    /// Every running container
    All,
    /// Explicit identifiers (names, partial or full IDs)
    Named(Vec<String>),
}

impl TargetSelection {
    /// Build a selection from identifiers, trimming whitespace
    pub fn named<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Named(
            identifiers
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .collect(),
        )
    }

    /// Validate the selection
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            TargetSelection::All => Ok(()),
            TargetSelection::Named(identifiers) => {
                if identifiers.is_empty() {
                    return Err(crate::Error::config(
                        "No containers given. Pass container names or IDs, or select all containers",
                    ));
                }
                if identifiers.iter().any(|id| id.trim().is_empty()) {
                    return Err(crate::Error::config("Container identifier cannot be empty"));
                }
                if let Some(id) = identifiers.iter().find(|id| id.trim() != id.as_str()) {
                    return Err(crate::Error::config(format!(
                        "Container identifier has surrounding whitespace: {:?}",
                        id
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Container runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeConfig {
    /// Docker Engine API
    Docker {
        /// Endpoint (unix://, tcp:// or http://)
        endpoint: String,
    },

    /// Custom runtime
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RuntimeConfig {
    /// Validate the runtime configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RuntimeConfig::Docker { endpoint } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("Docker endpoint cannot be empty"));
                }
                Ok(())
            }
            RuntimeConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom runtime factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the runtime type name
    pub fn type_name(&self) -> &str {
        match self {
            RuntimeConfig::Docker { .. } => "docker",
            RuntimeConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig::Docker {
            endpoint: DEFAULT_DOCKER_ENDPOINT.to_string(),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryConfig {
    /// etcd v2 keys API
    Etcd {
        /// Cluster member URLs, tried in order
        endpoints: Vec<String>,
        /// Read but never write
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom registry
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistryConfig {
    /// Validate the registry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistryConfig::Etcd { endpoints, .. } => {
                if endpoints.is_empty() {
                    return Err(crate::Error::config("At least one etcd endpoint is required"));
                }
                for endpoint in endpoints {
                    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                        return Err(crate::Error::config(format!(
                            "etcd endpoint must use HTTP or HTTPS scheme. Got: {}",
                            endpoint
                        )));
                    }
                }
                Ok(())
            }
            RegistryConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom registry factory cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the registry type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistryConfig::Etcd { .. } => "etcd",
            RegistryConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig::Etcd {
            endpoints: vec![DEFAULT_ETCD_ENDPOINT.to_string()],
            dry_run: false,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the event channel
    ///
    /// When full, events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Per-request timeout handed to the runtime and registry clients
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_request_timeout_secs() -> u64 {
    30
}
