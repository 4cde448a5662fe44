// # etcd Registry Client
//
// This crate provides an etcd v2 keys API implementation of `RegistryClient`.
//
// ## Behavior
//
// - One GET per read, one PUT per write (no TTL)
// - Missing keys (HTTP 404 / errorCode 100) read as absent
// - Cluster members are tried in order; the next member is only contacted
//   when the previous one refused the connection
// - HTTP timeout configured (30 seconds by default)
// - Dry-run mode for safe testing
// - ❌ NO retry logic (a failed request is reported as-is)
//
// ## API Reference
//
// - Read: GET `/v2/keys/:key`
// - Write: PUT `/v2/keys/:key` with form body `value=...`

use async_trait::async_trait;
use ip2kv_core::config::RegistryConfig;
use ip2kv_core::traits::{RegistryClient, RegistryClientFactory};
use ip2kv_core::{BackendRegistry, Error, Result};
use serde_json::Value;
use std::time::Duration;

/// etcd error code for a missing key
const KEY_NOT_FOUND: u64 = 100;

/// etcd registry client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, reads go to the cluster as usual but writes are
/// only logged.
#[derive(Debug, Clone)]
pub struct EtcdRegistry {
    /// Cluster member URLs, tried in order
    endpoints: Vec<String>,

    client: reqwest::Client,

    dry_run: bool,
}

impl EtcdRegistry {
    /// Create a new etcd client
    ///
    /// # Parameters
    ///
    /// - `endpoints`: Cluster member URLs (e.g. `http://127.0.0.1:4001`)
    /// - `timeout_secs`: Per-request HTTP timeout
    /// - `dry_run`: If true, skip PUT requests
    pub fn new(endpoints: Vec<String>, timeout_secs: u64, dry_run: bool) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::config("At least one etcd endpoint is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let endpoints = endpoints
            .into_iter()
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .collect();

        Ok(Self {
            endpoints,
            client,
            dry_run,
        })
    }

    /// Cluster member URLs in failover order
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Send a request to the first cluster member that accepts it
    async fn send<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&str) -> reqwest::RequestBuilder,
    {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            match build(endpoint).send().await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() => {
                    tracing::warn!("etcd member {} unreachable: {}", endpoint, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    return Err(Error::backend("etcd", format!("HTTP request failed: {}", e)));
                }
            }
        }

        Err(Error::backend(
            "etcd",
            match last_error {
                Some(e) => format!("No etcd member reachable: {}", e),
                None => "No etcd member configured".to_string(),
            },
        ))
    }
}

/// Build the keys API URL for a key
fn key_url(endpoint: &str, key: &str) -> String {
    if key.starts_with('/') {
        format!("{}/v2/keys{}", endpoint, key)
    } else {
        format!("{}/v2/keys/{}", endpoint, key)
    }
}

/// Extract `node.value` from a keys API response
fn node_value(body: &Value) -> Result<Option<String>> {
    let node = &body["node"];

    if node["dir"].as_bool().unwrap_or(false) {
        return Err(Error::backend("etcd", "Key is a directory"));
    }

    match &node["value"] {
        Value::String(value) => Ok(Some(value.clone())),
        Value::Null => Ok(None),
        other => Err(Error::backend(
            "etcd",
            format!("Invalid response format: node.value is {}", other),
        )),
    }
}

/// Parse an etcd error body into `(errorCode, message)`
fn error_detail(body: &str) -> Option<(u64, String)> {
    let json: Value = serde_json::from_str(body).ok()?;
    let code = json["errorCode"].as_u64()?;
    let message = json["message"].as_str().unwrap_or("unknown error");

    Some(match json["cause"].as_str() {
        Some(cause) => (code, format!("{} ({})", message, cause)),
        None => (code, message.to_string()),
    })
}

/// Map a non-success status to an error
fn status_error(status: reqwest::StatusCode, body: &str, action: &str) -> Error {
    let detail = error_detail(body)
        .map(|(code, message)| format!("errorCode {}: {}", code, message))
        .unwrap_or_else(|| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => Error::backend(
            "etcd",
            format!("Permission denied while trying to {}. Status: {}", action, status),
        ),
        500..=599 => Error::backend(
            "etcd",
            format!("etcd server error (transient): {} - {}", status, detail),
        ),
        _ => Error::backend("etcd", format!("Failed to {}: {} - {}", action, status, detail)),
    }
}

#[async_trait]
impl RegistryClient for EtcdRegistry {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        tracing::debug!("etcd GET {}", key);

        let response = self.send(|endpoint| self.client.get(key_url(endpoint, key))).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            if matches!(error_detail(&body), Some((KEY_NOT_FOUND, _))) {
                return Ok(None);
            }
            return Err(status_error(status, &body, "read key"));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::backend("etcd", format!("Failed to parse response: {}", e)))?;

        node_value(&body)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.dry_run {
            tracing::info!("[DRY-RUN] Would set {} = {}", key, value);
            return Ok(());
        }

        tracing::debug!("etcd PUT {} = {}", key, value);

        let response = self
            .send(|endpoint| {
                self.client
                    .put(key_url(endpoint, key))
                    .form(&[("value", value)])
            })
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &body, "write key"));
        }

        Ok(())
    }

    fn registry_name(&self) -> &'static str {
        "etcd"
    }
}

/// Factory for creating etcd clients
pub struct EtcdFactory;

impl RegistryClientFactory for EtcdFactory {
    fn create(&self, config: &RegistryConfig, timeout_secs: u64) -> Result<Box<dyn RegistryClient>> {
        match config {
            RegistryConfig::Etcd { endpoints, dry_run } => {
                if *dry_run {
                    tracing::warn!("etcd registry running in DRY-RUN mode - no keys will be written");
                }
                Ok(Box::new(EtcdRegistry::new(endpoints.clone(), timeout_secs, *dry_run)?))
            }
            _ => Err(Error::config("Invalid config for etcd registry")),
        }
    }
}

/// Register the etcd client with a backend registry
///
/// # Example
///
/// ```rust
/// use ip2kv_core::BackendRegistry;
///
/// let backends = BackendRegistry::new();
/// ip2kv_registry_etcd::register(&backends);
/// assert!(backends.has_registry("etcd"));
/// ```
pub fn register(registry: &BackendRegistry) {
    registry.register_registry("etcd", Box::new(EtcdFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_url() {
        assert_eq!(
            key_url("http://127.0.0.1:4001", "/net/db/ip"),
            "http://127.0.0.1:4001/v2/keys/net/db/ip"
        );
        assert_eq!(
            key_url("http://10.0.0.1:2379", "net/db/ip"),
            "http://10.0.0.1:2379/v2/keys/net/db/ip"
        );
    }

    #[test]
    fn test_endpoints_normalized() {
        let registry = EtcdRegistry::new(
            vec!["http://a:4001/".to_string(), " http://b:4001".to_string()],
            30,
            false,
        )
        .unwrap();

        assert_eq!(registry.endpoints(), ["http://a:4001", "http://b:4001"]);
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        assert!(EtcdRegistry::new(vec![], 30, false).is_err());
    }

    #[test]
    fn test_node_value() {
        let body = json!({
            "action": "get",
            "node": {"key": "/net/db/ip", "value": "10.0.0.5", "modifiedIndex": 7}
        });
        assert_eq!(node_value(&body).unwrap().as_deref(), Some("10.0.0.5"));

        let dir = json!({"action": "get", "node": {"key": "/net", "dir": true}});
        assert!(node_value(&dir).is_err());

        let missing = json!({"action": "get", "node": {"key": "/net/db/ip"}});
        assert_eq!(node_value(&missing).unwrap(), None);
    }

    #[test]
    fn test_error_detail() {
        let body = r#"{"errorCode":100,"message":"Key not found","cause":"/net/db","index":12}"#;
        assert_eq!(
            error_detail(body),
            Some((KEY_NOT_FOUND, "Key not found (/net/db)".to_string()))
        );
        assert_eq!(error_detail("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_status_error_messages() {
        let err = status_error(reqwest::StatusCode::FORBIDDEN, "", "write key");
        assert!(err.to_string().contains("Permission denied"));

        let body = r#"{"errorCode":102,"message":"Not a file","cause":"/net"}"#;
        let err = status_error(reqwest::StatusCode::FORBIDDEN, body, "write key");
        assert!(matches!(err, Error::Backend { ref backend, .. } if backend == "etcd"));

        let err = status_error(reqwest::StatusCode::BAD_GATEWAY, "upstream", "read key");
        assert!(err.to_string().contains("transient"));
    }

    #[test]
    fn test_dry_run_mode() {
        let endpoints = vec!["http://127.0.0.1:4001".to_string()];
        let dry = EtcdRegistry::new(endpoints.clone(), 30, true).unwrap();
        let live = EtcdRegistry::new(endpoints, 30, false).unwrap();

        assert!(dry.is_dry_run());
        assert!(!live.is_dry_run());
    }

    #[tokio::test]
    async fn test_dry_run_skips_network() {
        // Nothing listens here; a real PUT would fail.
        let registry = EtcdRegistry::new(vec!["http://127.0.0.1:1".to_string()], 2, true).unwrap();
        assert!(registry.set("/net/db/ip", "10.0.0.5").await.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_members_fail() {
        let registry = EtcdRegistry::new(
            vec!["http://127.0.0.1:1".to_string(), "http://127.0.0.1:2".to_string()],
            2,
            false,
        )
        .unwrap();

        let result = registry.get("/net/db/ip").await;
        assert!(matches!(result, Err(Error::Backend { .. })));
    }

    #[test]
    fn test_factory() {
        let config = RegistryConfig::Etcd {
            endpoints: vec!["http://127.0.0.1:4001".to_string()],
            dry_run: false,
        };
        let client = EtcdFactory.create(&config, 30).unwrap();
        assert_eq!(client.registry_name(), "etcd");

        let custom = RegistryConfig::Custom {
            factory: "consul".to_string(),
            config: Value::Null,
        };
        assert!(EtcdFactory.create(&custom, 30).is_err());
    }

    #[test]
    fn test_register() {
        let backends = BackendRegistry::new();
        register(&backends);
        assert!(backends.has_registry("etcd"));
    }
}
