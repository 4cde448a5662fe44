//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Resolving each target to a running container
//! - Composing the registry key for it
//! - Reading the container's address
//! - Writing the address only when the registry holds a different value
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   ContainerSummary   ┌──────────────┐
//! │ ContainerRuntime │─────────────────────▶│  SyncEngine  │
//! └──────────────────┘                      └──────────────┘
//!                                                   │
//!                   ┌───────────────────────────────┼─────────────────┐
//!                   ▼                               ▼                 ▼
//!           ┌──────────────┐               ┌────────────────┐   ┌───────────┐
//!           │   Resolver   │               │ RegistryClient │   │  Events   │
//!           │  (match id)  │               │  (get / set)   │   │ (notify)  │
//!           └──────────────┘               └────────────────┘   └───────────┘
//! ```
//!
//! ## Per-Target Flow
//!
//! ```text
//! Unresolved ─▶ Resolved ─▶ AddressKnown ─▶ Unchanged | Updated | WriteFailed
//!     │            │
//!     ▼            ▼
//!  NotFound    NoAddress
//! ```
//!
//! Targets are processed one after another. Every terminal state is
//! recorded in the [`RunReport`]; no target can abort its siblings.

use std::fmt;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, trace, warn};

use crate::config::{SyncConfig, TargetSelection};
use crate::error::Result;
use crate::key::{RegistryKey, truncate_id};
use crate::resolver::Resolver;
use crate::traits::{ContainerRuntime, RegistryClient};

/// Terminal state of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No running container matches the identifier
    NotFound {
        target: String,
    },

    /// The container has no address (or could not be inspected)
    NoAddress {
        target: String,
        container_id: String,
        /// Quiet mode: reported, but not a failure
        suppressed: bool,
    },

    /// The registry already holds the address
    Unchanged {
        target: String,
        key: String,
        address: String,
    },

    /// The address was written
    Updated {
        target: String,
        key: String,
        address: String,
        previous: Option<String>,
    },

    /// The registry write failed
    WriteFailed {
        target: String,
        key: String,
        address: String,
        error: String,
    },
}

impl SyncOutcome {
    /// The identifier (or short ID) this outcome belongs to
    pub fn target(&self) -> &str {
        match self {
            SyncOutcome::NotFound { target }
            | SyncOutcome::NoAddress { target, .. }
            | SyncOutcome::Unchanged { target, .. }
            | SyncOutcome::Updated { target, .. }
            | SyncOutcome::WriteFailed { target, .. } => target,
        }
    }

    /// Whether this outcome should fail the run
    pub fn is_failure(&self) -> bool {
        match self {
            SyncOutcome::NotFound { .. } | SyncOutcome::WriteFailed { .. } => true,
            SyncOutcome::NoAddress { suppressed, .. } => !suppressed,
            SyncOutcome::Unchanged { .. } | SyncOutcome::Updated { .. } => false,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::NotFound { target } => {
                write!(f, "{}: container does not exist", target)
            }
            SyncOutcome::NoAddress { target, .. } => {
                write!(f, "{}: no IP address found, skipped", target)
            }
            SyncOutcome::Unchanged { target, key, address } => {
                write!(f, "{}: {} already set to {}", target, key, address)
            }
            SyncOutcome::Updated {
                target,
                key,
                address,
                previous: Some(previous),
            } => write!(f, "{}: {} updated to {} (was {})", target, key, address, previous),
            SyncOutcome::Updated {
                target,
                key,
                address,
                previous: None,
            } => write!(f, "{}: {} set to {}", target, key, address),
            SyncOutcome::WriteFailed {
                target, key, error, ..
            } => write!(f, "{}: failed to set {}: {}", target, key, error),
        }
    }
}

/// Aggregated outcomes of one run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    outcomes: Vec<SyncOutcome>,
}

impl RunReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a target outcome
    pub fn push(&mut self, outcome: SyncOutcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes, in processing order
    pub fn outcomes(&self) -> &[SyncOutcome] {
        &self.outcomes
    }

    /// Number of targets written
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { .. }))
    }

    /// Number of targets left untouched because the value matched
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Unchanged { .. }))
    }

    /// Number of failed targets
    pub fn failed(&self) -> usize {
        self.count(SyncOutcome::is_failure)
    }

    /// True when no target failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Run started
    Started {
        all_containers: bool,
    },

    /// A target was matched to a running container
    TargetResolved {
        target: String,
        container_id: String,
        key: String,
    },

    /// A target reached its terminal state
    TargetFinished(SyncOutcome),

    /// Run finished
    Finished {
        updated: usize,
        unchanged: usize,
        failed: usize,
    },
}

/// Core sync engine
///
/// One engine performs one discovery-and-update pass per [`run`](Self::run)
/// call. It holds no state between targets apart from the read-only
/// container index built in all-containers mode.
pub struct SyncEngine {
    /// Container runtime for listing and inspection
    runtime: Box<dyn ContainerRuntime>,

    /// Registry receiving the addresses
    registry: Box<dyn RegistryClient>,

    /// Registry base key
    base_key: String,

    /// Containers to process
    targets: TargetSelection,

    /// Missing address is not a failure
    quiet: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        runtime: Box<dyn ContainerRuntime>,
        registry: Box<dyn RegistryClient>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            runtime,
            registry,
            base_key: config.base_key,
            targets: config.targets,
            quiet: config.quiet,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one pass over the configured targets
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: Every target reached a terminal state
    /// - `Err(Error)`: All-containers mode could not list the runtime
    pub async fn run(&self) -> Result<RunReport> {
        let all_containers = matches!(self.targets, TargetSelection::All);
        self.emit_event(SyncEvent::Started { all_containers });

        let report = match &self.targets {
            TargetSelection::All => self.sync_all().await?,
            TargetSelection::Named(identifiers) => {
                let mut report = RunReport::new();
                for identifier in identifiers {
                    report.push(self.sync_target(identifier).await);
                }
                report
            }
        };

        info!(
            "Sync finished: {} updated, {} unchanged, {} failed",
            report.updated(),
            report.unchanged(),
            report.failed()
        );
        self.emit_event(SyncEvent::Finished {
            updated: report.updated(),
            unchanged: report.unchanged(),
            failed: report.failed(),
        });

        Ok(report)
    }

    /// Synchronize one explicitly named container
    ///
    /// A name match keys on that name. A container found by ID keys on its
    /// own names, or its truncated ID, exactly as an all-containers run
    /// would.
    pub async fn sync_target(&self, identifier: &str) -> SyncOutcome {
        let resolver = Resolver::new(self.runtime.as_ref());

        let outcome = match resolver.resolve(identifier).await {
            Some(container) => {
                // Name matches run first, so only a name hit carries the identifier
                let segment = if container.has_name(identifier) {
                    identifier.to_string()
                } else {
                    container.identity_segment()
                };
                let key = RegistryKey::compose(&self.base_key, &segment);
                self.emit_event(SyncEvent::TargetResolved {
                    target: identifier.to_string(),
                    container_id: container.id.clone(),
                    key: key.to_string(),
                });
                self.reconcile(identifier, &container.id, &key).await
            }
            None => {
                warn!("Container {} does not exist", identifier);
                SyncOutcome::NotFound {
                    target: identifier.to_string(),
                }
            }
        };

        self.emit_event(SyncEvent::TargetFinished(outcome.clone()));
        outcome
    }

    /// Synchronize every running container
    ///
    /// The runtime is listed once; containers are processed in listing
    /// order, which is whatever order the runtime returns.
    pub async fn sync_all(&self) -> Result<RunReport> {
        let index = Resolver::new(self.runtime.as_ref()).snapshot().await?;
        debug!("Found {} running containers", index.len());

        let mut report = RunReport::new();
        for container in index.containers() {
            let target = truncate_id(&container.id);
            let key = RegistryKey::compose(&self.base_key, index.identity_segment(&container.id));

            self.emit_event(SyncEvent::TargetResolved {
                target: target.to_string(),
                container_id: container.id.clone(),
                key: key.to_string(),
            });

            let outcome = self.reconcile(target, &container.id, &key).await;
            self.emit_event(SyncEvent::TargetFinished(outcome.clone()));
            report.push(outcome);
        }

        Ok(report)
    }

    /// Read the address, compare it with the registry and write if needed
    ///
    /// At most one registry read and one registry write.
    async fn reconcile(&self, target: &str, container_id: &str, key: &RegistryKey) -> SyncOutcome {
        let address = match self.runtime.inspect_address(container_id).await {
            Ok(address) => address.trim().to_string(),
            Err(e) => {
                warn!("Failed to inspect container {}: {}", target, e);
                String::new()
            }
        };

        if address.is_empty() {
            if self.quiet {
                info!("No IP address found for container {}, skipping", target);
            } else {
                warn!("No IP address found for container {}, skipping", target);
            }
            return SyncOutcome::NoAddress {
                target: target.to_string(),
                container_id: container_id.to_string(),
                suppressed: self.quiet,
            };
        }
        info!("Found IP {} for container {}", address, target);

        // A failed read and a missing key both mean "no current value"
        let current = match self.registry.get(key.as_str()).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Could not read {} from {}: {}. Treating as unset",
                    key,
                    self.registry.registry_name(),
                    e
                );
                None
            }
        };

        if current.as_deref() == Some(address.as_str()) {
            info!("Current value of {} matches {}, no change needed", key, address);
            return SyncOutcome::Unchanged {
                target: target.to_string(),
                key: key.to_string(),
                address,
            };
        }

        if let Some(previous) = &current {
            info!("Found current value for {}: {}. Updating...", key, previous);
        }

        match self.registry.set(key.as_str(), &address).await {
            Ok(()) => {
                info!("Set {} as new value for {}", address, key);
                SyncOutcome::Updated {
                    target: target.to_string(),
                    key: key.to_string(),
                    address,
                    previous: current,
                }
            }
            Err(e) => {
                error!("Failed to set {} for {}: {}", address, key, e);
                SyncOutcome::WriteFailed {
                    target: target.to_string(),
                    key: key.to_string(),
                    address,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Emit an engine event
    ///
    /// Never blocks: a full channel drops the event with a warning, a
    /// closed channel means nobody is listening.
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Event receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_address(suppressed: bool) -> SyncOutcome {
        SyncOutcome::NoAddress {
            target: "db".to_string(),
            container_id: "abc".to_string(),
            suppressed,
        }
    }

    #[test]
    fn test_failure_classification() {
        assert!(SyncOutcome::NotFound { target: "db".to_string() }.is_failure());
        assert!(no_address(false).is_failure());
        assert!(!no_address(true).is_failure());
        assert!(
            SyncOutcome::WriteFailed {
                target: "db".to_string(),
                key: "/net/db/ip".to_string(),
                address: "10.0.0.5".to_string(),
                error: "down".to_string(),
            }
            .is_failure()
        );
    }

    #[test]
    fn test_report_counters() {
        let mut report = RunReport::new();
        assert!(report.is_success());

        report.push(SyncOutcome::Updated {
            target: "db".to_string(),
            key: "/net/db/ip".to_string(),
            address: "10.0.0.5".to_string(),
            previous: None,
        });
        report.push(SyncOutcome::Unchanged {
            target: "web".to_string(),
            key: "/net/web/ip".to_string(),
            address: "10.0.0.6".to_string(),
        });
        report.push(no_address(true));
        assert!(report.is_success());

        report.push(SyncOutcome::NotFound { target: "gone".to_string() });
        assert_eq!(report.updated(), 1);
        assert_eq!(report.unchanged(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        assert_eq!(report.outcomes()[3].target(), "gone");
    }

    #[test]
    fn test_status_lines() {
        let updated = SyncOutcome::Updated {
            target: "db".to_string(),
            key: "/net/db/ip".to_string(),
            address: "10.0.0.9".to_string(),
            previous: Some("10.0.0.5".to_string()),
        };
        assert_eq!(
            updated.to_string(),
            "db: /net/db/ip updated to 10.0.0.9 (was 10.0.0.5)"
        );
        assert_eq!(
            SyncOutcome::NotFound { target: "x".to_string() }.to_string(),
            "x: container does not exist"
        );
    }
}
