// # ip2kv - publish container addresses
//
// Thin integration layer: parses flags, installs logging, registers the
// built-in backends and runs one `SyncEngine` pass. All sync logic lives in
// ip2kv-core.
//
// ## Configuration
//
// Every flag can also be set from the environment:
//
// - `IP2KV_DOCKER_ENDPOINT`: Docker endpoint (unix:// or tcp://)
// - `IP2KV_ETCD_ENDPOINTS`: Comma-separated etcd members
// - `IP2KV_BASE_KEY`: Registry base key
// - `IP2KV_ALL`: Update every running container
// - `IP2KV_QUIET`: A container without an address is not an error
// - `IP2KV_DRY_RUN`: Read the registry but never write it
// - `IP2KV_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// ip2kv -e http://10.0.0.1:2379,http://10.0.0.2:2379 -k /services db web
// ip2kv --all --quiet
// ```

use anyhow::{Context, Result};
use clap::Parser;
use ip2kv_core::config::{
    DEFAULT_BASE_KEY, DEFAULT_DOCKER_ENDPOINT, DEFAULT_ETCD_ENDPOINT, RegistryConfig, RuntimeConfig,
};
use ip2kv_core::{BackendRegistry, RunReport, SyncConfig, SyncEngine, SyncOutcome, TargetSelection};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Every target succeeded
/// - 1: Configuration or startup error
/// - 2: A target failed, or the containers could not be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ip2kvExitCode {
    Success = 0,
    ConfigError = 1,
    SyncFailed = 2,
}

impl From<Ip2kvExitCode> for ExitCode {
    fn from(code: Ip2kvExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "ip2kv",
    version,
    about = "Publish container IP addresses to etcd under <base-key>/<container>/ip"
)]
struct Cli {
    /// Docker endpoint
    #[arg(short = 'd', long = "docker-endpoint", env = "IP2KV_DOCKER_ENDPOINT", default_value = DEFAULT_DOCKER_ENDPOINT)]
    docker_endpoint: String,

    /// Comma-separated etcd endpoints
    #[arg(
        short = 'e',
        long = "etcd-endpoints",
        env = "IP2KV_ETCD_ENDPOINTS",
        default_value = DEFAULT_ETCD_ENDPOINT,
        value_delimiter = ','
    )]
    etcd_endpoints: Vec<String>,

    /// Base key for the registry entries
    #[arg(short = 'k', long = "base-key", env = "IP2KV_BASE_KEY", default_value = DEFAULT_BASE_KEY)]
    base_key: String,

    /// Update all running containers
    #[arg(short = 'a', long = "all", env = "IP2KV_ALL")]
    all: bool,

    /// Do not fail on containers without an IP address
    #[arg(short = 'q', long = "quiet", env = "IP2KV_QUIET")]
    quiet: bool,

    /// Read the registry but never write it
    #[arg(long = "dry-run", env = "IP2KV_DRY_RUN")]
    dry_run: bool,

    /// Log level
    #[arg(long = "log-level", env = "IP2KV_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Container names or IDs (ignored with --all)
    containers: Vec<String>,
}

impl Cli {
    /// Build the immutable sync configuration
    fn into_config(self) -> SyncConfig {
        let targets = if self.all {
            TargetSelection::All
        } else {
            TargetSelection::named(self.containers)
        };

        let endpoints = self
            .etcd_endpoints
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        SyncConfig::new(self.base_key, targets)
            .with_quiet(self.quiet)
            .with_runtime(RuntimeConfig::Docker {
                endpoint: self.docker_endpoint,
            })
            .with_registry(RegistryConfig::Etcd {
                endpoints,
                dry_run: self.dry_run,
            })
    }
}

/// Parse a log level name
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Log level '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also land here
            return if e.use_stderr() {
                Ip2kvExitCode::ConfigError.into()
            } else {
                Ip2kvExitCode::Success.into()
            };
        }
    };

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Ip2kvExitCode::ConfigError.into();
        }
    };

    if cli.all && !cli.containers.is_empty() {
        eprintln!("WARNING: --all given, ignoring {} container argument(s)", cli.containers.len());
    }

    let config = cli.into_config();
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return Ip2kvExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return Ip2kvExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return Ip2kvExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Wire up the backends and run one pass
async fn run(config: SyncConfig) -> Ip2kvExitCode {
    let engine = match build_engine(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return Ip2kvExitCode::ConfigError;
        }
    };

    match engine.run().await {
        Ok(report) => {
            log_report(&report);
            exit_code_for(&report)
        }
        Err(e) => {
            error!("Sync aborted: {}", e);
            Ip2kvExitCode::SyncFailed
        }
    }
}

fn build_engine(config: SyncConfig) -> Result<SyncEngine> {
    let backends = BackendRegistry::new();

    #[cfg(feature = "docker")]
    ip2kv_runtime_docker::register(&backends);

    #[cfg(feature = "etcd")]
    ip2kv_registry_etcd::register(&backends);

    let timeout = config.engine.request_timeout_secs;
    let runtime = backends
        .create_runtime(&config.runtime, timeout)
        .context("Failed to create container runtime")?;
    let registry = backends
        .create_registry(&config.registry, timeout)
        .context("Failed to create registry client")?;

    info!(
        "Using {} runtime and {} registry under {}",
        runtime.runtime_name(),
        registry.registry_name(),
        config.base_key
    );

    // Status lines come from the report, so nobody listens for events
    let (engine, events) = SyncEngine::new(runtime, registry, config)?;
    drop(events);

    Ok(engine)
}

/// Log one status line per target
fn log_report(report: &RunReport) {
    for outcome in report.outcomes() {
        match outcome {
            SyncOutcome::WriteFailed { .. } => error!("{}", outcome),
            o if o.is_failure() => warn!("{}", o),
            o => info!("{}", o),
        }
    }
}

fn exit_code_for(report: &RunReport) -> Ip2kvExitCode {
    if report.is_success() {
        Ip2kvExitCode::Success
    } else {
        Ip2kvExitCode::SyncFailed
    }
}
