// # ip2kv-core
//
// Core library for publishing container addresses into a key-value registry.
//
// ## Architecture Overview
//
// A single invocation performs one discovery-and-update pass:
// - **ContainerRuntime**: Trait for listing running containers and reading their address
// - **RegistryClient**: Trait for reading and writing registry values
// - **Resolver**: Maps an identifier (name, partial or full ID) to a running container
// - **SyncEngine**: Composes the registry key and performs the compare-and-set
// - **BackendRegistry**: Plugin-based registry for runtime and registry factories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decision logic is separate from client implementations
// 2. **One Pass**: No watching, no background tasks, every target processed in order
// 3. **Idempotency**: A registry write happens only when the stored value differs
// 4. **Target Isolation**: A failure on one container never aborts its siblings
// 5. **No Retries**: Every external call is made once; failures are reported

pub mod backends;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod memory;
pub mod resolver;
pub mod traits;

// Re-export core types for convenience
pub use backends::BackendRegistry;
pub use config::{RegistryConfig, RuntimeConfig, SyncConfig, TargetSelection};
pub use engine::{RunReport, SyncEngine, SyncEvent, SyncOutcome};
pub use error::{Error, Result};
pub use key::{RegistryKey, truncate_id};
pub use memory::MemoryRegistry;
pub use resolver::{ContainerIndex, Resolver};
pub use traits::{ContainerRuntime, ContainerSummary, RegistryClient};
