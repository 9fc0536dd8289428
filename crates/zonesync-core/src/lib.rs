// # zonesync-core
//
// Core library for synchronizing DNS zones to provider APIs.
//
// ## Architecture Overview
//
// - **Zone / Record**: the desired and existing state, records as a sum type
// - **Change / Plan**: the difference between desired and existing state
// - **Batch**: bounded groups of bulk operations, submitted sequentially
// - **DnsProvider**: trait for reading and writing records via a provider API
// - **ZoneSynchronizer**: plans, applies and retries one zone at a time
// - **ProviderRegistry**: configuration-driven provider construction
//
// ## Design Principles
//
// 1. **Separation of Concerns**: planning is provider-neutral, providers only translate
// 2. **Pure Planning**: changes are computed from (desired, existing) with no hidden state
// 3. **Plugin-Based**: providers are registered by name, no hard-coded if-else
// 4. **Library-First**: all core functionality can be used as a library

pub mod batch;
pub mod change;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod traits;
pub mod zone;
pub mod zone_file;

// Re-export core types for convenience
pub use batch::{Batch, BatchKind, BatchProgress, BatchSummary, partition};
pub use change::{Change, Plan};
pub use config::{EngineConfig, ProviderConfig, SyncConfig};
pub use engine::{SyncEvent, SyncOutcome, ZoneSynchronizer};
pub use error::{Error, Result};
pub use record::{CaaValue, MxValue, Record, RecordData, RecordType, SrvValue};
pub use registry::ProviderRegistry;
pub use traits::{ApplyReport, DnsProvider, DnsProviderFactory};
pub use zone::Zone;
pub use zone_file::{load_zone_file, parse_zone};
