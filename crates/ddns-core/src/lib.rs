// # ddns-core
//
// Core library for the single-shot DDNS updater.
//
// ## Architecture Overview
//
// - **InterfaceSource**: Trait for enumerating interfaces and their addresses
// - **AddressFilter**: Policy selecting publicly registrable host addresses
// - **DnsProvider**: Trait for pushing a new value to a dynamic DNS record
// - **CacheStore**: Trait for the per-version "last applied" cache
// - **Reconciler**: One cache-compare-update pass over the detected addresses
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Policy lives here, platform and provider I/O live in plugin crates
// 2. **Single-Shot**: One pass per invocation, scheduling belongs to an external scheduler
// 3. **Explicit Configuration**: Everything the pass needs arrives through `DdnsConfig`
// 4. **Idempotency**: The cache prevents redundant remote calls

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod traits;

// Re-export core types for convenience
pub use address::{
    Address, AddressFilter, InterfaceAddresses, InterfaceRecord, IpVersion, ScanReport,
    ScanWarning,
};
pub use cache::{FileCacheStore, MemoryCacheStore};
pub use config::{CacheConfig, Credentials, DdnsConfig, PolicyConfig};
pub use error::{Error, Result};
pub use reconciler::{ReconcileReport, Reconciler, VersionOutcome};
pub use traits::{CacheStore, DnsProvider, InterfaceSource, RecordUpdate};
