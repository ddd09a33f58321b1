// # Cache Store Trait
//
// Defines the interface for the "last applied" address cache.
//
// ## Purpose
//
// One slot per IP version holds the literal that was last pushed to the
// provider. Comparing against it keeps repeated invocations from issuing
// redundant remote calls.
//
// ## Implementations
//
// - File-based: one plain-text file per version (`FileCacheStore`)
// - In-memory: `MemoryCacheStore`, for tests and embedding

use async_trait::async_trait;

use crate::address::IpVersion;

/// Trait for cache store implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// Stores only read and write their slots; what to write and when is owned
/// by the `Reconciler`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the cached literal for a version
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The last applied value
    /// - `Ok(None)`: The slot is empty or does not exist yet
    /// - `Err(Error::CacheRead)`: The slot exists but cannot be read
    async fn read(&self, version: IpVersion) -> Result<Option<String>, crate::Error>;

    /// Overwrite the slot for a version with `value`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Written
    /// - `Err(Error::CacheWrite)`: Storage error
    async fn write(&self, version: IpVersion, value: &str) -> Result<(), crate::Error>;
}
