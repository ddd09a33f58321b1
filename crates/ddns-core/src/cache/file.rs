// # File Cache Store
//
// File-based implementation of CacheStore.
//
// ## File Format
//
// One plain-text file per IP version holding nothing but the address
// literal, without a trailing newline:
//
// ```text
// LAST_IP   -> 203.0.113.7
// LAST_IP6  -> 2001:4860::1
// ```
//
// Surrounding whitespace is ignored on read so a hand-edited file with a
// newline still compares equal. Writes go to a sibling `.tmp` file that is
// then renamed over the slot.

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::address::IpVersion;
use crate::config::CacheConfig;
use crate::traits::cache_store::CacheStore;

/// File-based cache store, one file per IP version
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::{CacheConfig, CacheStore, FileCacheStore, IpVersion};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new(&CacheConfig::in_dir("/var/lib/ddns")).await?;
///
///     store.write(IpVersion::V4, "203.0.113.7").await?;
///     assert_eq!(store.read(IpVersion::V4).await?.as_deref(), Some("203.0.113.7"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    slots: CacheConfig,
}

impl FileCacheStore {
    /// Create a file cache store
    ///
    /// Parent directories of both slots are created if missing. The slot
    /// files themselves are only created by the first write.
    pub async fn new(config: &CacheConfig) -> Result<Self, Error> {
        config.validate()?;

        for path in [&config.v4_path, &config.v6_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create cache directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            slots: config.clone(),
        })
    }

    /// Path of the slot for a version
    pub fn path(&self, version: IpVersion) -> &Path {
        self.slots.path(version)
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self, version: IpVersion) -> Result<Option<String>, Error> {
        let path = self.path(version);

        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = content.trim();
                if value.is_empty() {
                    tracing::debug!("Cache slot {} is empty", path.display());
                    Ok(None)
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache slot {} does not exist", path.display());
                Ok(None)
            }
            Err(e) => Err(Error::cache_read(format!(
                "Failed to read cache file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn write(&self, version: IpVersion, value: &str) -> Result<(), Error> {
        let path = self.path(version);
        let temp_path = Self::temp_path(path);

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(value.as_bytes()).await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache_write(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::cache_write(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache slot written: {}", path.display());
        Ok(())
    }
}
