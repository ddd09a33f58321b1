//! Single-shot reconciliation pass
//!
//! The Reconciler is responsible for:
//! - Looking up the addresses of the configured interface
//! - Comparing the first address of each IP version with its cache slot
//! - Updating the DNS record via DnsProvider when the value changed
//! - Writing the new value to the cache slot
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ InterfaceSource │─── addresses ───┐
//! └─────────────────┘                 │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  Reconciler  │
//!                            └──────────────┘
//!                                     │
//!                   ┌─────────────────┴─────────────────┐
//!                   │                                   │
//!                   ▼                                   ▼
//!           ┌──────────────┐                   ┌──────────────┐
//!           │  CacheStore  │                   │ DnsProvider  │
//!           │ (read/write) │                   │   (update)   │
//!           └──────────────┘                   └──────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Fetch addresses of `interface_name` (failure ends the pass)
//! 2. For the first address of each version: read its cache slot
//! 3. Same value → skip
//! 4. Different → `DnsProvider::update_record()`, failures are logged only
//! 5. Write the cache slot (see [`PolicyConfig::cache_only_on_success`])
//!
//! Nothing loops: recurring execution belongs to an external scheduler.
//!
//! [`PolicyConfig::cache_only_on_success`]: crate::PolicyConfig::cache_only_on_success

use crate::address::{Address, IpVersion, ScanWarning};
use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{CacheStore, DnsProvider, InterfaceSource, RecordUpdate};
use tracing::{debug, error, info, warn};

/// What happened to one IP version during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOutcome {
    /// Cache already held the detected value; no remote call
    Unchanged { value: String },

    /// Remote update succeeded
    Updated {
        previous: Option<String>,
        value: String,
        /// Whether the cache slot was written
        cached: bool,
    },

    /// Remote update failed
    Failed {
        previous: Option<String>,
        value: String,
        error: String,
        /// Whether the cache slot was advanced despite the failure
        cached: bool,
    },

    /// No record id configured for this version
    Unmanaged { value: String },
}

impl VersionOutcome {
    /// Detected address literal
    pub fn value(&self) -> &str {
        match self {
            VersionOutcome::Unchanged { value }
            | VersionOutcome::Updated { value, .. }
            | VersionOutcome::Failed { value, .. }
            | VersionOutcome::Unmanaged { value } => value,
        }
    }

    /// Whether a remote call was issued
    pub fn attempted(&self) -> bool {
        matches!(
            self,
            VersionOutcome::Updated { .. } | VersionOutcome::Failed { .. }
        )
    }
}

/// Summary of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub interface: String,
    pub v4: Option<VersionOutcome>,
    pub v6: Option<VersionOutcome>,
    /// Non-fatal problems reported by the interface scan
    pub warnings: Vec<ScanWarning>,
}

impl ReconcileReport {
    fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    /// Outcome for a version, `None` when no address of that version was found
    pub fn outcome(&self, version: IpVersion) -> Option<&VersionOutcome> {
        match version {
            IpVersion::V4 => self.v4.as_ref(),
            IpVersion::V6 => self.v6.as_ref(),
        }
    }

    /// Number of remote update calls issued
    pub fn remote_calls(&self) -> usize {
        [&self.v4, &self.v6]
            .into_iter()
            .flatten()
            .filter(|o| o.attempted())
            .count()
    }

    /// Whether any remote update failed
    pub fn has_failures(&self) -> bool {
        [&self.v4, &self.v6]
            .into_iter()
            .flatten()
            .any(|o| matches!(o, VersionOutcome::Failed { .. }))
    }

    fn slot(&mut self, version: IpVersion) -> &mut Option<VersionOutcome> {
        match version {
            IpVersion::V4 => &mut self.v4,
            IpVersion::V6 => &mut self.v6,
        }
    }
}

/// Single-shot DDNS reconciler
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run()`] once per invocation
/// 3. Drop
///
/// Calling `run()` again performs another independent pass; the cache makes
/// it a no-op when nothing changed.
pub struct Reconciler {
    /// Interface enumeration
    source: Box<dyn InterfaceSource>,

    /// DNS provider for updating records
    provider: Box<dyn DnsProvider>,

    /// Per-version "last applied" cache
    cache: Box<dyn CacheStore>,

    config: DdnsConfig,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `source`: Interface source implementation
    /// - `provider`: DNS provider implementation
    /// - `cache`: Cache store implementation
    /// - `config`: DDNS configuration (validated here)
    pub fn new(
        source: Box<dyn InterfaceSource>,
        provider: Box<dyn DnsProvider>,
        cache: Box<dyn CacheStore>,
        config: DdnsConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            source,
            provider,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &DdnsConfig {
        &self.config
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: The pass completed; remote and cache failures
    ///   are reported in the outcomes, not as errors
    /// - `Err(Error)`: Address retrieval failed; nothing was updated
    pub async fn run(&self) -> Result<ReconcileReport> {
        let interface = &self.config.interface_name;

        let found = match self.source.addresses_for_interface(interface).await {
            Ok(found) => found,
            Err(e) => {
                error!(
                    "Unable to get addresses of {} from {}: {}",
                    interface,
                    self.source.source_name(),
                    e
                );
                return Err(e);
            }
        };

        for warning in &found.warnings {
            warn!("Skipped part of interface scan: {}", warning);
        }

        if found.addresses.is_empty() {
            info!("No publishable address found on {}", interface);
        }

        let mut report = ReconcileReport::new(interface.clone());
        report.warnings = found.warnings;

        for address in &found.addresses {
            let slot = report.slot(address.version);
            if slot.is_some() {
                debug!(
                    "Ignoring additional {} address {} on {}",
                    address.version, address.ip, interface
                );
                continue;
            }

            *slot = Some(self.reconcile(address).await);
        }

        Ok(report)
    }

    /// Compare one address against its cache slot and update if needed
    async fn reconcile(&self, address: &Address) -> VersionOutcome {
        let version = address.version;
        let value = address.value();

        let Some(record_id) = self.config.record_id(version) else {
            debug!("No record id configured for {}, leaving {} alone", version, value);
            return VersionOutcome::Unmanaged { value };
        };

        let previous = match self.cache.read(version).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("{}; treating cached {} address as empty", e, version);
                None
            }
        };

        if previous.as_deref() == Some(value.as_str()) {
            debug!("{} address unchanged ({}), skipping update", version, value);
            return VersionOutcome::Unchanged { value };
        }

        let update = RecordUpdate {
            version,
            domain: self.config.domain.clone(),
            sub_domain: self.config.sub_domain.clone(),
            record_id,
            record_line: self.config.record_line.clone(),
            value: value.clone(),
        };

        info!(
            "Updating {} record {} via {}: {} -> {}",
            version.record_type(),
            update.fqdn(),
            self.provider.provider_name(),
            previous.as_deref().unwrap_or("<none>"),
            value
        );

        let result = self.provider.update_record(&update).await;
        if let Err(e) = &result {
            error!("Error updating {} address: {}", version, e);
        }

        let cached = if result.is_ok() || !self.config.policy.cache_only_on_success {
            self.write_cache(version, &value).await
        } else {
            debug!("Leaving cached {} address untouched after failed update", version);
            false
        };

        match result {
            Ok(()) => VersionOutcome::Updated {
                previous,
                value,
                cached,
            },
            Err(e) => VersionOutcome::Failed {
                previous,
                value,
                error: e.to_string(),
                cached,
            },
        }
    }

    /// Write a cache slot, logging instead of failing
    async fn write_cache(&self, version: IpVersion, value: &str) -> bool {
        match self.cache.write(version, value).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}
