// # DNS Provider Trait
//
// Defines the interface for updating a dynamic DNS record.
//
// ## Implementations
//
// - DNSPod (Tencent Cloud API 3.0): `ddns-provider-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, IpVersion, RecordUpdate};
//
// let update = RecordUpdate {
//     version: IpVersion::V4,
//     domain: "example.com".into(),
//     sub_domain: "home".into(),
//     record_id: 1001,
//     record_line: "默认".into(),
//     value: "203.0.113.7".into(),
// };
// provider.update_record(&update).await?;
// ```

use async_trait::async_trait;

use crate::address::IpVersion;

/// One dynamic-record update request
///
/// Everything but `value` comes from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub version: IpVersion,
    pub domain: String,
    pub sub_domain: String,
    pub record_id: u64,
    pub record_line: String,
    pub value: String,
}

impl RecordUpdate {
    /// Fully-qualified record name, for logging
    pub fn fqdn(&self) -> String {
        crate::config::fqdn(&self.sub_domain, &self.domain)
    }
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoint only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (a failed update waits for the next invocation)
/// - ❌ Access the cache (owned by `Reconciler`)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Spawn tasks or threads
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Set the record described by `update` to `update.value`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the new value
    /// - `Err(Error)`: Transport, authentication or API error
    async fn update_record(&self, update: &RecordUpdate) -> Result<(), crate::Error>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
