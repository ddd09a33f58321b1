//! Configuration types for the DDNS updater
//!
//! Everything a reconciliation pass needs is carried by [`DdnsConfig`] and
//! handed to the [`Reconciler`](crate::Reconciler) at construction.

use crate::address::IpVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default interface (PPPoE uplink on OpenWrt-style routers)
pub const DEFAULT_INTERFACE: &str = "pppoe-wan";

/// Default DNSPod API host
pub const DEFAULT_ENDPOINT: &str = "dnspod.tencentcloudapi.com";

/// Default DNSPod record line
pub const DEFAULT_RECORD_LINE: &str = "默认";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Interface whose addresses are published
    #[serde(default = "default_interface")]
    pub interface_name: String,

    /// Zone the records live in (e.g. "example.com")
    pub domain: String,

    /// Host label inside the zone ("@" for the apex)
    #[serde(default = "default_sub_domain")]
    pub sub_domain: String,

    /// Provider record id of the A record; IPv4 is not managed when unset
    #[serde(default)]
    pub record_id_v4: Option<u64>,

    /// Provider record id of the AAAA record; IPv6 is not managed when unset
    #[serde(default)]
    pub record_id_v6: Option<u64>,

    /// Provider record line
    #[serde(default = "default_record_line")]
    pub record_line: String,

    /// API credentials
    pub credentials: Credentials,

    /// API host
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Cache slot locations
    #[serde(default)]
    pub cache: CacheConfig,

    /// Reconciliation and scanning policy
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the zone and credentials
    pub fn new(domain: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            interface_name: default_interface(),
            domain: domain.into(),
            sub_domain: default_sub_domain(),
            record_id_v4: None,
            record_id_v6: None,
            record_line: default_record_line(),
            credentials,
            endpoint: default_endpoint(),
            cache: CacheConfig::default(),
            policy: PolicyConfig::default(),
        }
    }

    /// Set the interface to inspect
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface_name = name.into();
        self
    }

    /// Set the host label
    pub fn with_sub_domain(mut self, sub_domain: impl Into<String>) -> Self {
        self.sub_domain = sub_domain.into();
        self
    }

    /// Set the record id for a version
    pub fn with_record_id(mut self, version: IpVersion, id: u64) -> Self {
        match version {
            IpVersion::V4 => self.record_id_v4 = Some(id),
            IpVersion::V6 => self.record_id_v6 = Some(id),
        }
        self
    }

    /// Set the cache slot locations
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the policy
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Record id for a version, `None` when that version is not managed
    pub fn record_id(&self, version: IpVersion) -> Option<u64> {
        match version {
            IpVersion::V4 => self.record_id_v4,
            IpVersion::V6 => self.record_id_v6,
        }
    }

    /// Fully-qualified record name, e.g. `home.example.com`
    pub fn fqdn(&self) -> String {
        fqdn(&self.sub_domain, &self.domain)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interface_name.trim().is_empty() {
            return Err(crate::Error::config("Interface name cannot be empty"));
        }

        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }

        if self.sub_domain.trim().is_empty() {
            return Err(crate::Error::config("Sub-domain cannot be empty (use \"@\" for the apex)"));
        }

        if self.record_id_v4.is_none() && self.record_id_v6.is_none() {
            return Err(crate::Error::config(
                "No record id configured; set at least one of the IPv4 or IPv6 record ids",
            ));
        }

        if self.record_line.trim().is_empty() {
            return Err(crate::Error::config("Record line cannot be empty"));
        }

        if self.endpoint.trim().is_empty() {
            return Err(crate::Error::config("API endpoint cannot be empty"));
        }

        self.credentials.validate()?;
        self.cache.validate()?;

        Ok(())
    }
}

/// Provider API credentials
///
/// The Debug implementation never prints the secret key.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub secret_id: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.secret_id.is_empty() {
            return Err(crate::Error::config("Secret id cannot be empty"));
        }
        if self.secret_key.is_empty() {
            return Err(crate::Error::config("Secret key cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

/// Locations of the per-version cache files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_v4")]
    pub v4_path: PathBuf,

    #[serde(default = "default_cache_v6")]
    pub v6_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            v4_path: default_cache_v4(),
            v6_path: default_cache_v6(),
        }
    }
}

impl CacheConfig {
    pub fn new(v4_path: impl Into<PathBuf>, v6_path: impl Into<PathBuf>) -> Self {
        Self {
            v4_path: v4_path.into(),
            v6_path: v6_path.into(),
        }
    }

    /// Both slots under one directory, with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            v4_path: dir.join(default_cache_v4()),
            v6_path: dir.join(default_cache_v6()),
        }
    }

    /// Slot file of a version
    pub fn path(&self, version: IpVersion) -> &Path {
        match version {
            IpVersion::V4 => &self.v4_path,
            IpVersion::V6 => &self.v6_path,
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.v4_path.as_os_str().is_empty() || self.v6_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Cache paths cannot be empty"));
        }
        if self.v4_path == self.v6_path {
            return Err(crate::Error::config(
                "IPv4 and IPv6 cache paths must differ",
            ));
        }
        Ok(())
    }
}

/// Reconciliation and scanning policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Only advance the cache when the remote update succeeded.
    ///
    /// Defaults to `false`: the cache is written after every update attempt,
    /// failed or not. A transient remote failure then leaves the cache ahead
    /// of the published record and later passes will not retry it until the
    /// address changes again or the cache file is removed.
    #[serde(default)]
    pub cache_only_on_success: bool,

    /// Only accept full-width (/32, /128) host addresses
    #[serde(default = "default_require_host_prefix")]
    pub require_host_prefix: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cache_only_on_success: false,
            require_host_prefix: default_require_host_prefix(),
        }
    }
}

/// Join a host label and a zone; `@` stands for the zone apex
pub fn fqdn(sub_domain: &str, domain: &str) -> String {
    if sub_domain == "@" {
        domain.to_string()
    } else {
        format!("{}.{}", sub_domain, domain)
    }
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_sub_domain() -> String {
    "@".to_string()
}

fn default_record_line() -> String {
    DEFAULT_RECORD_LINE.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_cache_v4() -> PathBuf {
    PathBuf::from("LAST_IP")
}

fn default_cache_v6() -> PathBuf {
    PathBuf::from("LAST_IP6")
}

fn default_require_host_prefix() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DdnsConfig {
        DdnsConfig::new("example.com", Credentials::new("AKIDexample", "secret"))
            .with_record_id(IpVersion::V4, 1001)
    }

    #[test]
    fn test_defaults() {
        let config = valid();
        assert_eq!(config.interface_name, "pppoe-wan");
        assert_eq!(config.sub_domain, "@");
        assert_eq!(config.record_line, "默认");
        assert_eq!(config.endpoint, "dnspod.tencentcloudapi.com");
        assert_eq!(config.cache.v4_path, PathBuf::from("LAST_IP"));
        assert_eq!(config.cache.v6_path, PathBuf::from("LAST_IP6"));
        assert!(!config.policy.cache_only_on_success);
        assert!(config.policy.require_host_prefix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fqdn() {
        assert_eq!(valid().fqdn(), "example.com");
        assert_eq!(valid().with_sub_domain("home").fqdn(), "home.example.com");
    }

    #[test]
    fn test_cache_slot_per_version() {
        let cache = CacheConfig::in_dir("/var/lib/ddns");
        assert_eq!(cache.path(IpVersion::V4), Path::new("/var/lib/ddns/LAST_IP"));
        assert_eq!(cache.path(IpVersion::V6), Path::new("/var/lib/ddns/LAST_IP6"));
    }

    #[test]
    fn test_requires_a_record_id() {
        let config = DdnsConfig::new("example.com", Credentials::new("id", "key"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_credentials() {
        let mut config = valid();
        config.credentials.secret_key.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shared_cache_path() {
        let config = valid().with_cache(CacheConfig::new("/tmp/ip", "/tmp/ip"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{
            "domain": "example.com",
            "record_id_v6": 2002,
            "credentials": { "secret_id": "id", "secret_key": "key" }
        }"#;

        let config: DdnsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interface_name, "pppoe-wan");
        assert_eq!(config.record_id(IpVersion::V4), None);
        assert_eq!(config.record_id(IpVersion::V6), Some(2002));
        assert!(config.policy.require_host_prefix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_key_not_exposed_in_debug() {
        let config = DdnsConfig::new("example.com", Credentials::new("AKIDexample", "very-secret-key"));
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("very-secret-key"));
        assert!(debug_str.contains("AKIDexample"));
    }
}
