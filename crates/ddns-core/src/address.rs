//! Address model and selection policy
//!
//! The scanner produces [`InterfaceRecord`]s holding only the addresses that
//! [`AddressFilter`] accepts. A host address is worth registering when it is
//! global unicast and, by default, carries a full-width prefix (/32 or /128).
//! IPv6 addresses must also fall inside the global unicast allocation block
//! `2000::/3`, which keeps transition and other special ranges reported as
//! "global" by the platform out of DNS.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// IP version (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of the given address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }

    /// Full address width in bits
    pub fn width(self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }

    /// DNS record type carrying this version
    pub fn record_type(self) -> &'static str {
        match self {
            IpVersion::V4 => "A",
            IpVersion::V6 => "AAAA",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("v4"),
            IpVersion::V6 => f.write_str("v6"),
        }
    }
}

/// A single detected address tagged with its version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub version: IpVersion,
    pub ip: IpAddr,
}

impl Address {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            version: IpVersion::of(&ip),
            ip,
        }
    }

    /// Textual literal, the form stored in the cache and sent to the provider
    pub fn value(&self) -> String {
        self.ip.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ip, self.version)
    }
}

/// Accepted addresses of one administratively-up interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    pub addresses: Vec<Address>,
}

impl InterfaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addresses: Vec::new(),
        }
    }
}

/// A per-interface problem that did not fail the scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Interface name, or the index rendered as `#<n>` when the name is unknown
    pub interface: String,
    pub message: String,
}

impl ScanWarning {
    pub fn new(interface: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.interface, self.message)
    }
}

/// Result of a full interface scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub interfaces: Vec<InterfaceRecord>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// Narrow the report to a single interface.
    ///
    /// An unknown name yields no addresses rather than an error. Warnings are
    /// kept in full since a skipped interface may be the one that was asked for.
    pub fn into_interface(self, name: &str) -> InterfaceAddresses {
        let addresses = self
            .interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .map(|iface| iface.addresses)
            .unwrap_or_default();

        InterfaceAddresses {
            addresses,
            warnings: self.warnings,
        }
    }
}

/// Addresses of one interface, as returned by the by-name lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddresses {
    pub addresses: Vec<Address>,
    pub warnings: Vec<ScanWarning>,
}

/// Address acceptance policy applied by interface sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFilter {
    require_host_prefix: bool,
}

impl Default for AddressFilter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AddressFilter {
    /// Create a filter
    ///
    /// With `require_host_prefix` unset, subnet-prefixed addresses (e.g. a
    /// SLAAC /64) are accepted as well.
    pub fn new(require_host_prefix: bool) -> Self {
        Self {
            require_host_prefix,
        }
    }

    /// Decide whether `ip` with `prefix_len` should be registered
    pub fn accept(&self, ip: IpAddr, prefix_len: u8) -> Option<Address> {
        if !is_global_unicast(&ip) {
            return None;
        }

        let version = IpVersion::of(&ip);
        if self.require_host_prefix && prefix_len != version.width() {
            return None;
        }

        match ip {
            IpAddr::V4(_) => Some(Address::new(ip)),
            IpAddr::V6(v6) if in_global_unicast_block(&v6) => Some(Address::new(ip)),
            IpAddr::V6(_) => None,
        }
    }
}

/// Publicly routable unicast address
///
/// Excludes unspecified, loopback, link-local, multicast, broadcast, RFC 1918
/// private and IPv6 unique-local ranges.
pub fn is_global_unicast(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_global_unicast_v4(v4),
        IpAddr::V6(v6) => is_global_unicast_v6(v6),
    }
}

fn is_global_unicast_v4(ip: &Ipv4Addr) -> bool {
    !(ip.octets()[0] == 0
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_private())
}

fn is_global_unicast_v6(ip: &Ipv6Addr) -> bool {
    !(ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unicast_link_local()
        || ip.is_unique_local())
}

/// Membership in `2000::/3`
fn in_global_unicast_block(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xe000 == 0x2000
}
