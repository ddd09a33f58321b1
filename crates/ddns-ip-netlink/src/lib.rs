// # Netlink Interface Source
//
// This crate provides a Netlink-based interface scanner for Linux systems.
//
// ## How It Works
//
// 1. Open a `NETLINK_ROUTE` socket
// 2. Dump all links (`RTM_GETLINK`) for names and `IFF_UP`
// 3. Dump all addresses (`RTM_GETADDR`) for family, prefix length and value
// 4. Group addresses under their administratively-up link and run each
//    through `AddressFilter`
//
// On point-to-point links (PPPoE and friends) `IFA_ADDRESS` holds the peer,
// so `IFA_LOCAL` is preferred whenever the kernel reports it.
//
// The dump is blocking and short; it runs on tokio's blocking pool and is
// awaited immediately.
//
// ## Platform Support
//
// Enumeration only works on Linux. Elsewhere `scan()` returns an
// interface error.

use async_trait::async_trait;
use ddns_core::traits::InterfaceSource;
use ddns_core::{AddressFilter, Error, InterfaceRecord, Result, ScanReport, ScanWarning};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[cfg(target_os = "linux")]
mod dump;

/// A link as reported by the kernel
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLink {
    pub index: u32,
    pub name: Option<String>,
    pub up: bool,
}

/// An address as reported by the kernel, not yet decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAddress {
    pub index: u32,
    pub prefix_len: u8,
    /// `IFA_LOCAL` if present, otherwise `IFA_ADDRESS`
    pub bytes: Option<Vec<u8>>,
}

/// Netlink-based interface source for Linux
#[derive(Debug, Clone, Default)]
pub struct NetlinkInterfaceSource {
    filter: AddressFilter,
}

impl NetlinkInterfaceSource {
    pub fn new(filter: AddressFilter) -> Self {
        Self { filter }
    }
}

#[async_trait]
impl InterfaceSource for NetlinkInterfaceSource {
    #[cfg(target_os = "linux")]
    async fn scan(&self) -> Result<ScanReport> {
        let (links, addresses) = tokio::task::spawn_blocking(dump::dump)
            .await
            .map_err(|e| Error::interface(format!("Netlink dump task failed: {}", e)))??;

        let report = assemble(links, addresses, &self.filter);
        tracing::debug!(
            "Scanned {} up interface(s), {} warning(s)",
            report.interfaces.len(),
            report.warnings.len()
        );
        Ok(report)
    }

    #[cfg(not(target_os = "linux"))]
    async fn scan(&self) -> Result<ScanReport> {
        Err(Error::interface(
            "Netlink interface source is only supported on Linux",
        ))
    }

    fn source_name(&self) -> &'static str {
        "netlink"
    }
}

/// Build the scan report from raw dump results
///
/// Links keep kernel order, addresses keep kernel order within their link.
/// Addresses of down links are dropped silently; anything that cannot be
/// attributed or decoded becomes a warning.
pub(crate) fn assemble(
    links: Vec<RawLink>,
    addresses: Vec<RawAddress>,
    filter: &AddressFilter,
) -> ScanReport {
    let mut report = ScanReport::default();

    let mut by_index: HashMap<u32, Vec<RawAddress>> = HashMap::new();
    let mut known: HashMap<u32, bool> = HashMap::new();
    for link in &links {
        known.insert(link.index, link.up);
    }

    for address in addresses {
        if known.contains_key(&address.index) {
            by_index.entry(address.index).or_default().push(address);
        } else {
            report.warnings.push(ScanWarning::new(
                format!("#{}", address.index),
                "address reported for unknown interface index",
            ));
        }
    }

    for link in links {
        if !link.up {
            continue;
        }

        let Some(name) = link.name else {
            report.warnings.push(ScanWarning::new(
                format!("#{}", link.index),
                "link has no name attribute",
            ));
            continue;
        };

        let mut record = InterfaceRecord::new(name);
        for address in by_index.remove(&link.index).unwrap_or_default() {
            match decode(address.bytes.as_deref()) {
                Ok(ip) => {
                    if let Some(accepted) = filter.accept(ip, address.prefix_len) {
                        record.addresses.push(accepted);
                    } else {
                        tracing::trace!(
                            "{}: ignoring {}/{}",
                            record.name,
                            ip,
                            address.prefix_len
                        );
                    }
                }
                Err(message) => {
                    report
                        .warnings
                        .push(ScanWarning::new(record.name.clone(), message));
                }
            }
        }

        report.interfaces.push(record);
    }

    report
}

fn decode(bytes: Option<&[u8]>) -> std::result::Result<IpAddr, String> {
    let bytes = bytes.ok_or_else(|| "address entry without address attribute".to_string())?;

    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Ok(IpAddr::V4(Ipv4Addr::from(octets)));
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Ok(IpAddr::V6(Ipv6Addr::from(octets)));
    }

    Err(format!("address attribute has {} bytes", bytes.len()))
}
