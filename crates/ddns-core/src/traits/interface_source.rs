// # Interface Source Trait
//
// Defines the interface for enumerating network interfaces and the
// addresses worth publishing on them.
//
// ## Implementations
//
// - Netlink-based (Linux): `ddns-ip-netlink` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::InterfaceSource;
//
// #[tokio::main(flavor = "current_thread")]
// async fn main() -> anyhow::Result<()> {
//     let source = /* InterfaceSource implementation */;
//
//     let found = source.addresses_for_interface("pppoe-wan").await?;
//     for address in &found.addresses {
//         println!("{}", address);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::address::{InterfaceAddresses, ScanReport};

/// Trait for interface source implementations
///
/// # Contract
///
/// - Only administratively-up interfaces appear in the report.
/// - Addresses are filtered with [`AddressFilter`](crate::AddressFilter)
///   and kept in the order the platform reports them.
/// - A problem confined to one interface becomes a
///   [`ScanWarning`](crate::ScanWarning); only a failure to enumerate at all
///   is an error.
///
/// Sources are observers: they never touch the cache or the provider.
#[async_trait]
pub trait InterfaceSource: Send + Sync {
    /// Enumerate every administratively-up interface
    ///
    /// # Returns
    ///
    /// - `Ok(ScanReport)`: One record per kept interface plus non-fatal warnings
    /// - `Err(Error::Interface)`: Enumeration itself failed
    async fn scan(&self) -> Result<ScanReport, crate::Error>;

    /// Addresses of the interface called `name`
    ///
    /// An interface that does not exist (or is down) yields an empty list,
    /// not an error.
    async fn addresses_for_interface(&self, name: &str) -> Result<InterfaceAddresses, crate::Error> {
        Ok(self.scan().await?.into_interface(name))
    }

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
