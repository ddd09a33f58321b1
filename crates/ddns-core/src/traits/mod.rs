//! Core traits for the DDNS updater
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`InterfaceSource`]: Enumerate interfaces and their accepted addresses
//! - [`DnsProvider`]: Push a new value to a dynamic DNS record
//! - [`CacheStore`]: Per-version "last applied" address cache

pub mod cache_store;
pub mod dns_provider;
pub mod interface_source;

pub use cache_store::CacheStore;
pub use dns_provider::{DnsProvider, RecordUpdate};
pub use interface_source::InterfaceSource;
