//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides minimal test doubles that record how the
//! reconciler drives its collaborators.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, InterfaceSource, RecordUpdate};
use ddns_core::{
    Address, CacheStore, Credentials, DdnsConfig, InterfaceRecord, IpVersion, MemoryCacheStore,
    ScanReport, ScanWarning,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An InterfaceSource that returns a fixed scan result
pub struct ScriptedInterfaceSource {
    report: Option<ScanReport>,
    /// Call counter for scan()
    scan_call_count: Arc<AtomicUsize>,
}

impl ScriptedInterfaceSource {
    /// A source reporting one interface with the given addresses
    pub fn with_interface(name: &str, addresses: &[&str]) -> Self {
        let mut record = InterfaceRecord::new(name);
        record.addresses = addresses.iter().map(|a| address(a)).collect();

        Self::with_report(ScanReport {
            interfaces: vec![record],
            warnings: Vec::new(),
        })
    }

    pub fn with_report(report: ScanReport) -> Self {
        Self {
            report: Some(report),
            scan_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose enumeration always fails
    pub fn failing() -> Self {
        Self {
            report: None,
            scan_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a non-fatal warning to the report
    pub fn with_warning(mut self, interface: &str, message: &str) -> Self {
        if let Some(report) = self.report.as_mut() {
            report.warnings.push(ScanWarning::new(interface, message));
        }
        self
    }

    /// Get the number of times scan() was called
    pub fn scan_call_count(&self) -> usize {
        self.scan_call_count.load(Ordering::SeqCst)
    }

    /// Create a new source with the same script that shares counters with this one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            report: other.report.clone(),
            scan_call_count: Arc::clone(&other.scan_call_count),
        }
    }
}

#[async_trait::async_trait]
impl InterfaceSource for ScriptedInterfaceSource {
    async fn scan(&self) -> Result<ScanReport> {
        self.scan_call_count.fetch_add(1, Ordering::SeqCst);
        self.report
            .clone()
            .ok_or_else(|| Error::interface("netlink socket unavailable"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A mock DnsProvider that records calls
pub struct MockDnsProvider {
    /// Recorded update requests
    updates: Arc<std::sync::Mutex<Vec<RecordUpdate>>>,
    /// Versions whose updates fail
    failing: Arc<std::sync::Mutex<Vec<IpVersion>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            updates: Arc::new(std::sync::Mutex::new(Vec::new())),
            failing: Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    /// Make every update of `version` fail with a provider error
    pub fn fail_version(&self, version: IpVersion) {
        self.failing.lock().unwrap().push(version);
    }

    /// Get the number of times update_record() was called
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Get the recorded update requests
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    /// Values submitted for one version, in call order
    pub fn values_for(&self, version: IpVersion) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|u| u.version == version)
            .map(|u| u.value)
            .collect()
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            updates: Arc::clone(&other.updates),
            failing: Arc::clone(&other.failing),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        self.updates.lock().unwrap().push(update.clone());

        if self.failing.lock().unwrap().contains(&update.version) {
            return Err(Error::provider("mock", "InternalError: simulated failure"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A CacheStore whose reads or writes can be made to fail
pub struct FaultyCacheStore {
    inner: MemoryCacheStore,
    fail_reads: bool,
    fail_writes: bool,
    write_call_count: Arc<AtomicUsize>,
}

impl FaultyCacheStore {
    pub fn new(inner: MemoryCacheStore, fail_reads: bool, fail_writes: bool) -> Self {
        Self {
            inner,
            fail_reads,
            fail_writes,
            write_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn write_call_count(&self) -> usize {
        self.write_call_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            fail_reads: other.fail_reads,
            fail_writes: other.fail_writes,
            write_call_count: Arc::clone(&other.write_call_count),
        }
    }
}

#[async_trait::async_trait]
impl CacheStore for FaultyCacheStore {
    async fn read(&self, version: IpVersion) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(Error::cache_read("permission denied"));
        }
        self.inner.read(version).await
    }

    async fn write(&self, version: IpVersion, value: &str) -> Result<()> {
        self.write_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(Error::cache_write("read-only file system"));
        }
        self.inner.write(version, value).await
    }
}

pub fn address(literal: &str) -> Address {
    let ip: IpAddr = literal.parse().expect("valid address literal");
    Address::new(ip)
}

/// Helper to create a DdnsConfig managing both versions on `interface`
pub fn minimal_config(interface: &str) -> DdnsConfig {
    DdnsConfig::new("example.com", Credentials::new("test-id", "test-key"))
        .with_interface(interface)
        .with_sub_domain("home")
        .with_record_id(IpVersion::V4, 1001)
        .with_record_id(IpVersion::V6, 1002)
}
