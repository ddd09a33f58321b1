//! Contract Test: Idempotency
//!
//! Constraints verified:
//! - A pass with no address change issues zero remote calls
//! - State written by one invocation suppresses updates in the next
//!
//! If this test fails, repeated scheduled runs would hammer the provider.

mod common;

use common::*;
use ddns_core::{
    CacheConfig, CacheStore, FileCacheStore, IpVersion, MemoryCacheStore, Reconciler,
    VersionOutcome,
};

#[tokio::test]
async fn second_run_without_change_makes_no_remote_calls() {
    let source = ScriptedInterfaceSource::with_interface("eth0", &["203.0.113.7", "2001:4860::1"]);
    let provider = MockDnsProvider::new();
    let cache = MemoryCacheStore::new();

    let reconciler = Reconciler::new(
        Box::new(source),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        Box::new(cache.clone()),
        minimal_config("eth0"),
    )
    .expect("reconciler construction succeeds");

    let first = reconciler.run().await.unwrap();
    assert_eq!(first.remote_calls(), 2);
    assert_eq!(provider.update_call_count(), 2);

    let second = reconciler.run().await.unwrap();
    assert_eq!(second.remote_calls(), 0, "Second pass must not call the provider");
    assert_eq!(provider.update_call_count(), 2);
    assert_eq!(
        second.v4,
        Some(VersionOutcome::Unchanged {
            value: "203.0.113.7".to_string()
        })
    );
    assert_eq!(
        second.v6,
        Some(VersionOutcome::Unchanged {
            value: "2001:4860::1".to_string()
        })
    );
}

#[tokio::test]
async fn restart_simulation_no_duplicate_updates() {
    // Two separate invocations sharing only the cache files on disk
    let dir = tempfile::tempdir().unwrap();
    let cache_config = CacheConfig::in_dir(dir.path());
    let provider = MockDnsProvider::new();

    for _ in 0..2 {
        let reconciler = Reconciler::new(
            Box::new(ScriptedInterfaceSource::with_interface(
                "pppoe-wan",
                &["198.51.100.20", "2400:cb00::7"],
            )),
            Box::new(MockDnsProvider::sharing_counters_with(&provider)),
            Box::new(FileCacheStore::new(&cache_config).await.unwrap()),
            minimal_config("pppoe-wan").with_cache(cache_config.clone()),
        )
        .expect("reconciler construction succeeds");

        reconciler.run().await.unwrap();
    }

    assert_eq!(
        provider.update_call_count(),
        2,
        "Only the first invocation should update (one call per version)"
    );

    let store = FileCacheStore::new(&cache_config).await.unwrap();
    assert_eq!(
        store.read(IpVersion::V4).await.unwrap().as_deref(),
        Some("198.51.100.20")
    );
    assert_eq!(
        store.read(IpVersion::V6).await.unwrap().as_deref(),
        Some("2400:cb00::7")
    );
}

#[tokio::test]
async fn unchanged_pass_does_not_rewrite_cache() {
    let cache = FaultyCacheStore::new(
        MemoryCacheStore::with_value(IpVersion::V4, "203.0.113.7"),
        false,
        false,
    );

    let reconciler = Reconciler::new(
        Box::new(ScriptedInterfaceSource::with_interface("eth0", &["203.0.113.7"])),
        Box::new(MockDnsProvider::new()),
        Box::new(FaultyCacheStore::sharing_counters_with(&cache)),
        minimal_config("eth0"),
    )
    .unwrap();

    let report = reconciler.run().await.unwrap();
    assert_eq!(report.remote_calls(), 0);
    assert_eq!(cache.write_call_count(), 0, "Unchanged value must not be rewritten");
}
