// # ddnsd - single-shot DDNS updater
//
// This binary is a THIN integration layer:
// - All reconciliation logic lives in ddns-core
// - Configuration is via environment variables ONLY
// - One pass per invocation; schedule it with cron, a systemd timer or a
//   PPP ip-up hook
//
// The ddnsd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the netlink scanner, DNSPod provider and file cache
// 4. Running one reconciliation pass and mapping it to an exit code
//
// ## Configuration
//
// ### Interface
// - `DDNS_INTERFACE`: Interface to publish (default: pppoe-wan)
// - `DDNS_REQUIRE_HOST_PREFIX`: Only accept /32 and /128 addresses (default: true)
//
// ### Record
// - `DDNS_DOMAIN`: Zone, e.g. example.com (required)
// - `DDNS_SUB_DOMAIN`: Host label (default: @)
// - `DDNS_RECORD_ID_V4` / `DDNS_RECORD_ID_V6`: DNSPod record ids (at least one)
// - `DDNS_RECORD_LINE`: Record line (default: 默认)
//
// ### Provider
// - `DDNS_SECRET_ID` / `DDNS_SECRET_KEY`: Tencent Cloud API credentials
// - `DDNS_ENDPOINT`: API host (default: dnspod.tencentcloudapi.com)
// - `DDNS_MODE`: live or dry-run (default: live)
//
// ### Cache
// - `DDNS_CACHE_V4` / `DDNS_CACHE_V6`: Cache files (default: LAST_IP, LAST_IP6)
// - `DDNS_CACHE_ONLY_ON_SUCCESS`: Keep the cache behind failed updates (default: false)
//
// ## Example
//
// ```bash
// export DDNS_DOMAIN=example.com
// export DDNS_SUB_DOMAIN=home
// export DDNS_RECORD_ID_V4=1001
// export DDNS_RECORD_ID_V6=1002
// export DDNS_SECRET_ID=AKID...
// export DDNS_SECRET_KEY=...
// export DDNS_CACHE_V4=/var/lib/ddns/LAST_IP
// export DDNS_CACHE_V6=/var/lib/ddns/LAST_IP6
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::config::{DEFAULT_ENDPOINT, DEFAULT_INTERFACE, DEFAULT_RECORD_LINE};
use ddns_core::{
    AddressFilter, CacheConfig, Credentials, DdnsConfig, FileCacheStore, IpVersion,
    PolicyConfig, ReconcileReport, Reconciler, VersionOutcome,
};
use ddns_ip_netlink::NetlinkInterfaceSource;
use ddns_provider_dnspod::DnspodProvider;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Pass completed (remote failures are logged, not fatal)
/// - 1: Configuration or startup error
/// - 2: Runtime error (interface enumeration failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Reconciliation pass completed
    PassCompleted = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (addresses could not be read)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Run mode of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Live,
    DryRun,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    interface: String,
    domain: String,
    sub_domain: String,
    record_id_v4: Option<u64>,
    record_id_v6: Option<u64>,
    record_line: String,
    credentials: Credentials,
    endpoint: String,
    cache_v4: PathBuf,
    cache_v6: PathBuf,
    cache_only_on_success: bool,
    require_host_prefix: bool,
    mode: Mode,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let required = |key: &str| {
            var(key).ok_or_else(|| {
                anyhow::anyhow!("{} is required. Set it via: export {}=...", key, key)
            })
        };

        let mode = match var("DDNS_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("live") => Mode::Live,
            Some("dry-run") | Some("dryrun") => Mode::DryRun,
            Some(other) => anyhow::bail!(
                "DDNS_MODE '{}' is not supported. Supported modes: live, dry-run",
                other
            ),
        };

        Ok(Self {
            interface: var("DDNS_INTERFACE").unwrap_or_else(|| DEFAULT_INTERFACE.to_string()),
            domain: required("DDNS_DOMAIN")?,
            sub_domain: var("DDNS_SUB_DOMAIN").unwrap_or_else(|| "@".to_string()),
            record_id_v4: parse_record_id("DDNS_RECORD_ID_V4", var("DDNS_RECORD_ID_V4"))?,
            record_id_v6: parse_record_id("DDNS_RECORD_ID_V6", var("DDNS_RECORD_ID_V6"))?,
            record_line: var("DDNS_RECORD_LINE")
                .unwrap_or_else(|| DEFAULT_RECORD_LINE.to_string()),
            credentials: Credentials::new(
                required("DDNS_SECRET_ID")?,
                required("DDNS_SECRET_KEY")?,
            ),
            endpoint: var("DDNS_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            cache_v4: var("DDNS_CACHE_V4")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("LAST_IP")),
            cache_v6: var("DDNS_CACHE_V6")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("LAST_IP6")),
            cache_only_on_success: parse_bool(
                "DDNS_CACHE_ONLY_ON_SUCCESS",
                var("DDNS_CACHE_ONLY_ON_SUCCESS"),
                false,
            )?,
            require_host_prefix: parse_bool(
                "DDNS_REQUIRE_HOST_PREFIX",
                var("DDNS_REQUIRE_HOST_PREFIX"),
                true,
            )?,
            mode,
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate what the core configuration does not check itself
    ///
    /// - Domain name syntax
    /// - Endpoint is a bare host
    /// - Log level is known
    ///
    /// Missing cache directories are created by `FileCacheStore`.
    fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain)?;

        if self.sub_domain != "@" && self.sub_domain != "*" {
            validate_domain_name(&self.sub_domain)
                .map_err(|e| anyhow::anyhow!("DDNS_SUB_DOMAIN is not valid: {}", e))?;
        }

        if self.endpoint.contains("://") || self.endpoint.contains('/') {
            anyhow::bail!(
                "DDNS_ENDPOINT must be a bare host name (no scheme or path). Got: {}",
                self.endpoint
            );
        }

        log_level(&self.log_level)?;

        Ok(())
    }

    /// Build the core configuration (validated again by the reconciler)
    fn to_ddns_config(&self) -> DdnsConfig {
        let mut config = DdnsConfig::new(self.domain.clone(), self.credentials.clone())
            .with_interface(self.interface.clone())
            .with_sub_domain(self.sub_domain.clone())
            .with_cache(CacheConfig::new(self.cache_v4.clone(), self.cache_v6.clone()))
            .with_policy(PolicyConfig {
                cache_only_on_success: self.cache_only_on_success,
                require_host_prefix: self.require_host_prefix,
            });

        if let Some(id) = self.record_id_v4 {
            config = config.with_record_id(IpVersion::V4, id);
        }
        if let Some(id) = self.record_id_v6 {
            config = config.with_record_id(IpVersion::V6, id);
        }

        config.record_line = self.record_line.clone();
        config.endpoint = self.endpoint.clone();
        config
    }
}

fn parse_record_id(key: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("{} must be a numeric DNSPod record id. Got: {}", key, raw)
            })
        })
        .transpose()
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref().map(|raw| raw.trim().to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false. Got: {}", key, other),
    }
}

fn log_level(level: &str) -> Result<Level> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    })
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks; catches common errors, not every one.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // RFC 1035: 253 chars max
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let level = log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Every await is sequential; the netlink dump uses the blocking pool
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Wire the collaborators and run one pass
async fn run(config: Config) -> DdnsExitCode {
    let ddns_config = config.to_ddns_config();
    info!(
        "Publishing {} on {} ({:?} mode)",
        ddns_config.interface_name,
        ddns_config.fqdn(),
        config.mode
    );

    let reconciler = match build_reconciler(&config, ddns_config).await {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup failed: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match reconciler.run().await {
        Ok(report) => {
            log_report(&report);
            DdnsExitCode::PassCompleted
        }
        Err(e) => {
            error!("Reconciliation aborted: {}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

async fn build_reconciler(config: &Config, ddns_config: DdnsConfig) -> Result<Reconciler> {
    let source = NetlinkInterfaceSource::new(AddressFilter::new(
        ddns_config.policy.require_host_prefix,
    ));
    let provider = DnspodProvider::from_config(&ddns_config, config.mode == Mode::DryRun)?;
    let cache = FileCacheStore::new(&ddns_config.cache).await?;

    Ok(Reconciler::new(
        Box::new(source),
        Box::new(provider),
        Box::new(cache),
        ddns_config,
    )?)
}

fn log_report(report: &ReconcileReport) {
    for version in [IpVersion::V4, IpVersion::V6] {
        match report.outcome(version) {
            None => info!("{}: no address on {}", version, report.interface),
            Some(VersionOutcome::Unchanged { value }) => {
                info!("{}: {} unchanged", version, value)
            }
            Some(VersionOutcome::Updated { previous, value, .. }) => info!(
                "{}: updated {} -> {}",
                version,
                previous.as_deref().unwrap_or("<none>"),
                value
            ),
            Some(VersionOutcome::Failed { value, error, .. }) => {
                warn!("{}: update to {} failed: {}", version, value, error)
            }
            Some(VersionOutcome::Unmanaged { value }) => {
                info!("{}: {} found but no record id configured", version, value)
            }
        }
    }

    info!(
        "Pass completed: {} remote call(s), {} scan warning(s)",
        report.remote_calls(),
        report.warnings.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DDNS_DOMAIN", "example.com"),
        ("DDNS_RECORD_ID_V4", "1001"),
        ("DDNS_SECRET_ID", "AKIDexample"),
        ("DDNS_SECRET_KEY", "secret"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(MINIMAL)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.interface, "pppoe-wan");
        assert_eq!(config.sub_domain, "@");
        assert_eq!(config.record_line, "默认");
        assert_eq!(config.endpoint, "dnspod.tencentcloudapi.com");
        assert_eq!(config.cache_v4, PathBuf::from("LAST_IP"));
        assert_eq!(config.cache_v6, PathBuf::from("LAST_IP6"));
        assert!(!config.cache_only_on_success);
        assert!(config.require_host_prefix);
        assert_eq!(config.mode, Mode::Live);
        assert_eq!(config.record_id_v6, None);
    }

    #[test]
    fn test_core_config_mapping() {
        let config = Config::from_lookup(lookup(&with(&[
            ("DDNS_INTERFACE", "eth0"),
            ("DDNS_SUB_DOMAIN", "home"),
            ("DDNS_RECORD_ID_V6", "1002"),
            ("DDNS_CACHE_ONLY_ON_SUCCESS", "true"),
            ("DDNS_REQUIRE_HOST_PREFIX", "false"),
            ("DDNS_MODE", "dry-run"),
        ])))
        .unwrap();

        let core = config.to_ddns_config();
        core.validate().unwrap();
        assert_eq!(core.interface_name, "eth0");
        assert_eq!(core.record_id(IpVersion::V4), Some(1001));
        assert_eq!(core.record_id(IpVersion::V6), Some(1002));
        assert!(core.policy.cache_only_on_success);
        assert!(!core.policy.require_host_prefix);
        assert_eq!(config.mode, Mode::DryRun);
        assert_eq!(core.fqdn(), "home.example.com");
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup(&[("DDNS_DOMAIN", "example.com")])).unwrap_err();
        assert!(err.to_string().contains("DDNS_SECRET_ID"));

        let err = Config::from_lookup(lookup(&[
            ("DDNS_SECRET_ID", "id"),
            ("DDNS_SECRET_KEY", "key"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DDNS_DOMAIN"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&with(&[("DDNS_RECORD_ID_V4", "abc")]))).is_err());
        assert!(Config::from_lookup(lookup(&with(&[("DDNS_MODE", "sometimes")]))).is_err());
        assert!(
            Config::from_lookup(lookup(&with(&[("DDNS_CACHE_ONLY_ON_SUCCESS", "maybe")])))
                .is_err()
        );

        let config = Config::from_lookup(lookup(&with(&[("DDNS_LOG_LEVEL", "loud")]))).unwrap();
        assert!(config.validate().is_err());

        let config = Config::from_lookup(lookup(&with(&[(
            "DDNS_ENDPOINT",
            "https://dnspod.tencentcloudapi.com",
        )])))
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_record_id_rejected_by_core() {
        let config = Config::from_lookup(lookup(&[
            ("DDNS_DOMAIN", "example.com"),
            ("DDNS_SECRET_ID", "id"),
            ("DDNS_SECRET_KEY", "key"),
        ]))
        .unwrap();
        assert!(config.to_ddns_config().validate().is_err());
    }

    #[tokio::test]
    async fn test_missing_cache_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("var").join("lib").join("ddns");
        let v4 = nested.join("LAST_IP").display().to_string();
        let v6 = nested.join("LAST_IP6").display().to_string();

        let mut pairs: Vec<(&str, &str)> = MINIMAL.to_vec();
        pairs.push(("DDNS_CACHE_V4", v4.as_str()));
        pairs.push(("DDNS_CACHE_V6", v6.as_str()));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        config.validate().unwrap();
        assert!(!nested.exists());

        let reconciler = build_reconciler(&config, config.to_ddns_config())
            .await
            .unwrap();
        assert!(nested.is_dir());
        assert_eq!(reconciler.config().fqdn(), "example.com");
    }

    #[test]
    fn test_validate_domain_name() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("sub-domain.example.com").is_ok());
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("example..com").is_err());
        assert!(validate_domain_name("-bad.com").is_err());
        assert!(validate_domain_name("exa mple.com").is_err());
        assert!(validate_domain_name(&format!("{}.com", "a".repeat(64))).is_err());
    }

    #[test]
    fn test_sub_domain_wildcards() {
        for sub in ["@", "*", "home", "a.b"] {
            let config =
                Config::from_lookup(lookup(&with(&[("DDNS_SUB_DOMAIN", sub)]))).unwrap();
            assert!(config.validate().is_ok(), "{}", sub);
        }
        let config =
            Config::from_lookup(lookup(&with(&[("DDNS_SUB_DOMAIN", "bad_label")]))).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdnsExitCode::PassCompleted as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }
}
