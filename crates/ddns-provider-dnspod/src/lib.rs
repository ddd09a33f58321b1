// # DNSPod DNS Provider
//
// This crate provides a DNSPod provider implementation for the DDNS updater,
// speaking Tencent Cloud API 3.0.
//
// ## Behaviour
//
// - ✅ One signed HTTP request per update (`ModifyDynamicDNS`)
// - ✅ Full error propagation to the reconciler
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ API error codes mapped to authentication / rate limit / provider errors
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (a failed update waits for the next invocation)
// - ❌ NO caching (owned by CacheStore)
//
// ## Security Requirements
//
// - Secret key NEVER appears in logs or Debug output
// - Provider MUST fail fast if credentials are empty
//
// ## API Reference
//
// - Tencent Cloud API 3.0 signing: TC3-HMAC-SHA256
// - ModifyDynamicDNS: `POST https://dnspod.tencentcloudapi.com/`
//   with `X-TC-Action: ModifyDynamicDNS` and `X-TC-Version: 2021-03-23`

mod sign;

use async_trait::async_trait;
use ddns_core::config::Credentials;
use ddns_core::traits::{DnsProvider, RecordUpdate};
use ddns_core::{DdnsConfig, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sign::{CONTENT_TYPE, SignRequest};

/// API action used for every update
const ACTION: &str = "ModifyDynamicDNS";

/// DNSPod API version
const API_VERSION: &str = "2021-03-23";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body of `ModifyDynamicDNS`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyDynamicDnsRequest<'a> {
    domain: &'a str,
    sub_domain: &'a str,
    record_id: u64,
    record_line: &'a str,
    value: &'a str,
}

impl<'a> From<&'a RecordUpdate> for ModifyDynamicDnsRequest<'a> {
    fn from(update: &'a RecordUpdate) -> Self {
        Self {
            domain: &update.domain,
            sub_domain: &update.sub_domain,
            record_id: update.record_id,
            record_line: &update.record_line,
            value: &update.value,
        }
    }
}

/// Every API 3.0 answer is wrapped in `{"Response": {...}}`
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(rename = "Response")]
    response: ApiResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiResponse {
    #[serde(default)]
    record_id: Option<u64>,
    #[serde(default)]
    request_id: String,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    code: String,
    message: String,
}

/// DNSPod provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider signs the request and logs the
/// payload but never sends it.
pub struct DnspodProvider {
    credentials: Credentials,

    /// API host, e.g. "dnspod.tencentcloudapi.com"
    endpoint: String,

    /// Service name used in the credential scope (first label of the host)
    service: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    dry_run: bool,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for DnspodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodProvider")
            .field("secret_id", &self.credentials.secret_id)
            .field("secret_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DnspodProvider {
    /// Create a new DNSPod provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Tencent Cloud secret id and key
    /// - `endpoint`: API host (no scheme)
    /// - `dry_run`: If true, sign and log requests without sending them
    pub fn new(credentials: Credentials, endpoint: impl Into<String>, dry_run: bool) -> Result<Self> {
        credentials.validate()?;

        let endpoint = endpoint.into();
        let service = endpoint
            .split('.')
            .next()
            .filter(|label| !label.is_empty() && !endpoint.contains('/'))
            .ok_or_else(|| Error::config(format!("Invalid API endpoint: {}", endpoint)))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            endpoint,
            service,
            client,
            dry_run,
        })
    }

    /// Create a provider from the updater configuration
    pub fn from_config(config: &DdnsConfig, dry_run: bool) -> Result<Self> {
        if dry_run {
            tracing::warn!("DNSPod provider running in DRY-RUN mode - no changes will be made");
        }
        Self::new(config.credentials.clone(), config.endpoint.clone(), dry_run)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn url(&self) -> String {
        format!("https://{}/", self.endpoint)
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    async fn update_record(&self, update: &RecordUpdate) -> Result<()> {
        let payload = serde_json::to_string(&ModifyDynamicDnsRequest::from(update))?;
        let timestamp = chrono::Utc::now().timestamp();

        let authorization = sign::authorization(&SignRequest {
            secret_id: &self.credentials.secret_id,
            secret_key: &self.credentials.secret_key,
            host: &self.endpoint,
            service: &self.service,
            action: ACTION,
            payload: &payload,
            timestamp,
        })?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send {} to {} with payload: {}",
                ACTION,
                self.url(),
                payload
            );
            return Ok(());
        }

        let response = self
            .client
            .post(self.url())
            .header("Authorization", authorization)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-TC-Action", ACTION)
            .header("X-TC-Version", API_VERSION)
            .header("X-TC-Timestamp", timestamp.to_string())
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => Error::auth(format!("Request rejected. Status: {}", status)),
                429 => Error::rate_limited(format!("Too many requests. Status: {}", status)),
                _ => Error::http(format!("Unexpected status {}: {}", status, body)),
            });
        }

        let record_id = parse_response(&body)?;
        tracing::info!(
            "DNSPod record {} ({}) set to {}",
            update.fqdn(),
            record_id.unwrap_or(update.record_id),
            update.value
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "dnspod"
    }
}

/// Interpret a `ModifyDynamicDNS` response body
///
/// Returns the record id echoed by the API on success.
fn parse_response(body: &str) -> Result<Option<u64>> {
    let envelope: ApiEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::provider("dnspod", format!("Failed to parse response: {}", e)))?;
    let response = envelope.response;

    let Some(error) = response.error else {
        return Ok(response.record_id);
    };

    let message = format!(
        "{}: {} (request {})",
        error.code, error.message, response.request_id
    );

    Err(if error.code.starts_with("AuthFailure") {
        Error::auth(message)
    } else if error.code.starts_with("RequestLimitExceeded") {
        Error::rate_limited(message)
    } else {
        Error::provider("dnspod", message)
    })
}
