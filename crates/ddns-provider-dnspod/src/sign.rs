//! TC3-HMAC-SHA256 request signing (Tencent Cloud API 3.0)
//!
//! ```text
//! CanonicalRequest = POST \n / \n \n canonical headers \n signed headers \n hex(sha256(payload))
//! StringToSign     = TC3-HMAC-SHA256 \n timestamp \n date/service/tc3_request \n hex(sha256(CanonicalRequest))
//! SigningKey       = HMAC(HMAC(HMAC("TC3" + key, date), service), "tc3_request")
//! Signature        = hex(HMAC(SigningKey, StringToSign))
//! ```

use ddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt::Write;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "TC3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

pub(crate) const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Inputs of one signature
pub(crate) struct SignRequest<'a> {
    pub secret_id: &'a str,
    pub secret_key: &'a str,
    pub host: &'a str,
    pub service: &'a str,
    pub action: &'a str,
    pub payload: &'a str,
    pub timestamp: i64,
}

/// Build the `Authorization` header value
pub(crate) fn authorization(request: &SignRequest<'_>) -> Result<String> {
    let date = chrono::DateTime::from_timestamp(request.timestamp, 0)
        .ok_or_else(|| Error::invalid_input(format!("Invalid timestamp: {}", request.timestamp)))?
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\nx-tc-action:{}\n\n{}\n{}",
        CONTENT_TYPE,
        request.host,
        request.action.to_lowercase(),
        SIGNED_HEADERS,
        sha256_hex(request.payload.as_bytes()),
    );

    let scope = format!("{}/{}/tc3_request", date, request.service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        request.timestamp,
        scope,
        sha256_hex(canonical_request.as_bytes()),
    );

    let secret_date = hmac_sha256(format!("TC3{}", request.secret_key).as_bytes(), &date)?;
    let secret_service = hmac_sha256(&secret_date, request.service)?;
    let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
    let signature = hex(&hmac_sha256(&secret_signing, &string_to_sign)?);

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, request.secret_id, scope, SIGNED_HEADERS, signature
    ))
}

fn hmac_sha256(key: &[u8], message: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::invalid_input(format!("Invalid HMAC key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex(&Sha256::digest(data))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}
