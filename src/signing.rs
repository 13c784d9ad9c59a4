//! Response signatures.
//!
//! A signature is `v0=` followed by the lowercase hex HMAC-SHA256 of
//! `"{project_id}:{version}:{timestamp}:{body}"`, keyed by the shared secret.
//! Nothing here reads the clock; the caller supplies the timestamp.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Version tag prefixed to every signature.
pub const SIGNATURE_VERSION: &str = "v0";

/// Canonical string fed to the MAC.
pub fn canonical_string(project_id: &str, version: &str, timestamp: u64, body: &str) -> String {
    format!("{project_id}:{version}:{timestamp}:{body}")
}

fn mac_for(secret: &str, project_id: &str, version: &str, timestamp: u64, body: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical_string(project_id, version, timestamp, body).as_bytes());
    mac
}

/// Sign a response.
pub fn sign(secret: &str, project_id: &str, version: &str, timestamp: u64, body: &str) -> String {
    let mac = mac_for(secret, project_id, version, timestamp, body);
    format!("{SIGNATURE_VERSION}={}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a signature using constant-time comparison.
pub fn verify(
    secret: &str,
    project_id: &str,
    version: &str,
    timestamp: u64,
    body: &str,
    signature: &str,
) -> bool {
    let Some(hex_sig) = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|s| s.strip_prefix('='))
    else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    mac_for(secret, project_id, version, timestamp, body)
        .verify_slice(&expected)
        .is_ok()
}

/// Standard-alphabet base64 of the UTF-8 bytes of `text`.
pub fn encode_base64(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode bytes as UTF-8, dropping invalid sequences rather than replacing them.
pub fn decode_utf8_ignoring_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
