//! Canonical signing-message codec.
//!
//! The canonical message is the exact string both client and server sign and
//! verify:
//!
//! ```text
//! v1|{METHOD}|{PATH}|{timestampMs}|{nonce}|{bodyHashHexOrEmpty}
//! ```
//!
//! This layout is a cross-implementation wire contract. The body hash is
//! SHA-256 over the raw bytes as transmitted — never over a re-serialized
//! form — so any whitespace or key-order change in a JSON body invalidates
//! the signature. A request without a body hashes to the empty string and
//! the message ends with a trailing `|`.

use sha2::{Digest, Sha256};

use crate::{CryptoError, Result};

/// Build the v1 canonical message for a request.
///
/// # Errors
///
/// - [`CryptoError::QueryStringInPath`] if `path` contains `?`. Query strings
///   are never part of the signed context; passing one is a caller bug, not a
///   value to be silently stripped.
/// - [`CryptoError::NonceDelimiter`] if `nonce` contains the `|` field
///   delimiter, which would make the message ambiguous.
pub fn canonical_message_v1(
    method: &str,
    path: &str,
    timestamp_ms: u64,
    nonce: &str,
    body: Option<&[u8]>,
) -> Result<String> {
    if path.contains('?') {
        return Err(CryptoError::QueryStringInPath);
    }
    if nonce.contains('|') {
        return Err(CryptoError::NonceDelimiter);
    }

    let body_hash = match body {
        Some(bytes) => hex::encode(Sha256::digest(bytes)),
        None => String::new(),
    };

    Ok(format!(
        "v1|{}|{}|{}|{}|{}",
        method.to_uppercase(),
        path,
        timestamp_ms,
        nonce,
        body_hash
    ))
}

/// SHA-256 of a raw body, as it appears in the canonical message.
pub fn body_hash_hex(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Client-side convenience: build the canonical message for a request and
/// sign it in one step.
pub fn sign_request_v1(
    signing_key: &crate::ed25519::SigningKey,
    method: &str,
    path: &str,
    timestamp_ms: u64,
    nonce: &str,
    body: Option<&[u8]>,
) -> Result<crate::ed25519::Signature> {
    let message = canonical_message_v1(method, path, timestamp_ms, nonce, body)?;
    Ok(signing_key.sign(message.as_bytes()))
}
