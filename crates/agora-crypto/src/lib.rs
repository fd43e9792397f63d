//! # agora-crypto
//!
//! Cryptographic primitives for the Agora pseudonymous identity protocol.
//! The suite is fixed — no algorithm negotiation is permitted: BIP39 for
//! mnemonics, PBKDF2-HMAC-SHA512 for the master seed, HMAC-SHA512 for
//! per-topic key derivation, Ed25519 for signatures, SHA-256 for body hashing.
//!
//! ## Modules
//!
//! - [`mnemonic`] — BIP39 mnemonic generation, validation, and master seed
//! - [`derive`] — deterministic per-topic Ed25519 keypair derivation
//! - [`canonical`] — the canonical signing-message codec (wire contract)
//! - [`ed25519`] — Ed25519 signing and verification (RFC 8032)

pub mod canonical;
pub mod derive;
pub mod ed25519;
pub mod mnemonic;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// The mnemonic failed BIP39 word-list or checksum validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid key or signature length.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A wire field was not lowercase hex of the expected width.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    /// The request path carried a query string, which is never signed.
    #[error("path must not contain a query string")]
    QueryStringInPath,

    /// The nonce contained the `|` field delimiter.
    #[error("nonce must not contain '|'")]
    NonceDelimiter,

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Decode a fixed-width lowercase-hex wire field into `N` bytes.
///
/// Uppercase digits are rejected: the signing header contract specifies
/// lowercase, and accepting both would create two valid encodings of the
/// same key.
pub(crate) fn decode_hex_exact<const N: usize>(s: &str) -> Result<[u8; N]> {
    if s.len() != N * 2 {
        return Err(CryptoError::InvalidLength {
            expected: N * 2,
            actual: s.len(),
        });
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return Err(CryptoError::InvalidHex(
            "expected lowercase hex".to_string(),
        ));
    }
    let bytes = hex::decode(s).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
