//! BIP39 mnemonic handling and master-seed derivation.
//!
//! The mnemonic is the participant's only credential. It never leaves the
//! client; the server sees nothing but per-topic public keys. Seed derivation
//! is standard BIP39: PBKDF2-HMAC-SHA512, 2048 rounds, salt
//! `"mnemonic" + passphrase`, over the NFKD-normalized phrase (all performed
//! by the `bip39` crate).

use bip39::Mnemonic;
use zeroize::Zeroize;

use crate::{CryptoError, Result};

/// A 64-byte BIP39 master seed, zeroized on drop.
pub struct MasterSeed {
    bytes: [u8; 64],
}

impl MasterSeed {
    /// Wrap raw seed bytes (e.g. restored from client-side storage).
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Drop for MasterSeed {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print seed material.
        f.write_str("MasterSeed(..)")
    }
}

/// Generate a checksum-valid random mnemonic of 12 or 24 words.
pub fn generate_mnemonic(word_count: usize) -> Result<String> {
    if word_count != 12 && word_count != 24 {
        return Err(CryptoError::InvalidInput(format!(
            "word count must be 12 or 24, got {word_count}"
        )));
    }
    let mnemonic = Mnemonic::generate(word_count)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_string())
}

/// Check that a phrase is a word-list- and checksum-valid BIP39 mnemonic.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse(phrase).is_ok()
}

/// Derive the 64-byte master seed from a mnemonic and optional passphrase.
///
/// # Errors
///
/// - [`CryptoError::InvalidMnemonic`] if the phrase fails word-list or
///   checksum validation (fails closed; no partial derivation).
pub fn mnemonic_to_master_seed(phrase: &str, passphrase: &str) -> Result<MasterSeed> {
    let mnemonic =
        Mnemonic::parse(phrase).map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(MasterSeed::from_bytes(mnemonic.to_seed(passphrase)))
}
