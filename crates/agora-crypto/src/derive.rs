//! Deterministic per-topic keypair derivation.
//!
//! Each `(master seed, topic id)` pair maps to one Ed25519 keypair:
//!
//! ```text
//! digest   = HMAC-SHA512(key = master_seed, data = UTF-8(topic_id))
//! priv_seed = digest[0..32]
//! pubkey    = Ed25519 keygen(priv_seed)
//! ```
//!
//! The pubkey is the participant's durable pseudonym inside that topic.
//! Because HMAC-SHA512 is a PRF under the master seed, pubkeys for different
//! topics share no exploitable structure, which is what makes the pseudonyms
//! unlinkable across topics.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::ed25519::{SigningKey, VerifyingKey};
use crate::mnemonic::MasterSeed;
use crate::{CryptoError, Result};

type HmacSha512 = Hmac<Sha512>;

/// A topic-scoped Ed25519 keypair. Recomputable from the mnemonic at any
/// time; never persisted server-side.
pub struct TopicKeypair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl TopicKeypair {
    /// Hex form of the 32-byte private seed (client-side storage only).
    pub fn priv_seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Hex form of the public key — the pseudonymous identity on the wire.
    pub fn pubkey_hex(&self) -> String {
        self.verifying_key.to_hex()
    }
}

impl std::fmt::Debug for TopicKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicKeypair")
            .field("pubkey", &self.pubkey_hex())
            .finish()
    }
}

/// Derive the Ed25519 keypair for `(master_seed, topic_id)`.
pub fn derive_topic_keypair(master_seed: &MasterSeed, topic_id: &str) -> Result<TopicKeypair> {
    let mut mac = HmacSha512::new_from_slice(master_seed.as_bytes())
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(topic_id.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut priv_seed = [0u8; 32];
    priv_seed.copy_from_slice(&digest[..32]);

    let signing_key = SigningKey::from_bytes(&priv_seed);
    priv_seed.zeroize();

    let verifying_key = signing_key.verifying_key();
    Ok(TopicKeypair {
        signing_key,
        verifying_key,
    })
}
