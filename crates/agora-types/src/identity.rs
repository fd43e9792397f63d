//! Authenticated pseudonymous identities.

use serde::{Deserialize, Serialize};

/// The identity the request authenticator hands to downstream handlers.
///
/// The pubkey is a topic-scoped pseudonym: the same participant derives a
/// different keypair per topic, so identities are not linkable across topics.
/// Downstream code (the ledger engine in particular) trusts this value and
/// never re-verifies the underlying signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// The topic this pseudonym is scoped to.
    pub topic_id: String,
    /// Ed25519 public key, 64 lowercase hex chars.
    pub pubkey_hex: String,
}

impl AuthenticatedIdentity {
    pub fn new(topic_id: impl Into<String>, pubkey_hex: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            pubkey_hex: pubkey_hex.into(),
        }
    }
}
