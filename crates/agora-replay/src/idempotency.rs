//! Idempotency cache for retried requests.

use std::time::Duration;

use agora_types::IDEMPOTENCY_TTL_SECS;

use crate::ConditionalStore;

/// Caches the serialized success response of a committed request under its
/// `(pubkey, nonce)` idempotency key.
///
/// The nonce is the *sole* idempotency key: a retry with a matching nonce
/// gets the cached bytes back verbatim even if its body differs. That is an
/// inherited protocol decision — nonces are client-generated per logical
/// attempt, so a client reusing one across different intents gets the first
/// result. Only successful responses are cached; a failed validation leaves
/// no entry behind.
pub struct IdempotencyCache<S> {
    store: S,
    ttl: Duration,
}

impl<S: ConditionalStore> IdempotencyCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::from_secs(IDEMPOTENCY_TTL_SECS))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// The cached response for `(pubkey, nonce)`, byte-for-byte as it was
    /// first produced.
    pub fn get(&self, pubkey_hex: &str, nonce: &str) -> Option<Vec<u8>> {
        self.store.get(&Self::key(pubkey_hex, nonce))
    }

    /// Cache a success response. First writer wins; a concurrent duplicate
    /// write is ignored so the earliest response stays authoritative.
    pub fn store(&self, pubkey_hex: &str, nonce: &str, response: &[u8]) {
        let stored = self
            .store
            .put_if_absent(&Self::key(pubkey_hex, nonce), response, self.ttl);
        if !stored {
            tracing::debug!(pubkey = pubkey_hex, nonce, "idempotency entry already present");
        }
    }

    fn key(pubkey_hex: &str, nonce: &str) -> String {
        format!("idem:{pubkey_hex}:{nonce}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn test_store_and_get() {
        let cache = IdempotencyCache::new(MemoryStore::new());
        assert_eq!(cache.get("pk", "n1"), None);
        cache.store("pk", "n1", br#"{"ok":true}"#);
        assert_eq!(cache.get("pk", "n1").expect("cached"), br#"{"ok":true}"#);
    }

    #[test]
    fn test_first_response_is_authoritative() {
        let cache = IdempotencyCache::new(MemoryStore::new());
        cache.store("pk", "n1", b"first");
        cache.store("pk", "n1", b"second");
        assert_eq!(cache.get("pk", "n1").expect("cached"), b"first");
    }

    #[test]
    fn test_keys_do_not_collide_with_nonce_registry() {
        // Same (pubkey, nonce) in both layers must address distinct entries.
        let store = MemoryStore::new();
        assert!(store.put_if_absent("nonce:pk:n1", b"1", Duration::from_secs(60)));
        let cache = IdempotencyCache::new(store);
        assert_eq!(cache.get("pk", "n1"), None);
    }

    #[test]
    fn test_expiry() {
        let cache = IdempotencyCache::with_ttl(MemoryStore::new(), Duration::ZERO);
        cache.store("pk", "n1", b"r");
        assert_eq!(cache.get("pk", "n1"), None);
    }
}
