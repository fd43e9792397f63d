//! Nonce consumption registry.
//!
//! Every signed request carries a client-generated nonce. A nonce may be
//! consumed once per pubkey within the replay window; a second consumption
//! attempt is either a benign idempotent retry (the idempotency cache holds
//! the original response) or a genuine replay attack. This registry only
//! answers "first use or not" — the caller decides which of the two cases
//! it is looking at.

use std::time::Duration;

use agora_types::FRESHNESS_WINDOW_MS;

use crate::ConditionalStore;

/// Outcome of attempting to consume a nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NonceOutcome {
    /// This call consumed the nonce.
    FirstUse,
    /// The nonce was already consumed within the replay window.
    AlreadyConsumed,
}

/// Tracks consumed `(pubkey, nonce)` pairs on a [`ConditionalStore`].
pub struct NonceRegistry<S> {
    store: S,
    ttl: Duration,
}

impl<S: ConditionalStore> NonceRegistry<S> {
    /// Registry with the default replay window (twice the signed-request
    /// freshness window, so a nonce outlives every request that could
    /// legitimately carry it).
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, Duration::from_millis(FRESHNESS_WINDOW_MS * 2))
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Atomically consume `(pubkey, nonce)`.
    ///
    /// Exactly one of any number of concurrent callers observes
    /// [`NonceOutcome::FirstUse`].
    pub fn consume(&self, pubkey_hex: &str, nonce: &str) -> NonceOutcome {
        let key = Self::key(pubkey_hex, nonce);
        if self.store.put_if_absent(&key, b"1", self.ttl) {
            NonceOutcome::FirstUse
        } else {
            tracing::debug!(pubkey = pubkey_hex, nonce, "nonce already consumed");
            NonceOutcome::AlreadyConsumed
        }
    }

    /// Whether `(pubkey, nonce)` has been consumed within the replay window.
    pub fn is_consumed(&self, pubkey_hex: &str, nonce: &str) -> bool {
        self.store.get(&Self::key(pubkey_hex, nonce)).is_some()
    }

    fn key(pubkey_hex: &str, nonce: &str) -> String {
        format!("nonce:{pubkey_hex}:{nonce}")
    }
}
