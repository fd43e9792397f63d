//! # agora-replay
//!
//! Replay prevention and idempotent-retry support.
//!
//! Both concerns reduce to one primitive: an atomic TTL-bounded
//! "set-if-absent" store, shared by every server process. The
//! [`ConditionalStore`] trait captures exactly that primitive so the ledger
//! engine's correctness does not depend on a specific backing technology
//! (the production deployment uses a shared key-value store; tests and
//! single-node deployments use [`MemoryStore`]).
//!
//! ## Modules
//!
//! - [`memory`] — mutex-guarded in-process store
//! - [`nonce`] — `(pubkey, nonce)` consumption registry
//! - [`idempotency`] — cached success responses for safe retries

pub mod idempotency;
pub mod memory;
pub mod nonce;

pub use idempotency::IdempotencyCache;
pub use memory::MemoryStore;
pub use nonce::{NonceOutcome, NonceRegistry};

use std::time::Duration;

/// An atomic conditional-write key-value store with per-entry TTLs.
///
/// Implementations must make `put_if_absent` atomic: when two concurrent
/// callers race on the same key, exactly one observes `true`. That single
/// guarantee is what makes nonce consumption safe under concurrency.
pub trait ConditionalStore: Send + Sync {
    /// Store `value` under `key` unless the key is already live.
    /// Returns `true` if this call created the entry.
    fn put_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> bool;

    /// Fetch the live value under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;
}

// The nonce registry and the idempotency cache usually share one backing
// store, so the trait passes through `Arc`.
impl<S: ConditionalStore + ?Sized> ConditionalStore for std::sync::Arc<S> {
    fn put_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> bool {
        (**self).put_if_absent(key, value, ttl)
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        (**self).get(key)
    }
}

