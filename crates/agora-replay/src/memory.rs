//! In-process conditional store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ConditionalStore;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Mutex-guarded in-memory [`ConditionalStore`].
///
/// Expired entries are dropped lazily on access and swept opportunistically
/// on writes. Suitable for tests and single-process deployments; a shared
/// key-value store with native set-if-absent takes its place in production.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub fn live_len(&self) -> usize {
        let now = Instant::now();
        match self.entries.lock() {
            Ok(entries) => entries.values().filter(|e| e.expires_at > now).count(),
            Err(_) => 0,
        }
    }
}

impl ConditionalStore for MemoryStore {
    fn put_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> bool {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.lock() else {
            // A poisoned lock means another thread panicked mid-operation;
            // refuse the write rather than guess at the map's state.
            return false;
        };
        entries.retain(|_, e| e.expires_at > now);

        if entries.contains_key(key) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: now + ttl,
            },
        );
        true
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if entry.expires_at <= now {
            return None;
        }
        Some(entry.value.clone())
    }
}
