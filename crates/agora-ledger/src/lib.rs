//! # agora-ledger
//!
//! The transactional vote-ledger engine.
//!
//! Each vote-set request runs the same state machine:
//! idempotency check → replay check → immediate transaction → fixed-order
//! reads → policy check → delta validation → writes → commit → response
//! cache → best-effort notify. All validation happens against values read
//! inside the transaction, and every failure surfaces before the first
//! write, so partial state is never observable.
//!
//! ## Modules
//!
//! - [`engine`] — the state machine itself
//! - [`notify`] — post-commit change notification seam

pub mod engine;
pub mod notify;

pub use engine::LedgerEngine;
pub use notify::{ArgumentChanged, BroadcastNotifier, ChangeNotifier, NoopNotifier};

use agora_types::TopicStatus;

/// Error types for ledger transactions.
///
/// Every variant that reaches a client carries a stable machine-readable
/// code; the engine never collapses these into an opaque failure.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Malformed target vote value.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The voter's free balance cannot cover the vote increase.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: i64, required: i64 },

    /// The argument is pruned; only decreases are allowed.
    #[error("argument is pruned; vote increases are forbidden")]
    IncreaseForbidden,

    /// The topic is not active; only decreases are allowed.
    #[error("topic status {0:?} disallows vote increases")]
    TopicStatusDisallowsWrite(TopicStatus),

    /// No such argument (or it belongs to a different topic than the
    /// authenticated identity).
    #[error("argument not found: {0}")]
    ArgumentNotFound(String),

    /// The nonce was consumed but no cached response exists — a genuine
    /// replay, not a benign retry.
    #[error("nonce already used")]
    NonceReplay,

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] agora_db::DbError),

    /// Transaction control failure (begin/commit).
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Response serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Stable machine-readable error code for the HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::BadRequest(_) => "BAD_REQUEST",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::IncreaseForbidden => "ARGUMENT_PRUNED_INCREASE_FORBIDDEN",
            LedgerError::TopicStatusDisallowsWrite(_) => "TOPIC_STATUS_DISALLOWS_WRITE",
            LedgerError::ArgumentNotFound(_) => "ARGUMENT_NOT_FOUND",
            LedgerError::NonceReplay => "NONCE_REPLAY",
            LedgerError::Db(_) | LedgerError::Sqlite(_) | LedgerError::Serialization(_) => {
                "INTERNAL"
            }
        }
    }
}

impl From<agora_qv::QvError> for LedgerError {
    fn from(err: agora_qv::QvError) -> Self {
        match err {
            agora_qv::QvError::BadRequest(msg) => LedgerError::BadRequest(msg),
            agora_qv::QvError::IncreaseForbidden => LedgerError::IncreaseForbidden,
            agora_qv::QvError::InsufficientBalance {
                available,
                required,
            } => LedgerError::InsufficientBalance {
                available,
                required,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
