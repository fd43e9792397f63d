//! # agora-types
//!
//! Shared domain types for the Agora quadratic-voting ledger.
//!
//! The constants here are protocol-fixed, not configuration: every client and
//! server participating in the signing and voting protocol must agree on them.

pub mod identity;
pub mod topic;
pub mod vote;

pub use identity::AuthenticatedIdentity;
pub use topic::TopicStatus;
pub use vote::{SetVotesRequest, SetVotesResponse};

/// Credits granted to a ledger on first interaction with a topic.
pub const INITIAL_BALANCE: i64 = 100;

/// Minimum votes a participant may hold on one argument.
pub const MIN_VOTES: i64 = 0;

/// Maximum votes a participant may hold on one argument.
pub const MAX_VOTES: i64 = 10;

/// Version prefix of the canonical signing message. Changing the message
/// layout requires bumping this.
pub const SIGNING_VERSION: &str = "v1";

/// How long a successful response stays cached for idempotent retries.
pub const IDEMPOTENCY_TTL_SECS: u64 = 300;

/// Default signed-request freshness window (applied on both sides of "now").
pub const FRESHNESS_WINDOW_MS: u64 = 300_000;
