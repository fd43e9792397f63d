//! Vote-set request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of a `set votes` request.
///
/// `target_votes` is kept as a raw JSON value so that validation (integer,
/// finite, in range) happens in the QV engine against the bytes the client
/// actually sent, not against a lossy numeric conversion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetVotesRequest {
    pub argument_id: String,
    pub target_votes: serde_json::Value,
}

/// Successful response to a `set votes` request.
///
/// The serialized form of this struct is what gets idempotency-cached, so a
/// retried request returns byte-identical output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetVotesResponse {
    pub argument_id: String,
    /// Votes now held by this voter on the argument.
    pub votes: i64,
    /// Quadratic cost of those votes.
    pub cost: i64,
    /// Credits debited (positive) or refunded (negative) by this call.
    pub delta_cost: i64,
    /// Remaining free balance on the voter's topic ledger.
    pub balance: i64,
    /// Argument-wide vote total after this call.
    pub argument_total_votes: i64,
}
