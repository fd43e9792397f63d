//! # agora-qv
//!
//! Pure quadratic-voting arithmetic and policy validation.
//!
//! Holding `n` votes on an argument costs `n²` credits, so each additional
//! vote costs more than the last. Everything in this crate is a pure function
//! of its inputs; the ledger engine calls it with values read under lock and
//! applies the result transactionally.

use agora_types::{MAX_VOTES, MIN_VOTES};
use serde::{Deserialize, Serialize};

/// Error types for vote validation.
#[derive(Debug, thiserror::Error)]
pub enum QvError {
    /// The target vote value is malformed (non-integer, negative, or out of
    /// range).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The policy only allows decreases and the target is an increase.
    #[error("vote increases are not permitted on this argument")]
    IncreaseForbidden,

    /// The voter's free balance cannot cover the additional cost.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: i64, required: i64 },
}

impl QvError {
    /// Stable machine-readable error code for the HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            QvError::BadRequest(_) => "BAD_REQUEST",
            QvError::IncreaseForbidden => "ARGUMENT_PRUNED_INCREASE_FORBIDDEN",
            QvError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
        }
    }
}

/// Convenience result type for vote validation.
pub type Result<T> = std::result::Result<T, QvError>;

/// Quadratic cost of holding `votes` votes.
pub fn cost(votes: i64) -> i64 {
    votes * votes
}

/// The computed difference between a current and a target vote count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDelta {
    pub delta_votes: i64,
    pub previous_cost: i64,
    pub target_cost: i64,
    /// Positive = credits to debit, negative = credits to refund.
    pub delta_cost: i64,
}

/// Compute the vote and cost delta for moving `current -> target`.
///
/// Antisymmetric by construction: the delta for `b -> a` is the negation of
/// the delta for `a -> b`.
pub fn calculate_set_votes_delta(current_votes: i64, target_votes: i64) -> VoteDelta {
    let previous_cost = cost(current_votes);
    let target_cost = cost(target_votes);
    VoteDelta {
        delta_votes: target_votes - current_votes,
        previous_cost,
        target_cost,
        delta_cost: target_cost - previous_cost,
    }
}

/// Write policy for the argument being voted on.
///
/// `only_allow_decrease` is set when the argument is pruned or its topic is
/// frozen/archived: participants may always withdraw staked credits but may
/// not stake more.
#[derive(Clone, Copy, Debug, Default)]
pub struct VotePolicy {
    pub only_allow_decrease: bool,
}

/// A validated transition, ready to be applied under the caller's lock.
#[derive(Clone, Copy, Debug)]
pub struct ValidatedSetVotes {
    pub delta: VoteDelta,
    /// Free balance after applying the delta. Applying this keeps the ledger
    /// conservation invariant `balance + total_cost_staked == INITIAL_BALANCE`.
    pub new_balance: i64,
}

/// Validate a `current -> target` transition against range, policy, and
/// balance.
///
/// A no-op transition (`current == target`) always succeeds with a zero
/// delta, which is what makes retries of an already-applied request harmless
/// at this layer.
///
/// # Errors
///
/// - [`QvError::BadRequest`] if `target_votes` is outside `[0, 10]`
/// - [`QvError::IncreaseForbidden`] if the policy is decrease-only and the
///   target exceeds the current count
/// - [`QvError::InsufficientBalance`] if the additional cost exceeds `balance`
pub fn validate_set_votes(
    current_votes: i64,
    target_votes: i64,
    balance: i64,
    policy: VotePolicy,
) -> Result<ValidatedSetVotes> {
    if !(MIN_VOTES..=MAX_VOTES).contains(&target_votes) {
        return Err(QvError::BadRequest(format!(
            "target votes must be in [{MIN_VOTES}, {MAX_VOTES}], got {target_votes}"
        )));
    }
    if policy.only_allow_decrease && target_votes > current_votes {
        return Err(QvError::IncreaseForbidden);
    }

    let delta = calculate_set_votes_delta(current_votes, target_votes);
    if delta.delta_cost > 0 && balance < delta.delta_cost {
        return Err(QvError::InsufficientBalance {
            available: balance,
            required: delta.delta_cost,
        });
    }

    tracing::trace!(
        current_votes,
        target_votes,
        delta_cost = delta.delta_cost,
        "vote transition validated"
    );

    Ok(ValidatedSetVotes {
        delta,
        new_balance: balance - delta.delta_cost,
    })
}

/// Parse a target vote count from an untrusted JSON value.
///
/// Clients send `target_votes` as a JSON number; anything that is not an
/// exact integer (floats, strings, booleans, nulls — and NaN/Infinity, which
/// have no JSON representation to begin with) is a `BAD_REQUEST`.
pub fn target_votes_from_json(value: &serde_json::Value) -> Result<i64> {
    let number = value
        .as_number()
        .ok_or_else(|| QvError::BadRequest(format!("target votes must be a number, got {value}")))?;
    let target = number.as_i64().ok_or_else(|| {
        QvError::BadRequest(format!("target votes must be an integer, got {number}"))
    })?;
    if !(MIN_VOTES..=MAX_VOTES).contains(&target) {
        return Err(QvError::BadRequest(format!(
            "target votes must be in [{MIN_VOTES}, {MAX_VOTES}], got {target}"
        )));
    }
    Ok(target)
}
