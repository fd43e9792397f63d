//! The vote-set transaction state machine.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, TransactionBehavior};

use agora_db::queries::{arguments, ledgers, stakes};
use agora_qv::{self as qv, VotePolicy};
use agora_replay::{ConditionalStore, IdempotencyCache, NonceOutcome, NonceRegistry};
use agora_types::{AuthenticatedIdentity, SetVotesRequest, SetVotesResponse};

use crate::notify::ChangeNotifier;
use crate::{LedgerError, Result};

/// Applies validated vote transitions to the credit ledger.
///
/// The engine assumes its caller (the request authenticator) has already
/// verified the signature behind `identity`; it re-verifies nothing
/// cryptographic. What it does own is replay sequencing: the idempotency
/// cache is consulted *before* the nonce registry so a benign retry of a
/// committed request is served from cache instead of being mistaken for an
/// attack.
pub struct LedgerEngine<S, N> {
    nonces: NonceRegistry<S>,
    idempotency: IdempotencyCache<S>,
    notifier: N,
}

impl<S, N> LedgerEngine<S, N>
where
    S: ConditionalStore + Clone,
    N: ChangeNotifier,
{
    /// Build an engine over a shared conditional store and a notifier.
    ///
    /// Pass the same store the authenticator uses so both layers see one
    /// consumption record per `(pubkey, nonce)`.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            nonces: NonceRegistry::new(store.clone()),
            idempotency: IdempotencyCache::new(store),
            notifier,
        }
    }

    /// Set the authenticated voter's votes on an argument.
    ///
    /// Returns the serialized success response. A retry with the same
    /// `(pubkey, nonce)` returns the identical bytes without touching the
    /// database.
    pub fn set_votes(
        &self,
        conn: &mut Connection,
        identity: &AuthenticatedIdentity,
        nonce: &str,
        request: &SetVotesRequest,
    ) -> Result<Vec<u8>> {
        self.set_votes_at(conn, identity, nonce, request, now_ms())
    }

    /// [`Self::set_votes`] with an explicit clock reading (tests).
    pub fn set_votes_at(
        &self,
        conn: &mut Connection,
        identity: &AuthenticatedIdentity,
        nonce: &str,
        request: &SetVotesRequest,
        now_ms: i64,
    ) -> Result<Vec<u8>> {
        let pubkey = identity.pubkey_hex.as_str();

        // Idempotency check: a cached response means this exact nonce already
        // committed; return it verbatim regardless of the new request body.
        if let Some(cached) = self.idempotency.get(pubkey, nonce) {
            tracing::debug!(pubkey, nonce, "serving idempotent retry from cache");
            return Ok(cached);
        }

        // Replay check: consumed nonce without a cached response is a real
        // replay. Atomic set-if-absent, so concurrent duplicates race to a
        // single winner. A request that fails validation below leaves its
        // nonce consumed; clients generate a fresh nonce per attempt.
        if self.nonces.consume(pubkey, nonce) == NonceOutcome::AlreadyConsumed {
            tracing::warn!(pubkey, nonce, "nonce replay rejected");
            return Err(LedgerError::NonceReplay);
        }

        let target_votes = qv::target_votes_from_json(&request.target_votes)?;
        let argument_id = request.argument_id.as_str();

        // Immediate transaction: takes the write lock up front, so every
        // read below sees the state this transaction will modify. Read order
        // is fixed (argument+topic, ledger, stake) and must stay fixed.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let snapshot = arguments::get_snapshot(&tx, argument_id)?
            .filter(|s| s.topic_id == identity.topic_id)
            .ok_or_else(|| LedgerError::ArgumentNotFound(argument_id.to_string()))?;

        let ledger = ledgers::get_or_create(&tx, &identity.topic_id, pubkey)?;

        let current_votes = stakes::get(&tx, &identity.topic_id, argument_id, pubkey)?
            .map(|stake| stake.votes)
            .unwrap_or(0);

        // Policy check: pruned arguments and non-active topics are
        // decrease-only. Decided here, before the delta engine, so the two
        // rejection reasons keep distinct codes.
        if target_votes > current_votes && !snapshot.allows_increase() {
            return Err(if snapshot.pruned_at.is_some() {
                LedgerError::IncreaseForbidden
            } else {
                LedgerError::TopicStatusDisallowsWrite(snapshot.topic_status)
            });
        }

        let validated =
            qv::validate_set_votes(current_votes, target_votes, ledger.balance, VotePolicy::default())?;
        let delta = validated.delta;

        // Apply writes. Ledger values are explicit computed absolutes (the
        // row's prior state is known under this transaction); argument
        // aggregates are relative increments.
        if target_votes == 0 {
            stakes::delete(&tx, &identity.topic_id, argument_id, pubkey)?;
        } else {
            stakes::upsert(
                &tx,
                &identity.topic_id,
                argument_id,
                pubkey,
                target_votes,
                delta.target_cost,
                now_ms,
            )?;
        }
        ledgers::update(
            &tx,
            &identity.topic_id,
            pubkey,
            validated.new_balance,
            ledger.total_votes_staked + delta.delta_votes,
            ledger.total_cost_staked + delta.delta_cost,
            now_ms,
        )?;
        arguments::increment_totals(&tx, argument_id, delta.delta_votes, delta.delta_cost)?;

        let response = SetVotesResponse {
            argument_id: argument_id.to_string(),
            votes: target_votes,
            cost: delta.target_cost,
            delta_cost: delta.delta_cost,
            balance: validated.new_balance,
            argument_total_votes: snapshot.total_votes + delta.delta_votes,
        };
        let body = serde_json::to_vec(&response)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        tx.commit()?;

        // Success only: failed validations above never reach the cache.
        self.idempotency.store(pubkey, nonce, &body);

        // Best-effort; the commit stands whether or not anyone hears of it.
        self.notifier
            .argument_changed(&identity.topic_id, argument_id, "new_vote");

        tracing::debug!(
            pubkey,
            argument_id,
            votes = target_votes,
            delta_cost = delta.delta_cost,
            balance = validated.new_balance,
            "vote transition committed"
        );

        Ok(body)
    }
}

/// Current Unix time in milliseconds.
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
