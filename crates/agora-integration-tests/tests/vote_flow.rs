//! Integration test: full signed-vote lifecycle.
//!
//! Exercises the complete server-side pipeline with a real client-side
//! signer:
//! 1. Client derives a topic keypair from a mnemonic
//! 2. Client signs a vote-set request (headers + raw body)
//! 3. Server authenticates the request
//! 4. Ledger engine applies the vote transactionally
//! 5. Retries, replays, and invariants behave as specified

use std::sync::Arc;

use agora_auth::{Authenticator, SignedRequest};
use agora_crypto::canonical::sign_request_v1;
use agora_crypto::derive::{derive_topic_keypair, TopicKeypair};
use agora_crypto::mnemonic::mnemonic_to_master_seed;
use agora_db::queries::{arguments, ledgers, stakes, topics};
use agora_ledger::{BroadcastNotifier, LedgerEngine, LedgerError, NoopNotifier};
use agora_replay::MemoryStore;
use agora_types::{AuthenticatedIdentity, SetVotesRequest, SetVotesResponse, INITIAL_BALANCE};

const MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const TOPIC: &str = "energy-transition";
const NOW_MS: u64 = 1_700_000_000_000;

struct Harness {
    conn: rusqlite::Connection,
    authenticator: Authenticator<Arc<MemoryStore>>,
    engine: LedgerEngine<Arc<MemoryStore>, NoopNotifier>,
    keypair: TopicKeypair,
}

fn harness() -> Harness {
    let conn = agora_db::open_memory().expect("open db");
    topics::insert_topic(&conn, TOPIC, "Energy transition", 1_000).expect("topic");
    arguments::insert_argument(&conn, "a1", TOPIC, "Tax carbon", "author", 1_001)
        .expect("argument");
    arguments::insert_argument(&conn, "a2", TOPIC, "Expand nuclear", "author", 1_002)
        .expect("argument");

    // One shared conditional store: the authenticator and the engine must
    // see the same nonce consumption records.
    let store = Arc::new(MemoryStore::new());
    let seed = mnemonic_to_master_seed(MNEMONIC, "").expect("seed");
    Harness {
        conn,
        authenticator: Authenticator::new(Arc::clone(&store)),
        engine: LedgerEngine::new(store, NoopNotifier),
        keypair: derive_topic_keypair(&seed, TOPIC).expect("keypair"),
    }
}

/// Client side: build the signed vote request body and headers.
fn signed_vote(keypair: &TopicKeypair, argument_id: &str, target: i64, nonce: &str) -> (Vec<u8>, String, String) {
    let body = serde_json::to_vec(&serde_json::json!({
        "argument_id": argument_id,
        "target_votes": target,
    }))
    .expect("body");
    let signature = sign_request_v1(
        &keypair.signing_key,
        "POST",
        "/v1/votes",
        NOW_MS,
        nonce,
        Some(&body),
    )
    .expect("sign");
    (body, keypair.pubkey_hex(), signature.to_hex())
}

/// Server side: authenticate, parse, and apply one vote-set request.
fn submit(
    harness: &mut Harness,
    argument_id: &str,
    target: i64,
    nonce: &str,
) -> Result<SetVotesResponse, LedgerError> {
    let (body, pubkey_hex, signature_hex) = signed_vote(&harness.keypair, argument_id, target, nonce);
    let request = SignedRequest {
        method: "POST",
        path: "/v1/votes",
        pubkey_hex: &pubkey_hex,
        signature_hex: &signature_hex,
        timestamp_ms: NOW_MS,
        nonce,
        body: Some(&body),
    };
    let identity = harness
        .authenticator
        .authenticate_at(&request, TOPIC, NOW_MS)
        .expect("authenticate");

    let parsed: SetVotesRequest = serde_json::from_slice(&body).expect("parse body");
    let response = harness
        .engine
        .set_votes(&mut harness.conn, &identity, nonce, &parsed)?;
    Ok(serde_json::from_slice(&response).expect("parse response"))
}

fn assert_conservation(harness: &Harness, pubkey_hex: &str) {
    let ledger = ledgers::get(&harness.conn, TOPIC, pubkey_hex)
        .expect("query")
        .expect("ledger exists");
    assert_eq!(ledger.balance + ledger.total_cost_staked, INITIAL_BALANCE);
}

#[test]
fn full_vote_lifecycle() {
    let mut harness = harness();
    let pubkey_hex = harness.keypair.pubkey_hex();

    // First vote: 0 -> 3 costs 9.
    let response = submit(&mut harness, "a1", 3, "n1").expect("vote 3");
    assert_eq!(response.votes, 3);
    assert_eq!(response.cost, 9);
    assert_eq!(response.balance, 91);
    assert_conservation(&harness, &pubkey_hex);

    // Bump: 3 -> 4 costs 7 more.
    let response = submit(&mut harness, "a1", 4, "n2").expect("vote 4");
    assert_eq!(response.delta_cost, 7);
    assert_eq!(response.balance, 84);

    // Spread credits to a second argument.
    let response = submit(&mut harness, "a2", 6, "n3").expect("vote 6");
    assert_eq!(response.balance, 84 - 36);
    assert_conservation(&harness, &pubkey_hex);

    // Withdraw fully from a1; stake row disappears.
    let response = submit(&mut harness, "a1", 0, "n4").expect("withdraw");
    assert_eq!(response.balance, 100 - 36);
    assert_eq!(
        stakes::get(&harness.conn, TOPIC, "a1", &pubkey_hex).expect("query"),
        None
    );
    assert_conservation(&harness, &pubkey_hex);
}

#[test]
fn max_stake_boundary() {
    let mut harness = harness();

    // 0 -> 10 with a fresh balance of 100 succeeds and zeroes the balance.
    let response = submit(&mut harness, "a1", 10, "n1").expect("max stake");
    assert_eq!(response.balance, 0);

    // With only 51 free credits, 0 -> 10 on another argument fails.
    let refund = submit(&mut harness, "a1", 7, "n2").expect("reduce to 7");
    assert_eq!(refund.balance, 51);
    let result = submit(&mut harness, "a2", 10, "n3");
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientBalance { .. })
    ));
}

#[test]
fn idempotent_retry_is_byte_identical() {
    let mut harness = harness();

    let (body, pubkey_hex, signature_hex) = signed_vote(&harness.keypair, "a1", 3, "n1");
    let identity = AuthenticatedIdentity::new(TOPIC, &pubkey_hex);
    let parsed: SetVotesRequest = serde_json::from_slice(&body).expect("parse");

    let first = harness
        .engine
        .set_votes(&mut harness.conn, &identity, "n1", &parsed)
        .expect("first");
    let retry = harness
        .engine
        .set_votes(&mut harness.conn, &identity, "n1", &parsed)
        .expect("retry");
    assert_eq!(first, retry, "retried response must be byte-identical");

    // One net mutation only.
    let ledger = ledgers::get(&harness.conn, TOPIC, &pubkey_hex)
        .expect("query")
        .expect("exists");
    assert_eq!(ledger.balance, 91);

    // The signature for the original request still authenticates, so a
    // replayed HTTP request would reach the engine and be served from cache.
    let request = SignedRequest {
        method: "POST",
        path: "/v1/votes",
        pubkey_hex: &pubkey_hex,
        signature_hex: &signature_hex,
        timestamp_ms: NOW_MS,
        nonce: "n1",
        body: Some(&body),
    };
    assert!(harness
        .authenticator
        .authenticate_at(&request, TOPIC, NOW_MS)
        .is_ok());
}

#[test]
fn policy_rejections_surface_distinct_codes() {
    let mut harness = harness();

    submit(&mut harness, "a1", 5, "n1").expect("vote 5");
    arguments::prune_argument(&harness.conn, "a1", NOW_MS as i64).expect("prune");

    let err = submit(&mut harness, "a1", 6, "n2").expect_err("increase on pruned");
    assert_eq!(err.code(), "ARGUMENT_PRUNED_INCREASE_FORBIDDEN");

    // Decrease remains allowed on the pruned argument.
    submit(&mut harness, "a1", 2, "n3").expect("decrease on pruned");

    topics::set_status(&harness.conn, TOPIC, agora_types::TopicStatus::Archived)
        .expect("archive");
    let err = submit(&mut harness, "a2", 1, "n4").expect_err("increase on archived topic");
    assert_eq!(err.code(), "TOPIC_STATUS_DISALLOWS_WRITE");

    // Withdrawal from an archived topic still works.
    let response = submit(&mut harness, "a1", 0, "n5").expect("withdraw");
    assert_eq!(response.balance, INITIAL_BALANCE);
}

#[test]
fn concurrent_votes_on_one_ledger_serialize() {
    let db_path = std::env::temp_dir().join(format!("agora-vote-race-{}.db", std::process::id()));
    let cleanup = || {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(std::path::PathBuf::from(path));
        }
    };
    cleanup();

    {
        let conn = agora_db::open(&db_path).expect("open db");
        topics::insert_topic(&conn, TOPIC, "Energy transition", 1_000).expect("topic");
        arguments::insert_argument(&conn, "a1", TOPIC, "Tax carbon", "author", 1_001)
            .expect("argument");
        arguments::insert_argument(&conn, "a2", TOPIC, "Expand nuclear", "author", 1_002)
            .expect("argument");
    }

    // Eight threads, each with its own connection and a shared conditional
    // store, all hammering the same (topic, pubkey) ledger row. Stakes of
    // 8..=10 cost 64..=100, so any two arguments staked together overdraw
    // the budget and some threads must lose on balance.
    let store = Arc::new(MemoryStore::new());
    let mut handles = Vec::new();
    for i in 0..8u32 {
        let store = Arc::clone(&store);
        let db_path = db_path.clone();
        handles.push(std::thread::spawn(move || {
            let mut conn = agora_db::open(&db_path).expect("open db");
            let engine = LedgerEngine::new(store, NoopNotifier);
            let identity = AuthenticatedIdentity::new(TOPIC, "alice");
            let request = SetVotesRequest {
                argument_id: if i % 2 == 0 { "a1" } else { "a2" }.to_string(),
                target_votes: serde_json::json!(8 + i64::from(i % 3)),
            };
            engine.set_votes(&mut conn, &identity, &format!("race-{i}"), &request)
        }));
    }

    for handle in handles {
        let outcome = handle.join().expect("thread joins");
        assert!(
            matches!(
                outcome,
                Ok(_) | Err(LedgerError::InsufficientBalance { .. })
            ),
            "unexpected outcome under contention: {outcome:?}"
        );
    }

    // Whatever interleaving won, conservation and the aggregates must hold.
    let conn = agora_db::open(&db_path).expect("open db");
    let ledger = ledgers::get(&conn, TOPIC, "alice")
        .expect("query")
        .expect("ledger exists");
    assert_eq!(ledger.balance + ledger.total_cost_staked, INITIAL_BALANCE);
    for argument_id in ["a1", "a2"] {
        let (votes, cost) = stakes::sum_for_argument(&conn, argument_id).expect("sum");
        let snap = arguments::get_snapshot(&conn, argument_id)
            .expect("query")
            .expect("exists");
        assert_eq!(snap.total_votes, votes);
        assert_eq!(snap.total_cost, cost);
    }
    drop(conn);
    cleanup();
}

#[tokio::test]
async fn committed_vote_emits_change_signal() {
    let mut conn = agora_db::open_memory().expect("open db");
    topics::insert_topic(&conn, TOPIC, "Energy transition", 1_000).expect("topic");
    arguments::insert_argument(&conn, "a1", TOPIC, "Tax carbon", "author", 1_001)
        .expect("argument");

    let notifier = BroadcastNotifier::new(16);
    let mut receiver = notifier.subscribe();
    let engine = LedgerEngine::new(Arc::new(MemoryStore::new()), notifier.clone());

    let identity = AuthenticatedIdentity::new(TOPIC, "cafe".repeat(16));
    let request = SetVotesRequest {
        argument_id: "a1".to_string(),
        target_votes: serde_json::json!(2),
    };
    engine
        .set_votes(&mut conn, &identity, "n1", &request)
        .expect("vote");

    let event = receiver.recv().await.expect("change signal");
    assert_eq!(event.topic_id, TOPIC);
    assert_eq!(event.argument_id, "a1");
    assert_eq!(event.reason, "new_vote");

    // A failed request must emit nothing.
    let bad = SetVotesRequest {
        argument_id: "a1".to_string(),
        target_votes: serde_json::json!(42),
    };
    let _ = engine.set_votes(&mut conn, &identity, "n2", &bad);
    assert_eq!(notifier.sequence(), 1);
}

#[test]
fn cross_topic_pseudonyms_have_independent_ledgers() {
    let mut harness = harness();
    topics::insert_topic(&harness.conn, "other-topic", "Other", 1_000).expect("topic");
    arguments::insert_argument(&harness.conn, "b1", "other-topic", "Arg", "author", 1_001)
        .expect("argument");

    // Same mnemonic, different topic: different pubkey, fresh ledger.
    let seed = mnemonic_to_master_seed(MNEMONIC, "").expect("seed");
    let other_keypair = derive_topic_keypair(&seed, "other-topic").expect("keypair");
    assert_ne!(other_keypair.pubkey_hex(), harness.keypair.pubkey_hex());

    submit(&mut harness, "a1", 9, "n1").expect("heavy stake in first topic");

    let identity = AuthenticatedIdentity::new("other-topic", other_keypair.pubkey_hex());
    let request = SetVotesRequest {
        argument_id: "b1".to_string(),
        target_votes: serde_json::json!(10),
    };
    let response = harness
        .engine
        .set_votes(&mut harness.conn, &identity, "n2", &request)
        .expect("full stake in other topic");
    let parsed: SetVotesResponse = serde_json::from_slice(&response).expect("parse");
    assert_eq!(parsed.balance, 0);
}
