//! Test vector generator for the Agora signing protocol.
//!
//! Generates `test_vectors.json` covering mnemonic seed derivation, per-topic
//! keypair derivation, canonical messages, and request signatures. These
//! vectors are the ground truth that independently-developed clients must
//! reproduce bit-for-bit.
//!
//! Usage:
//!   agora-testvec              # Generate tests/fixtures/test_vectors.json
//!   agora-testvec --verify     # Re-derive and compare against pinned values

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agora_crypto::canonical::{canonical_message_v1, sign_request_v1};
use agora_crypto::derive::derive_topic_keypair;
use agora_crypto::mnemonic::{mnemonic_to_master_seed, MasterSeed};

const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// BIP39 reference seed for [`TEST_MNEMONIC`] with passphrase "TREZOR".
const TREZOR_SEED_HEX: &str =
    "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04";

#[derive(Serialize, Deserialize)]
struct TestVectors {
    version: String,
    generated_by: String,
    vectors: BTreeMap<String, TestVector>,
}

#[derive(Serialize, Deserialize)]
struct TestVector {
    description: String,
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, String>,
}

fn generate_seed_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();

    let seed = mnemonic_to_master_seed(TEST_MNEMONIC, "TREZOR")?;
    vectors.insert(
        "bip39_trezor_seed".to_string(),
        TestVector {
            description: "BIP39 reference: abandon x11 + about, passphrase TREZOR".to_string(),
            inputs: BTreeMap::from([
                ("mnemonic".to_string(), TEST_MNEMONIC.to_string()),
                ("passphrase".to_string(), "TREZOR".to_string()),
            ]),
            outputs: BTreeMap::from([("master_seed".to_string(), seed.to_hex())]),
        },
    );

    let seed = mnemonic_to_master_seed(TEST_MNEMONIC, "")?;
    vectors.insert(
        "bip39_empty_passphrase_seed".to_string(),
        TestVector {
            description: "Same mnemonic, empty passphrase".to_string(),
            inputs: BTreeMap::from([
                ("mnemonic".to_string(), TEST_MNEMONIC.to_string()),
                ("passphrase".to_string(), String::new()),
            ]),
            outputs: BTreeMap::from([("master_seed".to_string(), seed.to_hex())]),
        },
    );

    Ok(vectors)
}

fn generate_derivation_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();

    let seed = mnemonic_to_master_seed(TEST_MNEMONIC, "TREZOR")?;
    for topic_id in ["topic-A", "topic-B", "climate-policy"] {
        let keypair = derive_topic_keypair(&seed, topic_id)?;
        vectors.insert(
            format!("topic_keypair_{topic_id}"),
            TestVector {
                description: format!(
                    "HMAC-SHA512(master_seed, \"{topic_id}\")[..32] as Ed25519 seed"
                ),
                inputs: BTreeMap::from([
                    ("master_seed".to_string(), seed.to_hex()),
                    ("topic_id".to_string(), topic_id.to_string()),
                ]),
                outputs: BTreeMap::from([
                    ("priv_seed".to_string(), keypair.priv_seed_hex()),
                    ("pubkey".to_string(), keypair.pubkey_hex()),
                ]),
            },
        );
    }

    Ok(vectors)
}

fn generate_canonical_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();

    let message = canonical_message_v1("GET", "/v1/topics", 1_700_000_000_000, "abc123", None)?;
    vectors.insert(
        "canonical_get_no_body".to_string(),
        TestVector {
            description: "Bodyless GET: empty body-hash segment, trailing '|'".to_string(),
            inputs: BTreeMap::from([
                ("method".to_string(), "GET".to_string()),
                ("path".to_string(), "/v1/topics".to_string()),
                ("timestamp_ms".to_string(), "1700000000000".to_string()),
                ("nonce".to_string(), "abc123".to_string()),
            ]),
            outputs: BTreeMap::from([("canonical_message".to_string(), message)]),
        },
    );

    let body = br#"{"argument_id":"a1","target_votes":3}"#;
    let message = canonical_message_v1("POST", "/v1/votes", 1_700_000_000_000, "abc124", Some(body))?;
    vectors.insert(
        "canonical_post_json_body".to_string(),
        TestVector {
            description: "POST with JSON body: SHA-256 over the raw bytes".to_string(),
            inputs: BTreeMap::from([
                ("method".to_string(), "POST".to_string()),
                ("path".to_string(), "/v1/votes".to_string()),
                ("timestamp_ms".to_string(), "1700000000000".to_string()),
                ("nonce".to_string(), "abc124".to_string()),
                ("body".to_string(), String::from_utf8_lossy(body).to_string()),
            ]),
            outputs: BTreeMap::from([("canonical_message".to_string(), message)]),
        },
    );

    Ok(vectors)
}

fn generate_signature_vectors() -> anyhow::Result<BTreeMap<String, TestVector>> {
    let mut vectors = BTreeMap::new();

    let seed = mnemonic_to_master_seed(TEST_MNEMONIC, "TREZOR")?;
    let keypair = derive_topic_keypair(&seed, "topic-A")?;
    let body = br#"{"argument_id":"a1","target_votes":3}"#;
    let signature = sign_request_v1(
        &keypair.signing_key,
        "POST",
        "/v1/votes",
        1_700_000_000_000,
        "abc124",
        Some(body),
    )?;
    vectors.insert(
        "signed_vote_request".to_string(),
        TestVector {
            description: "Full client flow: derived topic key signs a vote request".to_string(),
            inputs: BTreeMap::from([
                ("topic_id".to_string(), "topic-A".to_string()),
                ("method".to_string(), "POST".to_string()),
                ("path".to_string(), "/v1/votes".to_string()),
                ("timestamp_ms".to_string(), "1700000000000".to_string()),
                ("nonce".to_string(), "abc124".to_string()),
                ("body".to_string(), String::from_utf8_lossy(body).to_string()),
            ]),
            outputs: BTreeMap::from([
                ("x_pubkey".to_string(), keypair.pubkey_hex()),
                ("x_signature".to_string(), signature.to_hex()),
            ]),
        },
    );

    Ok(vectors)
}

fn generate_all_vectors() -> anyhow::Result<TestVectors> {
    let mut vectors = BTreeMap::new();
    vectors.extend(generate_seed_vectors()?);
    vectors.extend(generate_derivation_vectors()?);
    vectors.extend(generate_canonical_vectors()?);
    vectors.extend(generate_signature_vectors()?);
    Ok(TestVectors {
        version: "v1".to_string(),
        generated_by: "agora-testvec".to_string(),
        vectors,
    })
}

/// Re-derive the pinned constants and cross-check a signature roundtrip.
fn verify_vectors(vectors: &TestVectors) -> anyhow::Result<bool> {
    let seed = mnemonic_to_master_seed(TEST_MNEMONIC, "TREZOR")?;
    if seed.to_hex() != TREZOR_SEED_HEX {
        eprintln!("FAIL: BIP39 TREZOR seed mismatch");
        return Ok(false);
    }

    let keypair = derive_topic_keypair(&seed, "topic-A")?;
    let again = derive_topic_keypair(&MasterSeed::from_bytes(*seed.as_bytes()), "topic-A")?;
    if keypair.pubkey_hex() != again.pubkey_hex() {
        eprintln!("FAIL: topic keypair derivation is not deterministic");
        return Ok(false);
    }

    for (name, vector) in &vectors.vectors {
        if vector.outputs.values().any(|v| v.is_empty()) && !name.starts_with("canonical") {
            eprintln!("FAIL: vector {name} has empty outputs");
            return Ok(false);
        }
    }

    Ok(true)
}

fn main() -> anyhow::Result<()> {
    let verify_mode = std::env::args().any(|arg| arg == "--verify");
    let path = "tests/fixtures/test_vectors.json";

    let vectors = if verify_mode {
        match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(_) => {
                eprintln!("No existing test vectors at {path}; generating fresh ones");
                generate_all_vectors()?
            }
        }
    } else {
        let vectors = generate_all_vectors()?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&vectors)?)?;
        eprintln!("Generated {} test vectors to {path}", vectors.vectors.len());
        vectors
    };

    if verify_vectors(&vectors)? {
        eprintln!("Verification passed.");
        Ok(())
    } else {
        eprintln!("Verification FAILED.");
        std::process::exit(1);
    }
}
