//! SQL schema definitions.

/// Complete schema for the Agora ledger v1 database.
///
/// The `ledgers` CHECK pins the conservation invariant
/// (`balance + total_cost_staked = 100`); the `stakes` CHECK pins the
/// quadratic-cost invariant (`cost = votes * votes`, `votes` in 1..=10 —
/// a stake driven to zero votes is deleted, never kept as a zero row).
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Topics & Arguments
-- ============================================================

CREATE TABLE IF NOT EXISTS topics (
    topic_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'frozen', 'archived')),
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS arguments (
    argument_id TEXT PRIMARY KEY,
    topic_id TEXT NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    author_pubkey TEXT NOT NULL,
    pruned_at INTEGER,
    total_votes INTEGER NOT NULL DEFAULT 0,
    total_cost INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_arguments_topic ON arguments(topic_id);

-- ============================================================
-- Credit ledgers & stakes
-- ============================================================

CREATE TABLE IF NOT EXISTS ledgers (
    topic_id TEXT NOT NULL REFERENCES topics(topic_id) ON DELETE CASCADE,
    pubkey TEXT NOT NULL,
    balance INTEGER NOT NULL CHECK (balance >= 0),
    total_votes_staked INTEGER NOT NULL DEFAULT 0,
    total_cost_staked INTEGER NOT NULL DEFAULT 0,
    last_interaction_at INTEGER,
    PRIMARY KEY (topic_id, pubkey),
    CHECK (balance + total_cost_staked = 100)
);

CREATE TABLE IF NOT EXISTS stakes (
    topic_id TEXT NOT NULL,
    argument_id TEXT NOT NULL REFERENCES arguments(argument_id) ON DELETE CASCADE,
    voter_pubkey TEXT NOT NULL,
    votes INTEGER NOT NULL CHECK (votes BETWEEN 1 AND 10),
    cost INTEGER NOT NULL CHECK (cost = votes * votes),
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (topic_id, argument_id, voter_pubkey)
);

CREATE INDEX IF NOT EXISTS idx_stakes_argument ON stakes(argument_id);
"#;
