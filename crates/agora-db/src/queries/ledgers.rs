//! Per-(topic, pubkey) credit ledger query functions.

use agora_types::INITIAL_BALANCE;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// A ledger row. At every commit point
/// `balance + total_cost_staked == INITIAL_BALANCE`.
#[derive(Debug, PartialEq, Eq)]
pub struct LedgerRow {
    pub balance: i64,
    pub total_votes_staked: i64,
    pub total_cost_staked: i64,
    pub last_interaction_at: Option<i64>,
}

/// Fetch the ledger row, creating it with the initial balance on first
/// interaction.
pub fn get_or_create(conn: &Connection, topic_id: &str, pubkey: &str) -> Result<LedgerRow> {
    conn.execute(
        "INSERT OR IGNORE INTO ledgers (topic_id, pubkey, balance) VALUES (?1, ?2, ?3)",
        rusqlite::params![topic_id, pubkey, INITIAL_BALANCE],
    )?;
    get(conn, topic_id, pubkey)?
        .ok_or_else(|| DbError::NotFound(format!("ledger ({topic_id}, {pubkey})")))
}

/// Fetch the ledger row if it exists (read-side snapshot for UI display).
pub fn get(conn: &Connection, topic_id: &str, pubkey: &str) -> Result<Option<LedgerRow>> {
    let row = conn
        .query_row(
            "SELECT balance, total_votes_staked, total_cost_staked, last_interaction_at
             FROM ledgers WHERE topic_id = ?1 AND pubkey = ?2",
            [topic_id, pubkey],
            |row| {
                Ok(LedgerRow {
                    balance: row.get(0)?,
                    total_votes_staked: row.get(1)?,
                    total_cost_staked: row.get(2)?,
                    last_interaction_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Overwrite the ledger row with explicit computed values.
///
/// The caller holds the transaction and already knows the row's prior state,
/// so values are written absolutely rather than as relative increments.
pub fn update(
    conn: &Connection,
    topic_id: &str,
    pubkey: &str,
    balance: i64,
    total_votes_staked: i64,
    total_cost_staked: i64,
    last_interaction_at: i64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE ledgers
         SET balance = ?1, total_votes_staked = ?2, total_cost_staked = ?3,
             last_interaction_at = ?4
         WHERE topic_id = ?5 AND pubkey = ?6",
        rusqlite::params![
            balance,
            total_votes_staked,
            total_cost_staked,
            last_interaction_at,
            topic_id,
            pubkey,
        ],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("ledger ({topic_id}, {pubkey})")));
    }
    Ok(())
}
