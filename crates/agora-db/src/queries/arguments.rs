//! Argument query functions.

use agora_types::TopicStatus;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// An argument row joined with its topic's status — the first read the
/// ledger engine takes inside a vote transaction.
#[derive(Debug)]
pub struct ArgumentSnapshot {
    pub topic_id: String,
    pub topic_status: TopicStatus,
    pub pruned_at: Option<i64>,
    pub total_votes: i64,
    pub total_cost: i64,
}

impl ArgumentSnapshot {
    /// Whether vote increases are currently permitted on this argument.
    pub fn allows_increase(&self) -> bool {
        self.pruned_at.is_none() && self.topic_status.allows_increase()
    }
}

/// Insert a new argument.
pub fn insert_argument(
    conn: &Connection,
    argument_id: &str,
    topic_id: &str,
    content: &str,
    author_pubkey: &str,
    created_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO arguments (argument_id, topic_id, content, author_pubkey, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![argument_id, topic_id, content, author_pubkey, created_at],
    )?;
    Ok(())
}

/// Read an argument together with its topic status. `None` if the argument
/// does not exist.
pub fn get_snapshot(conn: &Connection, argument_id: &str) -> Result<Option<ArgumentSnapshot>> {
    let row = conn
        .query_row(
            "SELECT a.topic_id, t.status, a.pruned_at, a.total_votes, a.total_cost
             FROM arguments a JOIN topics t ON t.topic_id = a.topic_id
             WHERE a.argument_id = ?1",
            [argument_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((topic_id, status, pruned_at, total_votes, total_cost)) => {
            let topic_status = TopicStatus::parse(&status)
                .ok_or_else(|| DbError::Constraint(format!("unknown topic status {status:?}")))?;
            Ok(Some(ArgumentSnapshot {
                topic_id,
                topic_status,
                pruned_at,
                total_votes,
                total_cost,
            }))
        }
    }
}

/// Mark an argument as pruned. Existing stakes stay withdrawable.
pub fn prune_argument(conn: &Connection, argument_id: &str, pruned_at: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE arguments SET pruned_at = ?1 WHERE argument_id = ?2 AND pruned_at IS NULL",
        rusqlite::params![pruned_at, argument_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "argument {argument_id} not found or already pruned"
        )));
    }
    Ok(())
}

/// Atomically increment the argument's vote/cost aggregates.
///
/// Runs inside the same transaction as the stake mutation so the aggregates
/// always equal the sum of live stakes.
pub fn increment_totals(
    conn: &Connection,
    argument_id: &str,
    delta_votes: i64,
    delta_cost: i64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE arguments
         SET total_votes = total_votes + ?1, total_cost = total_cost + ?2
         WHERE argument_id = ?3",
        rusqlite::params![delta_votes, delta_cost, argument_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("argument {argument_id}")));
    }
    Ok(())
}
