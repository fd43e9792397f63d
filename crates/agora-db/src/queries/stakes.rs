//! Stake query functions.

use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// A live stake row. `cost == votes * votes` is schema-enforced.
#[derive(Debug, PartialEq, Eq)]
pub struct StakeRow {
    pub votes: i64,
    pub cost: i64,
}

/// Fetch a voter's stake on an argument, if one exists.
pub fn get(
    conn: &Connection,
    topic_id: &str,
    argument_id: &str,
    voter_pubkey: &str,
) -> Result<Option<StakeRow>> {
    let row = conn
        .query_row(
            "SELECT votes, cost FROM stakes
             WHERE topic_id = ?1 AND argument_id = ?2 AND voter_pubkey = ?3",
            [topic_id, argument_id, voter_pubkey],
            |row| {
                Ok(StakeRow {
                    votes: row.get(0)?,
                    cost: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Insert or update a stake. Callers must not pass zero votes — a stake
/// driven to zero is deleted via [`delete`], not stored as a zero row.
pub fn upsert(
    conn: &Connection,
    topic_id: &str,
    argument_id: &str,
    voter_pubkey: &str,
    votes: i64,
    cost: i64,
    updated_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO stakes (topic_id, argument_id, voter_pubkey, votes, cost, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (topic_id, argument_id, voter_pubkey)
         DO UPDATE SET votes = ?4, cost = ?5, updated_at = ?6",
        rusqlite::params![topic_id, argument_id, voter_pubkey, votes, cost, updated_at],
    )?;
    Ok(())
}

/// Delete a stake (the `votes == 0` representation).
pub fn delete(
    conn: &Connection,
    topic_id: &str,
    argument_id: &str,
    voter_pubkey: &str,
) -> Result<()> {
    conn.execute(
        "DELETE FROM stakes
         WHERE topic_id = ?1 AND argument_id = ?2 AND voter_pubkey = ?3",
        [topic_id, argument_id, voter_pubkey],
    )?;
    Ok(())
}

/// Sum of live stakes on an argument. Used to cross-check the argument's
/// denormalized aggregates.
pub fn sum_for_argument(conn: &Connection, argument_id: &str) -> Result<(i64, i64)> {
    let sums = conn.query_row(
        "SELECT COALESCE(SUM(votes), 0), COALESCE(SUM(cost), 0)
         FROM stakes WHERE argument_id = ?1",
        [argument_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{arguments, topics};

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        topics::insert_topic(&conn, "t1", "Energy policy", 1_000).expect("topic");
        arguments::insert_argument(&conn, "a1", "t1", "Tax carbon", "feedbeef", 1_001)
            .expect("argument");
        conn
    }

    #[test]
    fn test_upsert_and_get() {
        let conn = test_db();
        assert_eq!(get(&conn, "t1", "a1", "pk").expect("query"), None);
        upsert(&conn, "t1", "a1", "pk", 3, 9, 2_000).expect("insert");
        let row = get(&conn, "t1", "a1", "pk").expect("query").expect("exists");
        assert_eq!(row, StakeRow { votes: 3, cost: 9 });

        upsert(&conn, "t1", "a1", "pk", 4, 16, 2_001).expect("update");
        let row = get(&conn, "t1", "a1", "pk").expect("query").expect("exists");
        assert_eq!(row, StakeRow { votes: 4, cost: 16 });
    }

    #[test]
    fn test_delete() {
        let conn = test_db();
        upsert(&conn, "t1", "a1", "pk", 3, 9, 2_000).expect("insert");
        delete(&conn, "t1", "a1", "pk").expect("delete");
        assert_eq!(get(&conn, "t1", "a1", "pk").expect("query"), None);
    }

    #[test]
    fn test_quadratic_cost_check_enforced() {
        let conn = test_db();
        assert!(upsert(&conn, "t1", "a1", "pk", 3, 10, 2_000).is_err());
    }

    #[test]
    fn test_zero_vote_rows_rejected_by_schema() {
        let conn = test_db();
        assert!(upsert(&conn, "t1", "a1", "pk", 0, 0, 2_000).is_err());
    }

    #[test]
    fn test_sum_for_argument() {
        let conn = test_db();
        upsert(&conn, "t1", "a1", "alice", 3, 9, 2_000).expect("insert");
        upsert(&conn, "t1", "a1", "bob", 5, 25, 2_001).expect("insert");
        assert_eq!(sum_for_argument(&conn, "a1").expect("sum"), (8, 34));
    }
}
