//! Topic query functions.

use agora_types::TopicStatus;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Insert a new topic in `active` status.
pub fn insert_topic(
    conn: &Connection,
    topic_id: &str,
    title: &str,
    created_at: i64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO topics (topic_id, title, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![topic_id, title, created_at],
    )?;
    Ok(())
}

/// Get a topic's lifecycle status.
pub fn get_status(conn: &Connection, topic_id: &str) -> Result<TopicStatus> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM topics WHERE topic_id = ?1",
            [topic_id],
            |row| row.get(0),
        )
        .optional()?;
    let status = status.ok_or_else(|| DbError::NotFound(format!("topic {topic_id}")))?;
    TopicStatus::parse(&status)
        .ok_or_else(|| DbError::Constraint(format!("unknown topic status {status:?}")))
}

/// Change a topic's lifecycle status.
pub fn set_status(conn: &Connection, topic_id: &str, status: TopicStatus) -> Result<()> {
    let updated = conn.execute(
        "UPDATE topics SET status = ?1 WHERE topic_id = ?2",
        rusqlite::params![status.as_str(), topic_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!("topic {topic_id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_insert_and_status() {
        let conn = test_db();
        insert_topic(&conn, "t1", "Energy policy", 1_000).expect("insert");
        assert_eq!(get_status(&conn, "t1").expect("status"), TopicStatus::Active);
    }

    #[test]
    fn test_set_status() {
        let conn = test_db();
        insert_topic(&conn, "t1", "Energy policy", 1_000).expect("insert");
        set_status(&conn, "t1", TopicStatus::Frozen).expect("freeze");
        assert_eq!(get_status(&conn, "t1").expect("status"), TopicStatus::Frozen);
    }

    #[test]
    fn test_missing_topic() {
        let conn = test_db();
        assert!(matches!(
            get_status(&conn, "nope"),
            Err(DbError::NotFound(_))
        ));
        assert!(set_status(&conn, "nope", TopicStatus::Archived).is_err());
    }
}
