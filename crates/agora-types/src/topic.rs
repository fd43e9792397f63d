//! Topic lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a topic.
///
/// Only `Active` topics accept vote increases; frozen and archived topics are
/// decrease-only so participants can always withdraw staked credits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStatus {
    Active,
    Frozen,
    Archived,
}

impl TopicStatus {
    /// Stable string form used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Active => "active",
            TopicStatus::Frozen => "frozen",
            TopicStatus::Archived => "archived",
        }
    }

    /// Parse the stable string form. Unknown statuses map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TopicStatus::Active),
            "frozen" => Some(TopicStatus::Frozen),
            "archived" => Some(TopicStatus::Archived),
            _ => None,
        }
    }

    /// Whether vote increases are permitted in this status.
    pub fn allows_increase(&self) -> bool {
        matches!(self, TopicStatus::Active)
    }
}
