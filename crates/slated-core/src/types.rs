use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a scheduled action does to its card when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Post a text comment.
    Comment,
    /// Set the card's completion flag.
    Status,
    /// Comment first, then the flag, in one attempt.
    Both,
}

impl ActionKind {
    /// Derive the kind from which payload parts are present.
    /// Returns `None` when the action would be a no-op.
    pub fn from_parts(has_comment: bool, has_status: bool) -> Option<Self> {
        match (has_comment, has_status) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Comment),
            (false, true) => Some(Self::Status),
            (false, false) => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Comment => "comment",
            ActionKind::Status => "status",
            ActionKind::Both => "both",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "comment" => Ok(ActionKind::Comment),
            "status" => Ok(ActionKind::Status),
            "both" => Ok(ActionKind::Both),
            other => Err(format!("unknown action kind: {other}")),
        }
    }
}

/// A persisted deferred action.
///
/// Stored as JSON under its own key. Never updated in place — deleted on
/// success or cancel, left untouched on failure so the next sweep retries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAction {
    /// `act_<scheduled_at_ms>_<suffix>` — also the store key.
    pub key: String,
    /// Card the action targets.
    pub target_id: String,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_complete: Option<bool>,
    /// When the action becomes due.
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Caller-supplied board token. Opaque: forwarded to the board API,
    /// never validated here.
    pub credential: String,
}
