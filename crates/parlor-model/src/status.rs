//! The session lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The lifecycle state of a session.
///
/// Transitions are strictly forward, no skipping and no going back:
///
/// ```text
/// Pending → InProgress → Completed
/// ```
///
/// - **Pending**: the session exists and is gathering players, games,
///   and teams. Nothing has been played yet.
/// - **InProgress**: the host has started the night. A current game is
///   always set while in this state.
/// - **Completed**: the host has ended the night. The session keeps its
///   scores for reading but rejects every mutation.
///
/// Serialized form is snake_case (`"pending"`, `"in_progress"`,
/// `"completed"`) to match what stored rows and clients use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
}

impl SessionStatus {
    /// Returns `true` once the session has been ended.
    ///
    /// Terminal sessions stay readable (leaderboards, aggregates) but
    /// reject joins, team changes, and every lifecycle transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` while the session accepts new players.
    ///
    /// Joining is allowed both before and during play; only a completed
    /// session turns players away.
    pub fn is_joinable(&self) -> bool {
        !self.is_terminal()
    }

    /// The next state in the strict forward order, or `None` from the
    /// terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::InProgress),
            Self::InProgress => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_next_follows_strict_order() {
        assert_eq!(
            SessionStatus::Pending.next(),
            Some(SessionStatus::InProgress)
        );
        assert_eq!(
            SessionStatus::InProgress.next(),
            Some(SessionStatus::Completed)
        );
        assert_eq!(SessionStatus::Completed.next(), None);
    }

    #[test]
    fn test_status_can_transition_to_rejects_skips() {
        assert!(SessionStatus::Pending.can_transition_to(SessionStatus::InProgress));
        assert!(!SessionStatus::Pending.can_transition_to(SessionStatus::Completed));
        assert!(!SessionStatus::Completed.can_transition_to(SessionStatus::Pending));
        assert!(!SessionStatus::InProgress.can_transition_to(SessionStatus::Pending));
    }

    #[test]
    fn test_status_is_joinable_until_completed() {
        assert!(SessionStatus::Pending.is_joinable());
        assert!(SessionStatus::InProgress.is_joinable());
        assert!(!SessionStatus::Completed.is_joinable());
    }

    #[test]
    fn test_status_is_terminal_only_when_completed() {
        assert!(!SessionStatus::Pending.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_serializes_as_snake_case() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let back: SessionStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, SessionStatus::Pending);
    }

    #[test]
    fn test_status_display_matches_wire_form() {
        assert_eq!(SessionStatus::Pending.to_string(), "pending");
        assert_eq!(SessionStatus::InProgress.to_string(), "in_progress");
        assert_eq!(SessionStatus::Completed.to_string(), "completed");
    }
}
