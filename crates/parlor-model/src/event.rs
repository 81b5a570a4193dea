//! Events published while a session runs.
//!
//! The engine tells subscribers about changes by publishing one of these
//! events to a [`Topic`]. Delivery is somebody else's problem: a
//! WebSocket gateway, an in-process broadcast channel, or a test
//! recorder can all sit behind the same sink. The engine never waits
//! for, retries, or even learns about delivery.
//!
//! Wire form is internally tagged JSON with a camelCase tag, so a
//! started session serializes as:
//!
//! ```text
//! { "type": "sessionStarted", "session_id": 7, "current_game_id": 2 }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{GameId, PlayerId, SessionId, TeamId};
use crate::Subject;

// ---------------------------------------------------------------------------
// Topic — where an event is published
// ---------------------------------------------------------------------------

/// A named channel subscribers listen on.
///
/// Every session has one topic for lifecycle and scoring news; every
/// team has its own for membership news. The `Display` form is the
/// routing key an adapter should use for its rooms or channels:
/// `"session:7"`, `"team:3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Session(SessionId),
    Team(TeamId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(SessionId(id)) => write!(f, "session:{id}"),
            Self::Team(TeamId(id)) => write!(f, "team:{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

/// A team and its members, as carried inside a `teamUpdated` event.
///
/// Events carry the names alongside the ids so a subscriber can render
/// the update without a follow-up lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub team_id: TeamId,
    pub name: String,
    pub player_ids: Vec<PlayerId>,
}

/// News published on a session topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The host started the night; the first game is now current.
    SessionStarted {
        session_id: SessionId,
        current_game_id: GameId,
    },

    /// The host advanced the playlist to a new current game.
    GameChanged {
        session_id: SessionId,
        current_game_id: GameId,
    },

    /// The host ended the night. No further events follow on this topic.
    SessionEnded { session_id: SessionId },

    /// A player redeemed the join code and is now on the roster.
    PlayerJoined {
        session_id: SessionId,
        player_id: PlayerId,
        player_name: String,
    },

    /// Team formation replaced the session's teams wholesale.
    TeamUpdated {
        session_id: SessionId,
        teams: Vec<TeamRoster>,
    },

    /// Points were appended to the ledger.
    ScoreUpdated {
        session_id: SessionId,
        subject: Subject,
        game_id: GameId,
        points: i64,
    },
}

/// News published on a team topic.
///
/// The tag names deliberately mirror the session-level `playerJoined`;
/// subscribers tell them apart by the topic they arrived on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TeamEvent {
    /// The host placed a player on this team.
    PlayerJoined {
        team_id: TeamId,
        player_id: PlayerId,
        player_name: String,
    },

    /// The host took a player off this team.
    PlayerLeft {
        team_id: TeamId,
        player_id: PlayerId,
        player_name: String,
    },
}

// ---------------------------------------------------------------------------
// Notification — the union a sink accepts
// ---------------------------------------------------------------------------

/// Any publishable event.
///
/// `#[serde(untagged)]` keeps the wire form identical to the inner
/// event, so sinks serialize a `Notification` directly and clients see
/// the flat `{"type": ...}` object regardless of which enum produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Notification {
    Session(SessionEvent),
    Team(TeamEvent),
}

impl From<SessionEvent> for Notification {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}

impl From<TeamEvent> for Notification {
    fn from(event: TeamEvent) -> Self {
        Self::Team(event)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The tag spellings here are load-bearing: subscribers dispatch on
    //! the `type` field, so a renamed variant is a wire break even when
    //! every Rust test still compiles.

    use super::*;
    use crate::PlayerId;

    #[test]
    fn test_topic_display_is_the_routing_key() {
        assert_eq!(Topic::Session(SessionId(7)).to_string(), "session:7");
        assert_eq!(Topic::Team(TeamId(3)).to_string(), "team:3");
    }

    #[test]
    fn test_session_started_json_format() {
        let event = SessionEvent::SessionStarted {
            session_id: SessionId(7),
            current_game_id: GameId(2),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "sessionStarted");
        assert_eq!(json["session_id"], 7);
        assert_eq!(json["current_game_id"], 2);
    }

    #[test]
    fn test_game_changed_json_format() {
        let event = SessionEvent::GameChanged {
            session_id: SessionId(7),
            current_game_id: GameId(5),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "gameChanged");
        assert_eq!(json["current_game_id"], 5);
    }

    #[test]
    fn test_session_ended_json_format() {
        let event = SessionEvent::SessionEnded {
            session_id: SessionId(7),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "sessionEnded");
    }

    #[test]
    fn test_player_joined_json_format() {
        let event = SessionEvent::PlayerJoined {
            session_id: SessionId(7),
            player_id: PlayerId(41),
            player_name: "Ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "playerJoined");
        assert_eq!(json["player_id"], 41);
        assert_eq!(json["player_name"], "Ada");
    }

    #[test]
    fn test_team_updated_json_format() {
        let event = SessionEvent::TeamUpdated {
            session_id: SessionId(7),
            teams: vec![TeamRoster {
                team_id: TeamId(1),
                name: "Team 1".into(),
                player_ids: vec![PlayerId(41), PlayerId(42)],
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "teamUpdated");
        assert_eq!(json["teams"][0]["name"], "Team 1");
        assert_eq!(json["teams"][0]["player_ids"][1], 42);
    }

    #[test]
    fn test_score_updated_json_format() {
        let event = SessionEvent::ScoreUpdated {
            session_id: SessionId(7),
            subject: Subject::Team(TeamId(2)),
            game_id: GameId(9),
            points: 15,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "scoreUpdated");
        assert_eq!(json["subject"]["kind"], "team");
        assert_eq!(json["subject"]["id"], 2);
        assert_eq!(json["points"], 15);
    }

    #[test]
    fn test_team_event_tags_mirror_session_spelling() {
        let joined = TeamEvent::PlayerJoined {
            team_id: TeamId(3),
            player_id: PlayerId(41),
            player_name: "Ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&joined).unwrap();
        assert_eq!(json["type"], "playerJoined");
        assert_eq!(json["team_id"], 3);

        let left = TeamEvent::PlayerLeft {
            team_id: TeamId(3),
            player_id: PlayerId(41),
            player_name: "Ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&left).unwrap();
        assert_eq!(json["type"], "playerLeft");
    }

    #[test]
    fn test_notification_serializes_flat() {
        // Untagged: the wrapper adds nothing to the JSON.
        let notification = Notification::from(SessionEvent::SessionEnded {
            session_id: SessionId(7),
        });
        let json: serde_json::Value =
            serde_json::to_value(&notification).unwrap();

        assert_eq!(json["type"], "sessionEnded");
        assert_eq!(json["session_id"], 7);
    }

    #[test]
    fn test_notification_round_trip_resolves_by_shape() {
        // Session and team variants share the "playerJoined" tag; the
        // field set decides which one parses.
        let team_join = Notification::from(TeamEvent::PlayerJoined {
            team_id: TeamId(3),
            player_id: PlayerId(41),
            player_name: "Ada".into(),
        });
        let bytes = serde_json::to_vec(&team_join).unwrap();
        let decoded: Notification = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(team_join, decoded);

        let session_join = Notification::from(SessionEvent::PlayerJoined {
            session_id: SessionId(7),
            player_id: PlayerId(41),
            player_name: "Ada".into(),
        });
        let bytes = serde_json::to_vec(&session_join).unwrap();
        let decoded: Notification = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(session_join, decoded);
    }
}
