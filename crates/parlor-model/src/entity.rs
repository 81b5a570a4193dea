//! The persisted records of a game night.
//!
//! These are plain data structs. All rules about who may change them and
//! when live in the engine; all knowledge of where they live belongs to
//! the storage backend. Relations are expressed as ids, never as nested
//! structs, so a record can be loaded and saved independently:
//!
//! - a [`Player`] points at its session and team (both optional),
//! - a [`Team`] points at its session,
//! - a [`Score`] points at exactly one [`Subject`] plus a session and
//!   a game,
//! - a [`Session`] keeps an ordered playlist of game ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{GameId, PlayerId, ScoreId, SessionId, TeamId};
use crate::status::SessionStatus;

// ---------------------------------------------------------------------------
// PlayerRole
// ---------------------------------------------------------------------------

/// Whether a player runs sessions or plays in them.
///
/// Hosts create and drive sessions. Participants join a roster, get
/// placed on teams, and earn points. The role is fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Host,
    Participant,
}

impl PlayerRole {
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host)
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Participant => write!(f, "participant"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One game night: a host, a playlist of games, and a lifecycle.
///
/// The roster and the teams are not stored on the session itself. They
/// are derived by querying players and teams that point back at this
/// session's id, the same way a relational backend would resolve the
/// foreign keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Display name chosen by the host ("Friday trivia night").
    pub name: String,

    /// The player who created the session and may mutate it.
    pub host_id: PlayerId,

    /// Where the session is in its lifecycle.
    pub status: SessionStatus,

    /// Cleared when the session ends. While `true`, the join code (if
    /// any) must be unique among all active sessions.
    pub is_active: bool,

    /// Short invite code players redeem to join. `None` only if issuing
    /// was skipped by the storage layer; sessions created through the
    /// engine always carry one.
    pub join_code: Option<String>,

    /// Ordered playlist. Play order and aggregate ordering both follow
    /// this list.
    pub game_ids: Vec<GameId>,

    /// The game being played right now. Set exactly while the status is
    /// `InProgress`, `None` otherwise.
    pub current_game_id: Option<GameId>,

    /// When the host started the night.
    pub started_at: Option<DateTime<Utc>>,

    /// When the host ended the night.
    pub ended_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` while players may still be attached.
    pub fn is_joinable(&self) -> bool {
        self.is_active && self.status.is_joinable()
    }

    /// Returns `true` if `game_id` is on the playlist.
    pub fn has_game(&self, game_id: GameId) -> bool {
        self.game_ids.contains(&game_id)
    }

    /// The playlist entry after `game_id`, or `None` when `game_id` is
    /// last or not on the playlist at all.
    pub fn game_after(&self, game_id: GameId) -> Option<GameId> {
        let idx = self.game_ids.iter().position(|g| *g == game_id)?;
        self.game_ids.get(idx + 1).copied()
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// A playable activity in the catalog.
///
/// Games exist independently of sessions; a session references them by
/// id in its playlist and many sessions can share one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,

    /// Display name ("Movie trivia").
    pub name: String,

    /// Free-form category tag ("trivia", "card", "party").
    pub kind: String,

    /// Optional rules text shown to players.
    pub rules: Option<String>,

    /// Optional round count for games played in fixed rounds.
    pub rounds: Option<u32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A person at the table, host or participant.
///
/// A participant belongs to at most one session and at most one team at
/// a time. Both references are cleared or rewritten as the player moves;
/// there is no membership table to keep in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    /// Display name shown on rosters and leaderboards.
    pub name: String,

    pub role: PlayerRole,

    /// The session this player is currently part of. Hosts keep `None`
    /// here; they drive sessions rather than sit on rosters.
    pub session_id: Option<SessionId>,

    /// The team this player is currently on, if any. Always a team of
    /// the same session.
    pub team_id: Option<TeamId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A named group of players inside one session.
///
/// Teams never outlive their session and never span sessions. Members
/// are the players whose `team_id` points here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub session_id: SessionId,
}

// ---------------------------------------------------------------------------
// Subject — who earned the points
// ---------------------------------------------------------------------------

/// The party a score entry credits: one player or one team, never both
/// and never neither. Encoding the exclusive choice as an enum makes the
/// invalid states unrepresentable.
///
/// Serialized with an explicit kind so clients can tell a player id from
/// a team id: `{"kind":"player","id":3}` or `{"kind":"team","id":2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Subject {
    Player(PlayerId),
    Team(TeamId),
}

impl Subject {
    pub fn is_player(&self) -> bool {
        matches!(self, Self::Player(_))
    }

    pub fn is_team(&self) -> bool {
        matches!(self, Self::Team(_))
    }

    /// Deterministic ordering key for leaderboard ties: players sort
    /// before teams, then by numeric id.
    pub fn sort_key(&self) -> (u8, u64) {
        match self {
            Self::Player(PlayerId(id)) => (0, *id),
            Self::Team(TeamId(id)) => (1, *id),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::Team(id) => write!(f, "{id}"),
        }
    }
}

impl From<PlayerId> for Subject {
    fn from(id: PlayerId) -> Self {
        Self::Player(id)
    }
}

impl From<TeamId> for Subject {
    fn from(id: TeamId) -> Self {
        Self::Team(id)
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// One append-only ledger entry: `subject` earned `points` in `game_id`
/// during `session_id`.
///
/// Entries are never edited. Corrections are new entries (negative
/// points are allowed), and totals are always computed by summing the
/// ledger, so the history of a night stays auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub id: ScoreId,
    pub subject: Subject,
    pub session_id: SessionId,
    pub game_id: GameId,
    pub points: i64,
    pub awarded_at: DateTime<Utc>,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session_fixture() -> Session {
        let now = Utc::now();
        Session {
            id: SessionId(1),
            name: "test night".into(),
            host_id: PlayerId(1),
            status: SessionStatus::Pending,
            is_active: true,
            join_code: Some("ABC234".into()),
            game_ids: vec![GameId(10), GameId(20), GameId(30)],
            current_game_id: None,
            started_at: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_game_after_returns_next_playlist_entry() {
        let session = session_fixture();
        assert_eq!(session.game_after(GameId(10)), Some(GameId(20)));
        assert_eq!(session.game_after(GameId(20)), Some(GameId(30)));
    }

    #[test]
    fn test_game_after_returns_none_for_last_game() {
        let session = session_fixture();
        assert_eq!(session.game_after(GameId(30)), None);
    }

    #[test]
    fn test_game_after_returns_none_for_unlisted_game() {
        let session = session_fixture();
        assert_eq!(session.game_after(GameId(99)), None);
    }

    #[test]
    fn test_session_is_joinable_while_pending_and_in_progress() {
        let mut session = session_fixture();
        assert!(session.is_joinable());

        session.status = SessionStatus::InProgress;
        assert!(session.is_joinable());

        session.status = SessionStatus::Completed;
        session.is_active = false;
        assert!(!session.is_joinable());
    }

    #[test]
    fn test_player_role_serializes_as_snake_case() {
        let json = serde_json::to_string(&PlayerRole::Participant).unwrap();
        assert_eq!(json, "\"participant\"");

        let back: PlayerRole = serde_json::from_str("\"host\"").unwrap();
        assert_eq!(back, PlayerRole::Host);
    }

    #[test]
    fn test_subject_json_carries_kind_and_id() {
        // Adjacent tagging: {"kind":"player","id":3}. A bare number
        // would make player and team ids indistinguishable to clients.
        let json: serde_json::Value =
            serde_json::to_value(Subject::Player(PlayerId(3))).unwrap();
        assert_eq!(json["kind"], "player");
        assert_eq!(json["id"], 3);

        let json: serde_json::Value =
            serde_json::to_value(Subject::Team(TeamId(2))).unwrap();
        assert_eq!(json["kind"], "team");
        assert_eq!(json["id"], 2);
    }

    #[test]
    fn test_subject_round_trip() {
        for subject in [Subject::Player(PlayerId(7)), Subject::Team(TeamId(4))] {
            let bytes = serde_json::to_vec(&subject).unwrap();
            let decoded: Subject = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(subject, decoded);
        }
    }

    #[test]
    fn test_subject_sort_key_puts_players_before_teams() {
        let player = Subject::Player(PlayerId(50));
        let team = Subject::Team(TeamId(1));
        // Even a high player id sorts ahead of the lowest team id.
        assert!(player.sort_key() < team.sort_key());
        assert!(
            Subject::Player(PlayerId(1)).sort_key()
                < Subject::Player(PlayerId(2)).sort_key()
        );
    }

    #[test]
    fn test_session_round_trip() {
        let session = session_fixture();
        let bytes = serde_json::to_vec(&session).unwrap();
        let decoded: Session = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(session, decoded);
    }
}
