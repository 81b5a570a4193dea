//! Read-side shapes: lookups, leaderboards, and aggregates.
//!
//! Nothing here is stored. Each struct is assembled on demand from the
//! persisted records and handed to callers (or serialized outward).

use serde::{Deserialize, Serialize};

use crate::entity::{Game, Player, Session, Subject, Team};
use crate::id::{GameId, PlayerId, SessionId};
use crate::status::SessionStatus;

// ---------------------------------------------------------------------------
// Lookup shapes
// ---------------------------------------------------------------------------

/// What a prospective player learns from a join code before joining:
/// enough to show a lobby screen, nothing host-private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub name: String,
    pub host_id: PlayerId,
    pub status: SessionStatus,
    pub join_code: Option<String>,
    pub player_count: usize,
}

/// A team with its members resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<Player>,
}

/// A session with every relation resolved: the full picture the host
/// sees. Games follow playlist order; players and teams follow creation
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session: Session,
    pub games: Vec<Game>,
    pub players: Vec<Player>,
    pub teams: Vec<TeamDetail>,
}

// ---------------------------------------------------------------------------
// Scoring shapes
// ---------------------------------------------------------------------------

/// One line of a single game's leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub subject: Subject,

    /// Display name of the player or team at the time of the query.
    pub name: String,

    pub total_points: i64,
}

/// Points one subject earned in one game, inside a session aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePoints {
    pub game_id: GameId,
    pub game_name: String,
    pub points: i64,
}

/// One subject's full scoring picture for a session: the overall total
/// plus a per-game breakdown. Games the subject never scored in (or that
/// net out to zero) are left off the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectBreakdown {
    pub subject: Subject,
    pub name: String,
    pub total_points: i64,
    pub per_game: Vec<GamePoints>,
}

/// The whole session's scores, split into player standings and team
/// standings. Both lists are ordered by total (descending), with ties
/// broken deterministically by subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAggregate {
    pub session_id: SessionId,
    pub players: Vec<SubjectBreakdown>,
    pub teams: Vec<SubjectBreakdown>,
}
