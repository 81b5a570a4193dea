//! Storage abstraction layer for Parlor.
//!
//! Provides the [`Store`] trait that abstracts over persistence backends
//! (in-memory, SQL), plus the insert payload types backends accept.
//!
//! # Contract
//!
//! Beyond the per-method docs, every backend must uphold four rules the
//! engine leans on:
//!
//! 1. **Join-code uniqueness**: at most one *active* session per join
//!    code, enforced at write time ([`StoreError::DuplicateJoinCode`]).
//!    Codes of ended sessions are free for reuse immediately.
//! 2. **Cascading removal**: removing a session removes its teams, its
//!    roster players, and its scores. Removing a player or team removes
//!    the scores credited to it. No dangling references survive.
//! 3. **Per-session locks**: [`Store::session_lock`] returns the same
//!    mutex for the same session id for the lifetime of the store, so
//!    two tasks mutating one session always contend on one lock.
//! 4. **Deterministic ordering**: listing methods return rows sorted by
//!    id (creation order); score listings keep ledger (insertion) order.
//!
//! Backends refresh `updated_at` on every update; the engine never sets
//! it.
//!
//! # Feature Flags
//!
//! - `memory` (default) — [`MemoryStore`], a HashMap-backed backend for
//!   tests, demos, and single-process deployments

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::MemoryStore;

use std::sync::Arc;

use tokio::sync::Mutex;

use parlor_model::{
    Game, GameId, Player, PlayerId, PlayerRole, Score, Session, SessionId,
    Subject, Team, TeamId,
};

// ---------------------------------------------------------------------------
// Insert payloads
// ---------------------------------------------------------------------------

/// What a caller supplies to create a session. The backend assigns the
/// id and timestamps and sets the lifecycle fields to their birth
/// values (`Pending`, active, no current game).
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub name: String,
    pub host_id: PlayerId,
    /// Issued before insertion so the backend can enforce uniqueness
    /// atomically with the write.
    pub join_code: Option<String>,
    /// Initial playlist, possibly empty.
    pub game_ids: Vec<GameId>,
}

/// What a caller supplies to create a game.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGame {
    pub name: String,
    pub kind: String,
    pub rules: Option<String>,
    pub rounds: Option<u32>,
}

/// What a caller supplies to create a player.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayer {
    pub name: String,
    pub role: PlayerRole,
    pub session_id: Option<SessionId>,
}

impl NewPlayer {
    /// A host: drives sessions, never sits on a roster.
    pub fn host(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: PlayerRole::Host,
            session_id: None,
        }
    }

    /// A participant attached to a session's roster from birth.
    pub fn participant(name: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            name: name.into(),
            role: PlayerRole::Participant,
            session_id: Some(session_id),
        }
    }
}

/// What a caller supplies to create a team.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub name: String,
    pub session_id: SessionId,
}

/// What a caller supplies to append one score ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub subject: Subject,
    pub session_id: SessionId,
    pub game_id: GameId,
    pub points: i64,
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// A persistence backend for game nights.
///
/// Lookup methods return `Ok(None)` for unknown ids; translating that
/// into a domain error is the engine's job. Mutating methods return
/// [`StoreError`] only for storage-level problems (missing row on
/// update, join-code conflict, backend failure).
pub trait Store: Send + Sync + 'static {
    // -- Sessions --

    /// Creates a session in its birth state: `Pending`, active, no
    /// current game, timestamps set to now.
    ///
    /// # Errors
    /// [`StoreError::DuplicateJoinCode`] if the payload carries a code
    /// already held by an active session.
    async fn insert_session(&self, new: NewSession) -> Result<Session, StoreError>;

    /// Looks up a session by id.
    async fn session(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Looks up an *active* session by join code. Ended sessions never
    /// match, even if their code was never reused.
    async fn session_by_code(&self, code: &str) -> Result<Option<Session>, StoreError>;

    /// All sessions created by `host_id`, sorted by id.
    async fn sessions_by_host(&self, host_id: PlayerId) -> Result<Vec<Session>, StoreError>;

    /// Replaces the stored row and returns it with `updated_at`
    /// refreshed. Index maintenance (join-code activity) happens here:
    /// deactivating a session frees its code.
    ///
    /// # Errors
    /// - [`StoreError::MissingSession`] if the row no longer exists
    /// - [`StoreError::DuplicateJoinCode`] if the update would claim a
    ///   code held by another active session
    async fn update_session(&self, session: &Session) -> Result<Session, StoreError>;

    /// Removes a session and cascades: its teams, its roster players,
    /// and its scores go with it, and its join code is freed.
    async fn remove_session(&self, id: SessionId) -> Result<(), StoreError>;

    /// The mutex serializing mutations of one session. Stable per id:
    /// every caller asking about the same session gets the same lock.
    async fn session_lock(&self, id: SessionId) -> Arc<Mutex<()>>;

    // -- Games --

    async fn insert_game(&self, new: NewGame) -> Result<Game, StoreError>;

    async fn game(&self, id: GameId) -> Result<Option<Game>, StoreError>;

    /// Resolves ids to games, preserving input order and silently
    /// skipping unknown ids. Callers that need all-or-nothing semantics
    /// compare lengths.
    async fn games_by_ids(&self, ids: &[GameId]) -> Result<Vec<Game>, StoreError>;

    /// The whole catalog, sorted by id.
    async fn all_games(&self) -> Result<Vec<Game>, StoreError>;

    // -- Players --

    async fn insert_player(&self, new: NewPlayer) -> Result<Player, StoreError>;

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError>;

    /// Replaces the stored row and returns it with `updated_at`
    /// refreshed.
    ///
    /// # Errors
    /// [`StoreError::MissingPlayer`] if the row no longer exists.
    async fn update_player(&self, player: &Player) -> Result<Player, StoreError>;

    /// Removes a player and the scores credited to them.
    async fn remove_player(&self, id: PlayerId) -> Result<(), StoreError>;

    /// The roster of a session, sorted by id. Hosts are not rostered,
    /// so they never appear here.
    async fn players_in_session(&self, id: SessionId) -> Result<Vec<Player>, StoreError>;

    // -- Teams --

    async fn insert_team(&self, new: NewTeam) -> Result<Team, StoreError>;

    async fn team(&self, id: TeamId) -> Result<Option<Team>, StoreError>;

    /// Removes a team, clears `team_id` on its members, and removes the
    /// scores credited to the team.
    async fn remove_team(&self, id: TeamId) -> Result<(), StoreError>;

    /// A session's teams, sorted by id.
    async fn teams_in_session(&self, id: SessionId) -> Result<Vec<Team>, StoreError>;

    // -- Scores --

    /// Appends one ledger entry. Entries are never updated in place.
    async fn insert_score(&self, new: NewScore) -> Result<Score, StoreError>;

    /// Every ledger entry of a session, in insertion order.
    async fn scores_in_session(&self, id: SessionId) -> Result<Vec<Score>, StoreError>;

    /// The ledger entries of one game within a session, in insertion
    /// order.
    async fn scores_for_game(
        &self,
        session_id: SessionId,
        game_id: GameId,
    ) -> Result<Vec<Score>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_model::SessionId;

    #[test]
    fn test_new_player_host_has_no_session() {
        let new = NewPlayer::host("Quinn");
        assert_eq!(new.role, PlayerRole::Host);
        assert_eq!(new.session_id, None);
        assert_eq!(new.name, "Quinn");
    }

    #[test]
    fn test_new_player_participant_is_attached() {
        let new = NewPlayer::participant("Ada", SessionId(3));
        assert_eq!(new.role, PlayerRole::Participant);
        assert_eq!(new.session_id, Some(SessionId(3)));
    }
}
