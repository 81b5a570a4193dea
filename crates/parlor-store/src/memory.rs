//! In-memory storage backend.
//!
//! `MemoryStore` keeps every record in `HashMap`s behind one async
//! mutex, with an extra index from active join codes to session ids so
//! code lookups and uniqueness checks never scan the session table.
//! The map and the index are always updated together.
//!
//! # Concurrency note
//!
//! The inner mutex serializes individual reads and writes; it is held
//! only for the duration of one method call and never across an await
//! on foreign code. Multi-step invariants (read, decide, write back)
//! are the engine's job, which is what [`Store::session_lock`] exists
//! for. Keeping the two lock layers separate means a slow lifecycle
//! operation on one session never blocks reads of another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use parlor_model::{
    Game, GameId, Player, PlayerId, Score, ScoreId, Session, SessionId,
    SessionStatus, Subject, Team, TeamId,
};

use crate::{
    NewGame, NewPlayer, NewScore, NewSession, NewTeam, Store, StoreError,
};

/// All record tables plus the join-code index, guarded as one unit so
/// cascades are atomic.
#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, Session>,
    games: HashMap<GameId, Game>,
    players: HashMap<PlayerId, Player>,
    teams: HashMap<TeamId, Team>,
    /// Append-only ledger. Kept as a Vec so insertion order is the
    /// iteration order.
    scores: Vec<Score>,
    /// Join code → session id, for *active* sessions only. Kept in sync
    /// with `sessions` on every insert, update, and removal.
    active_codes: HashMap<String, SessionId>,
}

/// A HashMap-backed [`Store`] for tests, demos, and single-process
/// deployments.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// One mutex per session, handed to the engine for read-modify-write
    /// sequences. Entries are created on demand and removed with the
    /// session.
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
    next_session_id: AtomicU64,
    next_game_id: AtomicU64,
    next_player_id: AtomicU64,
    next_team_id: AtomicU64,
    next_score_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store. Ids start at 1 in every table.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            locks: Mutex::new(HashMap::new()),
            next_session_id: AtomicU64::new(1),
            next_game_id: AtomicU64::new(1),
            next_player_id: AtomicU64::new(1),
            next_team_id: AtomicU64::new(1),
            next_score_id: AtomicU64::new(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    // -- Sessions --

    async fn insert_session(&self, new: NewSession) -> Result<Session, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(code) = &new.join_code {
            if inner.active_codes.contains_key(code) {
                return Err(StoreError::DuplicateJoinCode(code.clone()));
            }
        }

        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let session = Session {
            id,
            name: new.name,
            host_id: new.host_id,
            status: SessionStatus::Pending,
            is_active: true,
            join_code: new.join_code,
            game_ids: new.game_ids,
            current_game_id: None,
            started_at: None,
            ended_at: None,
            created_at: now,
            updated_at: now,
        };

        if let Some(code) = &session.join_code {
            inner.active_codes.insert(code.clone(), id);
        }
        inner.sessions.insert(id, session.clone());

        tracing::debug!(session_id = %id, "session row inserted");
        Ok(session)
    }

    async fn session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn session_by_code(&self, code: &str) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().await;
        let id = match inner.active_codes.get(code) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn sessions_by_host(&self, host_id: PlayerId) -> Result<Vec<Session>, StoreError> {
        let inner = self.inner.lock().await;
        let mut sessions: Vec<Session> = inner
            .sessions
            .values()
            .filter(|session| session.host_id == host_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|session| session.id);
        Ok(sessions)
    }

    async fn update_session(&self, session: &Session) -> Result<Session, StoreError> {
        let mut inner = self.inner.lock().await;

        let old_code = match inner.sessions.get(&session.id) {
            Some(stored) => stored.join_code.clone(),
            None => return Err(StoreError::MissingSession(session.id)),
        };

        // Reject before touching the index so a failed update leaves
        // the old mapping intact.
        if session.is_active {
            if let Some(code) = &session.join_code {
                let held_by_other = inner
                    .active_codes
                    .get(code)
                    .is_some_and(|owner| *owner != session.id);
                if held_by_other {
                    return Err(StoreError::DuplicateJoinCode(code.clone()));
                }
            }
        }

        if let Some(code) = &old_code {
            if inner.active_codes.get(code) == Some(&session.id) {
                inner.active_codes.remove(code);
            }
        }

        let mut row = session.clone();
        row.updated_at = Utc::now();
        if row.is_active {
            if let Some(code) = &row.join_code {
                inner.active_codes.insert(code.clone(), row.id);
            }
        }
        inner.sessions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn remove_session(&self, id: SessionId) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let session = inner
            .sessions
            .remove(&id)
            .ok_or(StoreError::MissingSession(id))?;

        if let Some(code) = &session.join_code {
            if inner.active_codes.get(code) == Some(&id) {
                inner.active_codes.remove(code);
            }
        }

        // Cascade in dependency order: teams, roster, ledger.
        inner.teams.retain(|_, team| team.session_id != id);
        inner.players.retain(|_, player| player.session_id != Some(id));
        inner.scores.retain(|score| score.session_id != id);
        drop(guard);

        self.locks.lock().await.remove(&id);

        tracing::debug!(session_id = %id, "session row removed with cascade");
        Ok(())
    }

    async fn session_lock(&self, id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // -- Games --

    async fn insert_game(&self, new: NewGame) -> Result<Game, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = GameId(self.next_game_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let game = Game {
            id,
            name: new.name,
            kind: new.kind,
            rules: new.rules,
            rounds: new.rounds,
            created_at: now,
            updated_at: now,
        };
        inner.games.insert(id, game.clone());
        Ok(game)
    }

    async fn game(&self, id: GameId) -> Result<Option<Game>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.games.get(&id).cloned())
    }

    async fn games_by_ids(&self, ids: &[GameId]) -> Result<Vec<Game>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.games.get(id).cloned())
            .collect())
    }

    async fn all_games(&self) -> Result<Vec<Game>, StoreError> {
        let inner = self.inner.lock().await;
        let mut games: Vec<Game> = inner.games.values().cloned().collect();
        games.sort_by_key(|game| game.id);
        Ok(games)
    }

    // -- Players --

    async fn insert_player(&self, new: NewPlayer) -> Result<Player, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = PlayerId(self.next_player_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let player = Player {
            id,
            name: new.name,
            role: new.role,
            session_id: new.session_id,
            team_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.players.insert(id, player.clone());
        tracing::debug!(player_id = %id, role = %player.role, "player row inserted");
        Ok(player)
    }

    async fn player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.players.get(&id).cloned())
    }

    async fn update_player(&self, player: &Player) -> Result<Player, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.players.contains_key(&player.id) {
            return Err(StoreError::MissingPlayer(player.id));
        }
        let mut row = player.clone();
        row.updated_at = Utc::now();
        inner.players.insert(row.id, row.clone());
        Ok(row)
    }

    async fn remove_player(&self, id: PlayerId) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner
            .players
            .remove(&id)
            .ok_or(StoreError::MissingPlayer(id))?;
        inner.scores.retain(|score| score.subject != Subject::Player(id));
        Ok(())
    }

    async fn players_in_session(&self, id: SessionId) -> Result<Vec<Player>, StoreError> {
        let inner = self.inner.lock().await;
        let mut players: Vec<Player> = inner
            .players
            .values()
            .filter(|player| player.session_id == Some(id))
            .cloned()
            .collect();
        players.sort_by_key(|player| player.id);
        Ok(players)
    }

    // -- Teams --

    async fn insert_team(&self, new: NewTeam) -> Result<Team, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = TeamId(self.next_team_id.fetch_add(1, Ordering::Relaxed));
        let team = Team {
            id,
            name: new.name,
            session_id: new.session_id,
        };
        inner.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn team(&self, id: TeamId) -> Result<Option<Team>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.teams.get(&id).cloned())
    }

    async fn remove_team(&self, id: TeamId) -> Result<(), StoreError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        inner.teams.remove(&id).ok_or(StoreError::MissingTeam(id))?;

        let now = Utc::now();
        for player in inner.players.values_mut() {
            if player.team_id == Some(id) {
                player.team_id = None;
                player.updated_at = now;
            }
        }
        inner.scores.retain(|score| score.subject != Subject::Team(id));
        Ok(())
    }

    async fn teams_in_session(&self, id: SessionId) -> Result<Vec<Team>, StoreError> {
        let inner = self.inner.lock().await;
        let mut teams: Vec<Team> = inner
            .teams
            .values()
            .filter(|team| team.session_id == id)
            .cloned()
            .collect();
        teams.sort_by_key(|team| team.id);
        Ok(teams)
    }

    // -- Scores --

    async fn insert_score(&self, new: NewScore) -> Result<Score, StoreError> {
        let mut inner = self.inner.lock().await;
        let id = ScoreId(self.next_score_id.fetch_add(1, Ordering::Relaxed));
        let score = Score {
            id,
            subject: new.subject,
            session_id: new.session_id,
            game_id: new.game_id,
            points: new.points,
            awarded_at: Utc::now(),
        };
        inner.scores.push(score.clone());
        Ok(score)
    }

    async fn scores_in_session(&self, id: SessionId) -> Result<Vec<Score>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .scores
            .iter()
            .filter(|score| score.session_id == id)
            .cloned()
            .collect())
    }

    async fn scores_for_game(
        &self,
        session_id: SessionId,
        game_id: GameId,
    ) -> Result<Vec<Score>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .scores
            .iter()
            .filter(|score| {
                score.session_id == session_id && score.game_id == game_id
            })
            .cloned()
            .collect())
    }
}

// =========================================================================
// Tests
// =========================================================================
