//! The score ledger and the standings derived from it.
//!
//! Points are appended, never edited: a correction is another entry
//! (negative points are fine), so the history of a night stays
//! auditable. Standings are computed from the ledger on demand in two
//! shapes:
//!
//! - [`Scoreboard::game_leaderboard`] — one game's totals, ranked
//! - [`Scoreboard::session_aggregate`] — the whole night, per subject,
//!   broken down game by game
//!
//! Awards name a *subject*: a single player or a whole team. The two
//! kinds never merge; a player's own points and their team's points are
//! separate rows on every board.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use parlor_model::{
    GameId, GamePoints, LeaderboardRow, PlayerId, Score, Session,
    SessionAggregate, SessionEvent, SessionId, Subject, SubjectBreakdown,
    TeamId, Topic,
};
use parlor_store::{NewScore, Store};

use crate::error::EngineError;
use crate::fanout::{EventSink, dispatch};

/// Appends score entries and renders standings over them.
///
/// Shares the store and sink with the session manager; awards announce
/// themselves on the session topic like any other session news.
pub struct Scoreboard<S, E> {
    store: Arc<S>,
    sink: Arc<E>,
}

impl<S: Store, E: EventSink> Scoreboard<S, E> {
    pub fn new(store: Arc<S>, sink: Arc<E>) -> Self {
        Self { store, sink }
    }

    // -- Internal helpers -------------------------------------------------

    async fn exclusive(&self, id: SessionId) -> OwnedMutexGuard<()> {
        self.store.session_lock(id).await.lock_owned().await
    }

    async fn session_or_not_found(
        &self,
        id: SessionId,
    ) -> Result<Session, EngineError> {
        self.store
            .session(id)
            .await?
            .ok_or(EngineError::SessionNotFound(id))
    }

    /// The display name behind a subject. Cascading removal keeps the
    /// ledger free of dangling subjects, so a miss here means the
    /// backend broke that contract; the error is passed up rather than
    /// papered over.
    async fn subject_name(&self, subject: Subject) -> Result<String, EngineError> {
        match subject {
            Subject::Player(id) => Ok(self
                .store
                .player(id)
                .await?
                .ok_or(EngineError::PlayerNotFound(id))?
                .name),
            Subject::Team(id) => Ok(self
                .store
                .team(id)
                .await?
                .ok_or(EngineError::TeamNotFound(id))?
                .name),
        }
    }

    async fn append(
        &self,
        subject: Subject,
        session_id: SessionId,
        game_id: GameId,
        points: i64,
    ) -> Result<Score, EngineError> {
        self.store
            .game(game_id)
            .await?
            .ok_or(EngineError::GameNotFound(game_id))?;

        let score = self
            .store
            .insert_score(NewScore {
                subject,
                session_id,
                game_id,
                points,
            })
            .await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::ScoreUpdated {
                session_id,
                subject,
                game_id,
                points,
            },
        );
        tracing::info!(
            session_id = %session_id,
            game_id = %game_id,
            points,
            "points awarded"
        );
        Ok(score)
    }

    // =====================================================================
    // Awarding
    // =====================================================================

    /// Awards points to one player for one game. Negative points are a
    /// penalty; nothing is clamped.
    ///
    /// The entry lands in the session the player currently belongs to.
    /// The night may already be over (a last round is often scored
    /// moments after the host ends it); only detachment blocks an award,
    /// because a free-floating player has no ledger to write to.
    ///
    /// # Errors
    /// - [`EngineError::PlayerNotFound`] — unknown player
    /// - [`EngineError::DetachedSubject`] — player is in no session
    /// - [`EngineError::GameNotFound`] — unknown game
    pub async fn award_points_to_player(
        &self,
        player_id: PlayerId,
        game_id: GameId,
        points: i64,
    ) -> Result<Score, EngineError> {
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        let session_id = player
            .session_id
            .ok_or(EngineError::DetachedSubject(player_id))?;

        let _guard = self.exclusive(session_id).await;
        // Re-read under the lock; the roster may have changed while we
        // waited, and an award must not outlive its subject's cascade.
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        match player.session_id {
            Some(current) if current == session_id => {}
            Some(current) => {
                return Err(EngineError::NotInSession {
                    player_id,
                    session_id: current,
                })
            }
            None => return Err(EngineError::DetachedSubject(player_id)),
        }

        self.append(Subject::Player(player_id), session_id, game_id, points)
            .await
    }

    /// Awards points to a whole team for one game. Team points live on
    /// the team, not its members; standings report them side by side.
    ///
    /// # Errors
    /// - [`EngineError::TeamNotFound`] — unknown team, or it was
    ///   dissolved by a re-formation before the award landed
    /// - [`EngineError::GameNotFound`] — unknown game
    pub async fn award_points_to_team(
        &self,
        team_id: TeamId,
        game_id: GameId,
        points: i64,
    ) -> Result<Score, EngineError> {
        let team = self
            .store
            .team(team_id)
            .await?
            .ok_or(EngineError::TeamNotFound(team_id))?;
        let session_id = team.session_id;

        let _guard = self.exclusive(session_id).await;
        self.store
            .team(team_id)
            .await?
            .ok_or(EngineError::TeamNotFound(team_id))?;

        self.append(Subject::Team(team_id), session_id, game_id, points)
            .await
    }

    // =====================================================================
    // Standings
    // =====================================================================

    /// Ranks every subject that scored in one game of a session, total
    /// points descending. Ties rank players above teams, then lower ids
    /// first, so equal inputs always render the same board. Subjects
    /// with no entries for the game do not appear.
    pub async fn game_leaderboard(
        &self,
        session_id: SessionId,
        game_id: GameId,
    ) -> Result<Vec<LeaderboardRow>, EngineError> {
        self.session_or_not_found(session_id).await?;
        self.store
            .game(game_id)
            .await?
            .ok_or(EngineError::GameNotFound(game_id))?;

        let mut totals: HashMap<Subject, i64> = HashMap::new();
        for entry in self.store.scores_for_game(session_id, game_id).await? {
            *totals.entry(entry.subject).or_default() += entry.points;
        }

        let mut rows = Vec::with_capacity(totals.len());
        for (subject, total_points) in totals {
            rows.push(LeaderboardRow {
                subject,
                name: self.subject_name(subject).await?,
                total_points,
            });
        }
        rows.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.subject.sort_key().cmp(&b.subject.sort_key()))
        });
        Ok(rows)
    }

    /// The whole night in one report: every subject that scored at all,
    /// with its overall total and a per-game breakdown, split into
    /// player standings and team standings. Within a breakdown, games
    /// appear in the order the subject first scored in them; games that
    /// net out to zero are dropped from the breakdown but still count
    /// toward (nothing in) the total.
    pub async fn session_aggregate(
        &self,
        session_id: SessionId,
    ) -> Result<SessionAggregate, EngineError> {
        self.session_or_not_found(session_id).await?;
        let entries = self.store.scores_in_session(session_id).await?;

        // First-appearance order, so the fold is deterministic before
        // the final sort.
        let mut order: Vec<Subject> = Vec::new();
        let mut tallies: HashMap<Subject, Tally> = HashMap::new();
        for entry in &entries {
            let tally = tallies.entry(entry.subject).or_insert_with(|| {
                order.push(entry.subject);
                Tally::default()
            });
            tally.add(entry.game_id, entry.points);
        }

        let game_names = self.game_names(&entries).await?;

        let mut players = Vec::new();
        let mut teams = Vec::new();
        for subject in order {
            let tally = &tallies[&subject];
            let breakdown = SubjectBreakdown {
                subject,
                name: self.subject_name(subject).await?,
                total_points: tally.total,
                per_game: tally.breakdown(&game_names)?,
            };
            match subject {
                Subject::Player(_) => players.push(breakdown),
                Subject::Team(_) => teams.push(breakdown),
            }
        }

        let rank = |a: &SubjectBreakdown, b: &SubjectBreakdown| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.subject.sort_key().cmp(&b.subject.sort_key()))
        };
        players.sort_by(rank);
        teams.sort_by(rank);

        Ok(SessionAggregate {
            session_id,
            players,
            teams,
        })
    }

    /// Resolves the names of every game the ledger touches in one
    /// store round-trip.
    async fn game_names(
        &self,
        entries: &[Score],
    ) -> Result<HashMap<GameId, String>, EngineError> {
        let mut ids: Vec<GameId> = Vec::new();
        for entry in entries {
            if !ids.contains(&entry.game_id) {
                ids.push(entry.game_id);
            }
        }
        Ok(self
            .store
            .games_by_ids(&ids)
            .await?
            .into_iter()
            .map(|game| (game.id, game.name))
            .collect())
    }
}

/// One subject's running sums while folding the ledger.
#[derive(Default)]
struct Tally {
    total: i64,
    game_order: Vec<GameId>,
    per_game: HashMap<GameId, i64>,
}

impl Tally {
    fn add(&mut self, game_id: GameId, points: i64) {
        self.total += points;
        if !self.per_game.contains_key(&game_id) {
            self.game_order.push(game_id);
        }
        *self.per_game.entry(game_id).or_default() += points;
    }

    /// The nonzero per-game lines, in the order the games first appear
    /// in this subject's history.
    fn breakdown(
        &self,
        names: &HashMap<GameId, String>,
    ) -> Result<Vec<GamePoints>, EngineError> {
        let mut lines = Vec::new();
        for &game_id in &self.game_order {
            let points = self.per_game[&game_id];
            if points == 0 {
                continue;
            }
            let game_name = names
                .get(&game_id)
                .cloned()
                .ok_or(EngineError::GameNotFound(game_id))?;
            lines.push(GamePoints {
                game_id,
                game_name,
                points,
            });
        }
        Ok(lines)
    }
}

// =========================================================================
// Tests
// =========================================================================
