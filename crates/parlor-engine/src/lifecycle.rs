//! The session manager: every operation of a game night's lifecycle.
//!
//! One struct owns the whole flow, from a host creating a session to
//! ending it:
//!
//! ```text
//! create_session() ──→ [Pending] ──start_session()──→ [InProgress]
//!        │                 │                               │
//!        │            join_by_code()                  next_game() ⟲
//!        │            assign_players()                     │
//!        │            form_*_teams()                 end_session()
//!        │                 │                               │
//!        │                 └──────end_session()──────→ [Completed]
//!        └── join code issued                              │
//!                                              (reads stay available)
//! ```
//!
//! # Concurrency
//!
//! Every operation that mutates one session first takes that session's
//! lock from the store, then re-reads the row under the lock. Two hosts
//! double-clicking "start", or two players racing to join, therefore
//! serialize: the first mutation wins and the second sees its effects.
//! Operations on different sessions share nothing and never contend.
//!
//! # Authorization
//!
//! Mutating operations take the acting host's id and verify it against
//! the stored session on every call. There is no ambient "current user";
//! whoever holds the engine must pass the claimed identity in.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;

use parlor_model::{
    Game, GameId, Player, PlayerId, Session, SessionDetail, SessionEvent,
    SessionId, SessionStatus, SessionSummary, Team, TeamDetail, TeamEvent,
    TeamId, TeamRoster, Topic,
};
use parlor_store::{NewGame, NewPlayer, NewSession, NewTeam, Store};

use crate::error::EngineError;
use crate::fanout::{EventSink, dispatch};
use crate::join_code::{JoinCodeConfig, JoinCodeIssuer};
use crate::teams::{check_assignments, split_into_teams, TeamAssignment};

/// Orchestrates sessions end to end: creation, joining, team formation,
/// lifecycle transitions, and the events announcing each of them.
///
/// Generic over the storage backend and the event sink so tests can
/// swap either; share it across tasks behind an `Arc`.
pub struct SessionManager<S, E> {
    store: Arc<S>,
    sink: Arc<E>,
    issuer: JoinCodeIssuer,
}

impl<S: Store, E: EventSink> SessionManager<S, E> {
    /// Creates a manager with default join-code tuning (six characters,
    /// ten attempts).
    pub fn new(store: Arc<S>, sink: Arc<E>) -> Self {
        Self::with_config(store, sink, JoinCodeConfig::default())
    }

    pub fn with_config(
        store: Arc<S>,
        sink: Arc<E>,
        codes: JoinCodeConfig,
    ) -> Self {
        Self {
            store,
            sink,
            issuer: JoinCodeIssuer::new(codes),
        }
    }

    // -- Internal helpers -------------------------------------------------

    /// Takes the session's lock. Held for the rest of the calling
    /// operation; every mutation of the same session queues behind it.
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

    fn authorize(session: &Session, host_id: PlayerId) -> Result<(), EngineError> {
        if session.host_id != host_id {
            return Err(EngineError::NotSessionHost {
                player_id: host_id,
                session_id: session.id,
            });
        }
        Ok(())
    }

    /// Resolves ids to games, failing on the first id that does not
    /// exist rather than silently shrinking the playlist.
    async fn resolve_games(&self, ids: &[GameId]) -> Result<Vec<Game>, EngineError> {
        let games = self.store.games_by_ids(ids).await?;
        if games.len() != ids.len() {
            let found: HashSet<GameId> = games.iter().map(|g| g.id).collect();
            if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
                return Err(EngineError::GameNotFound(*missing));
            }
        }
        Ok(games)
    }

    // =====================================================================
    // Players and games (the fixtures sessions are built from)
    // =====================================================================

    /// Registers a new host.
    pub async fn create_host(
        &self,
        name: impl Into<String>,
    ) -> Result<Player, EngineError> {
        let player = self.store.insert_player(NewPlayer::host(name)).await?;
        tracing::info!(player_id = %player.id, "host created");
        Ok(player)
    }

    /// Removes a player. A rostered player's session lock is taken
    /// first so the removal cannot interleave with team formation or a
    /// lifecycle change; their score entries go with them.
    pub async fn remove_player(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;

        let _guard = match player.session_id {
            Some(session_id) => Some(self.exclusive(session_id).await),
            None => None,
        };
        self.store.remove_player(player_id).await?;
        tracing::info!(player_id = %player_id, "player removed");
        Ok(())
    }

    /// Adds a game to the catalog.
    pub async fn create_game(&self, new: NewGame) -> Result<Game, EngineError> {
        let game = self.store.insert_game(new).await?;
        tracing::info!(game_id = %game.id, name = %game.name, "game created");
        Ok(game)
    }

    /// The whole game catalog, in creation order.
    pub async fn list_games(&self) -> Result<Vec<Game>, EngineError> {
        Ok(self.store.all_games().await?)
    }

    // =====================================================================
    // Session creation and lookup
    // =====================================================================

    /// Creates a session: verifies the caller is a host, resolves the
    /// initial playlist, issues a join code, and stores the row in its
    /// `Pending` birth state.
    ///
    /// # Errors
    /// - [`EngineError::PlayerNotFound`] / [`EngineError::NotAHost`] —
    ///   bad caller
    /// - [`EngineError::GameNotFound`] — playlist references a game
    ///   that does not exist
    /// - [`EngineError::CodeExhausted`] — join code space contention
    pub async fn create_session(
        &self,
        host_id: PlayerId,
        name: impl Into<String>,
        game_ids: Vec<GameId>,
    ) -> Result<Session, EngineError> {
        let host = self
            .store
            .player(host_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(host_id))?;
        if !host.role.is_host() {
            return Err(EngineError::NotAHost(host_id));
        }

        self.resolve_games(&game_ids).await?;
        let game_ids = dedup_playlist(game_ids);

        // Issued and written in two steps; the store's uniqueness check
        // is the arbiter if another creation grabs the code in between.
        let join_code = self.issuer.issue(self.store.as_ref()).await?;
        let session = self
            .store
            .insert_session(NewSession {
                name: name.into(),
                host_id,
                join_code: Some(join_code),
                game_ids,
            })
            .await?;

        tracing::info!(
            session_id = %session.id,
            host_id = %host_id,
            join_code = ?session.join_code,
            "session created"
        );
        Ok(session)
    }

    /// Every session this host has created, oldest first.
    pub async fn list_sessions(
        &self,
        host_id: PlayerId,
    ) -> Result<Vec<Session>, EngineError> {
        let host = self
            .store
            .player(host_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(host_id))?;
        if !host.role.is_host() {
            return Err(EngineError::NotAHost(host_id));
        }
        Ok(self.store.sessions_by_host(host_id).await?)
    }

    /// The full picture of one session: playlist in order, roster, and
    /// teams with members resolved. Host only.
    pub async fn find_session(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
    ) -> Result<SessionDetail, EngineError> {
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;

        let games = self.store.games_by_ids(&session.game_ids).await?;
        let players = self.store.players_in_session(session_id).await?;
        let teams = self
            .store
            .teams_in_session(session_id)
            .await?
            .into_iter()
            .map(|team| {
                let members = players
                    .iter()
                    .filter(|p| p.team_id == Some(team.id))
                    .cloned()
                    .collect();
                TeamDetail { team, members }
            })
            .collect();

        Ok(SessionDetail {
            session,
            games,
            players,
            teams,
        })
    }

    /// Renames a session. Allowed in any lifecycle state; the name is
    /// cosmetic.
    pub async fn rename_session(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        name: impl Into<String>,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let mut session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;

        session.name = name.into();
        Ok(self.store.update_session(&session).await?)
    }

    /// Deletes a session outright. Teams, rostered players, and scores
    /// cascade away with it, and the join code frees up immediately.
    pub async fn remove_session(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
    ) -> Result<(), EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;

        self.store.remove_session(session_id).await?;
        tracing::info!(session_id = %session_id, "session removed");
        Ok(())
    }

    // =====================================================================
    // Playlist and roster
    // =====================================================================

    /// Appends games to a pending session's playlist. Games already on
    /// the playlist are skipped, so re-sending a list is harmless.
    ///
    /// # Errors
    /// [`EngineError::InvalidState`] once the session has started; the
    /// playlist is fixed from then on.
    pub async fn add_games(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        game_ids: Vec<GameId>,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let mut session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status != SessionStatus::Pending {
            return Err(EngineError::InvalidState {
                attempted: "add games to",
                session_id,
                status: session.status,
            });
        }

        self.resolve_games(&game_ids).await?;
        for game_id in dedup_playlist(game_ids) {
            if !session.game_ids.contains(&game_id) {
                session.game_ids.push(game_id);
            }
        }
        Ok(self.store.update_session(&session).await?)
    }

    /// Creates participants by name and puts them straight on the
    /// roster, the host's shortcut for everyone physically in the room.
    /// Returns the created players in input order.
    pub async fn assign_players(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        names: Vec<String>,
    ) -> Result<Vec<Player>, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if !session.is_joinable() {
            return Err(EngineError::InvalidState {
                attempted: "assign players to",
                session_id,
                status: session.status,
            });
        }

        let mut created = Vec::with_capacity(names.len());
        for name in names {
            let player = self
                .store
                .insert_player(NewPlayer::participant(name, session_id))
                .await?;
            created.push(player);
        }

        tracing::info!(
            session_id = %session_id,
            count = created.len(),
            "players assigned to roster"
        );
        Ok(created)
    }

    /// Redeems a join code for an existing player.
    ///
    /// The code resolves only to an active session. Joining is open up
    /// to the moment the night ends, including mid-game; a player who is
    /// already rostered elsewhere moves here, leaving their old team
    /// behind.
    ///
    /// # Errors
    /// - [`EngineError::UnknownJoinCode`] — no active session holds it
    /// - [`EngineError::SessionCompleted`] — the night ended between
    ///   lookup and join
    /// - [`EngineError::AlreadyJoined`] — the player is already on this
    ///   roster
    /// - [`EngineError::HostCannotJoin`] — hosts do not sit on rosters
    pub async fn join_by_code(
        &self,
        code: &str,
        player_id: PlayerId,
    ) -> Result<Session, EngineError> {
        let player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        if player.role.is_host() {
            return Err(EngineError::HostCannotJoin(player_id));
        }

        let session = self
            .store
            .session_by_code(code)
            .await?
            .ok_or_else(|| EngineError::UnknownJoinCode(code.to_string()))?;

        let _guard = self.exclusive(session.id).await;
        // Re-read under the lock; the session may have ended or been
        // removed since the code lookup.
        let session = self.session_or_not_found(session.id).await?;
        if !session.is_joinable() {
            return Err(EngineError::SessionCompleted(session.id));
        }
        if player.session_id == Some(session.id) {
            return Err(EngineError::AlreadyJoined(player_id, session.id));
        }

        let mut player = player;
        player.session_id = Some(session.id);
        player.team_id = None;
        let player = self.store.update_player(&player).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session.id),
            SessionEvent::PlayerJoined {
                session_id: session.id,
                player_id,
                player_name: player.name.clone(),
            },
        );
        tracing::info!(
            session_id = %session.id,
            player_id = %player_id,
            "player joined by code"
        );
        Ok(session)
    }

    /// Previews the session behind a join code without joining: name,
    /// status, and how many players are already in. Open to anyone
    /// holding the code.
    pub async fn lookup_by_code(
        &self,
        code: &str,
    ) -> Result<SessionSummary, EngineError> {
        let session = self
            .store
            .session_by_code(code)
            .await?
            .ok_or_else(|| EngineError::UnknownJoinCode(code.to_string()))?;
        let roster = self.store.players_in_session(session.id).await?;

        Ok(SessionSummary {
            id: session.id,
            name: session.name,
            host_id: session.host_id,
            status: session.status,
            join_code: session.join_code,
            player_count: roster.len(),
        })
    }

    // =====================================================================
    // Team formation
    // =====================================================================

    /// Shuffles the roster into `team_count` balanced teams named
    /// "Team 1".."Team n", replacing whatever teams existed before.
    ///
    /// # Errors
    /// - [`EngineError::InvalidState`] — formation is a planning step;
    ///   the session must still be pending
    /// - [`EngineError::InvalidTeamCount`] — zero teams, or more teams
    ///   than players
    pub async fn form_random_teams(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        team_count: usize,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status != SessionStatus::Pending {
            return Err(EngineError::InvalidState {
                attempted: "form teams for",
                session_id,
                status: session.status,
            });
        }

        let roster = self.store.players_in_session(session_id).await?;
        let ids: Vec<PlayerId> = roster.iter().map(|p| p.id).collect();
        let groups = {
            let mut rng = rand::rng();
            split_into_teams(&ids, team_count, &mut rng)?
        };
        let plan: Vec<(String, Vec<PlayerId>)> = groups
            .into_iter()
            .enumerate()
            .map(|(index, members)| (format!("Team {}", index + 1), members))
            .collect();

        let rosters = self.replace_teams(session_id, plan).await?;
        let session = self.store.update_session(&session).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::TeamUpdated {
                session_id,
                teams: rosters,
            },
        );
        tracing::info!(
            session_id = %session_id,
            teams = team_count,
            "random teams formed"
        );
        Ok(session)
    }

    /// Replaces the session's teams with exactly the host's hand-picked
    /// assignment.
    ///
    /// Validation runs before anything is written: if an assignment
    /// references an off-roster player or repeats one, the session's
    /// existing teams survive untouched. A storage failure mid-write
    /// instead rolls the new teams back, leaving zero teams rather than
    /// half a formation.
    pub async fn form_custom_teams(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        assignments: Vec<TeamAssignment>,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status != SessionStatus::Pending {
            return Err(EngineError::InvalidState {
                attempted: "form teams for",
                session_id,
                status: session.status,
            });
        }

        let roster = self.store.players_in_session(session_id).await?;
        check_assignments(session_id, &roster, &assignments)?;

        let plan: Vec<(String, Vec<PlayerId>)> = assignments
            .into_iter()
            .map(|a| (a.name, a.player_ids))
            .collect();

        let rosters = self.replace_teams(session_id, plan).await?;
        let session = self.store.update_session(&session).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::TeamUpdated {
                session_id,
                teams: rosters,
            },
        );
        tracing::info!(
            session_id = %session_id,
            "custom teams formed"
        );
        Ok(session)
    }

    /// Drops every existing team, then creates the planned ones and
    /// writes the memberships. Any failure unwinds the teams created so
    /// far; the assignment is all-or-nothing.
    async fn replace_teams(
        &self,
        session_id: SessionId,
        plan: Vec<(String, Vec<PlayerId>)>,
    ) -> Result<Vec<TeamRoster>, EngineError> {
        for team in self.store.teams_in_session(session_id).await? {
            self.store.remove_team(team.id).await?;
        }

        let mut rosters: Vec<TeamRoster> = Vec::with_capacity(plan.len());
        for (name, member_ids) in plan {
            match self.build_team(session_id, &name, &member_ids).await {
                Ok(roster) => rosters.push(roster),
                Err(error) => {
                    for roster in &rosters {
                        if let Err(cleanup) =
                            self.store.remove_team(roster.team_id).await
                        {
                            tracing::warn!(
                                team_id = %roster.team_id,
                                error = %cleanup,
                                "team rollback failed"
                            );
                        }
                    }
                    return Err(error);
                }
            }
        }
        Ok(rosters)
    }

    /// Creates one team and attaches its members. If a membership write
    /// fails, the team itself is removed before the error surfaces so
    /// the caller never sees a partial team.
    async fn build_team(
        &self,
        session_id: SessionId,
        name: &str,
        member_ids: &[PlayerId],
    ) -> Result<TeamRoster, EngineError> {
        let team = self
            .store
            .insert_team(NewTeam {
                name: name.to_string(),
                session_id,
            })
            .await?;

        for &player_id in member_ids {
            if let Err(error) = self.attach_member(team.id, player_id).await {
                if let Err(cleanup) = self.store.remove_team(team.id).await {
                    tracing::warn!(
                        team_id = %team.id,
                        error = %cleanup,
                        "team rollback failed"
                    );
                }
                return Err(error);
            }
        }

        Ok(TeamRoster {
            team_id: team.id,
            name: name.to_string(),
            player_ids: member_ids.to_vec(),
        })
    }

    async fn attach_member(
        &self,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<(), EngineError> {
        let mut player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        player.team_id = Some(team_id);
        self.store.update_player(&player).await?;
        Ok(())
    }

    /// Resolves a team, insisting it belongs to the given session.
    async fn team_in_session(
        &self,
        session_id: SessionId,
        team_id: TeamId,
    ) -> Result<Team, EngineError> {
        self.store
            .team(team_id)
            .await?
            .filter(|team| team.session_id == session_id)
            .ok_or(EngineError::TeamNotFound(team_id))
    }

    /// Moves a rostered player onto a team (off their previous team if
    /// they had one). Allowed until the night ends.
    pub async fn add_player_to_team(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<TeamDetail, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if !session.is_joinable() {
            return Err(EngineError::InvalidState {
                attempted: "modify teams of",
                session_id,
                status: session.status,
            });
        }

        let team = self.team_in_session(session_id, team_id).await?;
        let mut player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        if player.session_id != Some(session_id) {
            return Err(EngineError::NotInSession {
                player_id,
                session_id,
            });
        }

        player.team_id = Some(team_id);
        let player = self.store.update_player(&player).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Team(team_id),
            TeamEvent::PlayerJoined {
                team_id,
                player_id,
                player_name: player.name.clone(),
            },
        );

        let members = self.team_members(session_id, team_id).await?;
        Ok(TeamDetail { team, members })
    }

    /// Takes a player off a team they are currently on. The player
    /// stays on the session roster, just unaffiliated.
    pub async fn remove_player_from_team(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<TeamDetail, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if !session.is_joinable() {
            return Err(EngineError::InvalidState {
                attempted: "modify teams of",
                session_id,
                status: session.status,
            });
        }

        let team = self.team_in_session(session_id, team_id).await?;
        let mut player = self
            .store
            .player(player_id)
            .await?
            .ok_or(EngineError::PlayerNotFound(player_id))?;
        if player.team_id != Some(team_id) {
            return Err(EngineError::NotOnTeam { player_id, team_id });
        }

        player.team_id = None;
        let player = self.store.update_player(&player).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Team(team_id),
            TeamEvent::PlayerLeft {
                team_id,
                player_id,
                player_name: player.name.clone(),
            },
        );

        let members = self.team_members(session_id, team_id).await?;
        Ok(TeamDetail { team, members })
    }

    async fn team_members(
        &self,
        session_id: SessionId,
        team_id: TeamId,
    ) -> Result<Vec<Player>, EngineError> {
        Ok(self
            .store
            .players_in_session(session_id)
            .await?
            .into_iter()
            .filter(|p| p.team_id == Some(team_id))
            .collect())
    }

    // =====================================================================
    // Lifecycle transitions
    // =====================================================================

    /// Starts the night: `Pending` becomes `InProgress`, the first
    /// playlist entry becomes current, and the start time is stamped.
    ///
    /// # Errors
    /// - [`EngineError::InvalidState`] — not pending (a concurrent
    ///   start loses with exactly this error)
    /// - [`EngineError::NoGames`] / [`EngineError::NoPlayers`] — nothing
    ///   to play or nobody to play it
    pub async fn start_session(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let mut session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status != SessionStatus::Pending {
            return Err(EngineError::InvalidState {
                attempted: "start",
                session_id,
                status: session.status,
            });
        }

        let first_game = match session.game_ids.first() {
            Some(id) => *id,
            None => return Err(EngineError::NoGames(session_id)),
        };
        let roster = self.store.players_in_session(session_id).await?;
        if roster.is_empty() {
            return Err(EngineError::NoPlayers(session_id));
        }

        session.status = SessionStatus::InProgress;
        session.current_game_id = Some(first_game);
        session.started_at = Some(Utc::now());
        let session = self.store.update_session(&session).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::SessionStarted {
                session_id,
                current_game_id: first_game,
            },
        );
        tracing::info!(
            session_id = %session_id,
            current_game_id = %first_game,
            "session started"
        );
        Ok(session)
    }

    /// Advances to the next playlist entry.
    ///
    /// # Errors
    /// - [`EngineError::InvalidState`] — only a running session has a
    ///   current game to advance from
    /// - [`EngineError::NoMoreGames`] — the current game is the last
    pub async fn next_game(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let mut session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status != SessionStatus::InProgress {
            return Err(EngineError::InvalidState {
                attempted: "advance",
                session_id,
                status: session.status,
            });
        }

        let next = session
            .current_game_id
            .and_then(|current| session.game_after(current))
            .ok_or(EngineError::NoMoreGames(session_id))?;

        session.current_game_id = Some(next);
        let session = self.store.update_session(&session).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::GameChanged {
                session_id,
                current_game_id: next,
            },
        );
        tracing::info!(
            session_id = %session_id,
            current_game_id = %next,
            "advanced to next game"
        );
        Ok(session)
    }

    /// Ends the night from either live state: `Pending` (the host
    /// cancels before playing) or `InProgress`. The session deactivates,
    /// its join code frees up, the current game clears, and the end time
    /// is stamped. Scores and teams stay readable afterwards.
    ///
    /// # Errors
    /// [`EngineError::AlreadyCompleted`] — it was already over.
    pub async fn end_session(
        &self,
        session_id: SessionId,
        host_id: PlayerId,
    ) -> Result<Session, EngineError> {
        let _guard = self.exclusive(session_id).await;
        let mut session = self.session_or_not_found(session_id).await?;
        Self::authorize(&session, host_id)?;
        if session.status.is_terminal() {
            return Err(EngineError::AlreadyCompleted(session_id));
        }

        session.status = SessionStatus::Completed;
        session.is_active = false;
        session.current_game_id = None;
        session.ended_at = Some(Utc::now());
        let session = self.store.update_session(&session).await?;

        dispatch(
            self.sink.as_ref(),
            Topic::Session(session_id),
            SessionEvent::SessionEnded { session_id },
        );
        tracing::info!(session_id = %session_id, "session ended");
        Ok(session)
    }
}

/// Keeps the first occurrence of each id, dropping repeats. A playlist
/// never lists one game twice; advancing by position would loop on it.
fn dedup_playlist(ids: Vec<GameId>) -> Vec<GameId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// =========================================================================
// Tests
// =========================================================================
