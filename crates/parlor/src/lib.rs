//! # Parlor
//!
//! Orchestration engine for multiplayer game nights.
//!
//! A host creates a session, hands out a short join code, shuffles the
//! roster into teams, and walks an ordered playlist of games while
//! points land on a tamper-evident ledger. Every change is fanned out
//! as a typed event, so scoreboards and player screens follow along
//! live.
//!
//! The workspace is layered; this crate re-exports the layers and adds
//! the unified [`ParlorError`]:
//!
//! - [`model`] — entities, lifecycle states, events, report rows
//! - [`store`] — the persistence trait and the in-memory backend
//! - [`engine`] — the session manager, the scoreboard, and the sinks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use parlor::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParlorError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let sink = Arc::new(BroadcastSink::new(64));
//!     let manager = SessionManager::new(Arc::clone(&store), Arc::clone(&sink));
//!     let scoreboard = Scoreboard::new(Arc::clone(&store), Arc::clone(&sink));
//!
//!     let host = manager.create_host("Quinn").await?;
//!     let trivia = manager
//!         .create_game(NewGame {
//!             name: "Trivia".into(),
//!             kind: "trivia".into(),
//!             rules: None,
//!             rounds: Some(3),
//!         })
//!         .await?;
//!     let session = manager
//!         .create_session(host.id, "Friday night", vec![trivia.id])
//!         .await?;
//!     println!(
//!         "join with code {}",
//!         session.join_code.as_deref().unwrap_or("?")
//!     );
//!
//!     let players = manager
//!         .assign_players(session.id, host.id, vec!["Ada".into(), "Bo".into()])
//!         .await?;
//!     manager.start_session(session.id, host.id).await?;
//!
//!     scoreboard
//!         .award_points_to_player(players[0].id, trivia.id, 10)
//!         .await?;
//!     for row in scoreboard.game_leaderboard(session.id, trivia.id).await? {
//!         println!("{}: {} pts", row.name, row.total_points);
//!     }
//!
//!     manager.end_session(session.id, host.id).await?;
//!     Ok(())
//! }
//! ```

pub use parlor_engine as engine;
pub use parlor_model as model;
pub use parlor_store as store;

mod error;

pub use error::ParlorError;

/// Everything a typical caller needs, flattened.
pub mod prelude {
    pub use crate::ParlorError;
    pub use parlor_engine::{
        BroadcastSink, EngineError, ErrorKind, EventSink, JoinCodeConfig,
        NullSink, Scoreboard, SessionManager, TeamAssignment,
    };
    pub use parlor_model::{
        Game, GameId, GamePoints, LeaderboardRow, Notification, Player,
        PlayerId, PlayerRole, Score, ScoreId, Session, SessionAggregate,
        SessionDetail, SessionEvent, SessionId, SessionStatus, SessionSummary,
        Subject, SubjectBreakdown, Team, TeamDetail, TeamEvent, TeamId,
        TeamRoster, Topic,
    };
    pub use parlor_store::{
        MemoryStore, NewGame, NewPlayer, NewScore, NewSession, NewTeam, Store,
        StoreError,
    };
}
