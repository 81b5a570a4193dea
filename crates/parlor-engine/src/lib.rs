//! Orchestration core for Parlor game nights.
//!
//! Two services share a storage backend and an event sink: the session
//! manager drives a night from creation to its end, and the scoreboard
//! keeps the point ledger and the standings read from it. Everything
//! that happens is announced through the sink so clients watching a
//! session (or a single team) stay current without polling.
//!
//! # Key types
//!
//! - [`SessionManager`] — sessions, join codes, rosters, teams, and the
//!   `Pending → InProgress → Completed` lifecycle
//! - [`Scoreboard`] — point awards, per-game leaderboards, session
//!   aggregates
//! - [`EventSink`] — where announcements go; [`BroadcastSink`] fans them
//!   out over a tokio broadcast channel, [`NullSink`] drops them
//! - [`JoinCodeConfig`] — join-code length and retry tuning
//! - [`EngineError`] / [`ErrorKind`] — what can go wrong, and which of
//!   the five failure families it belongs to

mod error;
mod fanout;
mod join_code;
mod lifecycle;
mod scoring;
mod teams;

pub use error::{EngineError, ErrorKind};
pub use fanout::{BroadcastSink, EventSink, NullSink, PublishError};
pub use join_code::{CODE_ALPHABET, JoinCodeConfig, JoinCodeIssuer};
pub use lifecycle::SessionManager;
pub use scoring::Scoreboard;
pub use teams::{TeamAssignment, check_assignments, split_into_teams};
