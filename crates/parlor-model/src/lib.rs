//! Domain model for Parlor.
//!
//! This crate defines the vocabulary that every other Parlor crate speaks:
//!
//! - **Ids** ([`SessionId`], [`PlayerId`], [`GameId`], [`TeamId`],
//!   [`ScoreId`]) — typed identifiers for every entity.
//! - **Lifecycle** ([`SessionStatus`]) — the session state machine.
//! - **Entities** ([`Session`], [`Game`], [`Player`], [`Team`],
//!   [`Score`], [`Subject`]) — the records a storage backend persists.
//! - **Events** ([`SessionEvent`], [`TeamEvent`], [`Topic`]) — what the
//!   engine publishes to subscribers when a session changes.
//! - **Reports** ([`LeaderboardRow`], [`SessionAggregate`], etc.) — the
//!   read-side shapes produced by score aggregation and lookups.
//!
//! # Architecture
//!
//! The model layer has no behavior beyond small helpers and no I/O. It
//! sits below storage and the engine, so both can share one definition
//! of every record and every event:
//!
//! ```text
//! Model (records) → Store (persistence) → Engine (orchestration)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod entity;
mod event;
mod id;
mod report;
mod status;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// Everything is re-exported at the crate root so callers can write
// `use parlor_model::Session` instead of reaching into submodules.

pub use entity::{Game, Player, PlayerRole, Score, Session, Subject, Team};
pub use event::{Notification, SessionEvent, TeamEvent, TeamRoster, Topic};
pub use id::{GameId, PlayerId, ScoreId, SessionId, TeamId};
pub use report::{
    GamePoints, LeaderboardRow, SessionAggregate, SessionDetail,
    SessionSummary, SubjectBreakdown, TeamDetail,
};
pub use status::SessionStatus;
