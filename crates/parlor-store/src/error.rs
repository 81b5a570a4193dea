//! Error types for the storage layer.

use parlor_model::{PlayerId, SessionId, TeamId};

/// Errors a storage backend can produce.
///
/// Lookups signal "not there" with `Ok(None)`, not an error; these
/// variants cover writes that cannot proceed and backends that cannot
/// answer at all.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The join code is already held by an active session. This is the
    /// storage-level uniqueness backstop; issuing normally avoids it by
    /// probing first, but two concurrent creations can still collide
    /// here.
    #[error("join code \"{0}\" already belongs to an active session")]
    DuplicateJoinCode(String),

    /// An update or removal targeted a session row that no longer
    /// exists (typically removed concurrently).
    #[error("session {0} is not stored")]
    MissingSession(SessionId),

    /// An update or removal targeted a player row that no longer exists.
    #[error("player {0} is not stored")]
    MissingPlayer(PlayerId),

    /// A removal targeted a team row that no longer exists.
    #[error("team {0} is not stored")]
    MissingTeam(TeamId),

    /// The backend could not be reached or failed mid-operation. Carries
    /// the backend's own description.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}
