//! Error types for the orchestration engine.

use parlor_model::{GameId, PlayerId, SessionId, SessionStatus, TeamId};
use parlor_store::StoreError;

/// The coarse category of an [`EngineError`].
///
/// Outer layers (an HTTP gateway, a CLI) branch on this instead of
/// matching thirty variants: `NotFound` maps naturally to 404,
/// `Forbidden` to 403, `Conflict` to 409, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The referenced session, player, game, team, or join code does
    /// not resolve.
    NotFound,
    /// The caller is not allowed to perform the operation.
    Forbidden,
    /// The operation is not legal in the session's current lifecycle
    /// state.
    InvalidState,
    /// The request itself is malformed (bad team count, overlapping
    /// assignment, subject outside the session).
    InvalidArgument,
    /// Concurrent activity got there first (duplicate join, code space
    /// contention).
    Conflict,
    /// The storage backend failed; nothing about the request was wrong.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::InvalidState => write!(f, "invalid_state"),
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Everything that can go wrong while orchestrating a game night.
///
/// Variants are specific on purpose: callers that care can match the
/// exact failure, and callers that don't can bucket by [`kind`].
///
/// [`kind`]: EngineError::kind
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // -- Not found -------------------------------------------------------

    /// No session exists with this id.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// No player exists with this id.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// No game exists with this id (or a playlist referenced one that
    /// does not exist).
    #[error("game {0} not found")]
    GameNotFound(GameId),

    /// No team with this id exists where the caller expected one.
    #[error("team {0} not found")]
    TeamNotFound(TeamId),

    /// No *active* session holds this join code. Codes of completed
    /// sessions deliberately stop resolving.
    #[error("no active session matches join code \"{0}\"")]
    UnknownJoinCode(String),

    // -- Forbidden -------------------------------------------------------

    /// A player who is not a host tried to do host-only work (create a
    /// session, list their sessions).
    #[error("player {0} is not a host")]
    NotAHost(PlayerId),

    /// The caller is a host, just not this session's host.
    #[error("player {player_id} is not the host of session {session_id}")]
    NotSessionHost {
        player_id: PlayerId,
        session_id: SessionId,
    },

    // -- Invalid state ---------------------------------------------------

    /// The session's lifecycle state forbids the attempted operation.
    /// Carries what was attempted and where the session actually is, so
    /// the message explains itself.
    #[error("cannot {attempted} session {session_id} while {status}")]
    InvalidState {
        attempted: &'static str,
        session_id: SessionId,
        status: SessionStatus,
    },

    /// Ending an already-ended session.
    #[error("session {0} has already been completed")]
    AlreadyCompleted(SessionId),

    /// Joining a session whose night is over.
    #[error("session {0} is completed and cannot be joined")]
    SessionCompleted(SessionId),

    /// Advancing past the last game on the playlist.
    #[error("session {0} has no game after the current one")]
    NoMoreGames(SessionId),

    /// Starting a session with an empty playlist.
    #[error("session {0} has no games to play")]
    NoGames(SessionId),

    /// Starting a session with an empty roster.
    #[error("session {0} has no players on its roster")]
    NoPlayers(SessionId),

    // -- Invalid argument ------------------------------------------------

    /// Random team formation asked for zero teams or more teams than
    /// players.
    #[error("cannot split {players} players into {requested} teams")]
    InvalidTeamCount { requested: usize, players: usize },

    /// A custom team assignment referenced a player who is not on the
    /// session's roster.
    #[error("player {player_id} is not on the roster of session {session_id}")]
    UnknownPlayer {
        player_id: PlayerId,
        session_id: SessionId,
    },

    /// A custom team assignment placed the same player in two teams (or
    /// twice in one).
    #[error("player {0} appears in more than one team assignment")]
    OverlappingAssignment(PlayerId),

    /// A team-membership change referenced a player from a different
    /// session (or none).
    #[error("player {player_id} does not belong to session {session_id}")]
    NotInSession {
        player_id: PlayerId,
        session_id: SessionId,
    },

    /// Removing a player from a team they are not on.
    #[error("player {player_id} is not on team {team_id}")]
    NotOnTeam {
        player_id: PlayerId,
        team_id: TeamId,
    },

    /// Awarding points to a player who is not in any session; there is
    /// no ledger to put the entry in.
    #[error("player {0} belongs to no session, so points cannot be awarded")]
    DetachedSubject(PlayerId),

    /// Hosts drive sessions; they do not sit on rosters.
    #[error("host {0} cannot join a session roster")]
    HostCannotJoin(PlayerId),

    // -- Conflict --------------------------------------------------------

    /// Every generated join code collided with an active session.
    #[error("could not issue a unique join code after {attempts} attempts")]
    CodeExhausted { attempts: u32 },

    /// The player is already on this session's roster.
    #[error("player {0} has already joined session {1}")]
    AlreadyJoined(PlayerId, SessionId),

    // -- Storage ---------------------------------------------------------

    /// The storage backend refused or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_)
            | Self::PlayerNotFound(_)
            | Self::GameNotFound(_)
            | Self::TeamNotFound(_)
            | Self::UnknownJoinCode(_) => ErrorKind::NotFound,

            Self::NotAHost(_) | Self::NotSessionHost { .. } => ErrorKind::Forbidden,

            Self::InvalidState { .. }
            | Self::AlreadyCompleted(_)
            | Self::SessionCompleted(_)
            | Self::NoMoreGames(_)
            | Self::NoGames(_)
            | Self::NoPlayers(_) => ErrorKind::InvalidState,

            Self::InvalidTeamCount { .. }
            | Self::UnknownPlayer { .. }
            | Self::OverlappingAssignment(_)
            | Self::NotInSession { .. }
            | Self::NotOnTeam { .. }
            | Self::DetachedSubject(_)
            | Self::HostCannotJoin(_) => ErrorKind::InvalidArgument,

            Self::CodeExhausted { .. } | Self::AlreadyJoined(_, _) => {
                ErrorKind::Conflict
            }

            Self::Store(error) => match error {
                StoreError::DuplicateJoinCode(_) => ErrorKind::Conflict,
                StoreError::MissingSession(_)
                | StoreError::MissingPlayer(_)
                | StoreError::MissingTeam(_) => ErrorKind::NotFound,
                StoreError::Unavailable(_) => ErrorKind::Internal,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_buckets_not_found_variants() {
        assert_eq!(
            EngineError::SessionNotFound(SessionId(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::UnknownJoinCode("ABC234".into()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_kind_buckets_lifecycle_variants() {
        let error = EngineError::InvalidState {
            attempted: "start",
            session_id: SessionId(3),
            status: SessionStatus::InProgress,
        };
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_eq!(
            EngineError::AlreadyCompleted(SessionId(3)).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            EngineError::NoMoreGames(SessionId(3)).kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_kind_buckets_store_errors_by_variant() {
        let conflict = EngineError::from(StoreError::DuplicateJoinCode("AB".into()));
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let missing = EngineError::from(StoreError::MissingSession(SessionId(9)));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let down = EngineError::from(StoreError::Unavailable("boom".into()));
        assert_eq!(down.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_invalid_state_message_names_attempt_and_status() {
        let error = EngineError::InvalidState {
            attempted: "start",
            session_id: SessionId(3),
            status: SessionStatus::InProgress,
        };
        assert_eq!(
            error.to_string(),
            "cannot start session S-3 while in_progress"
        );
    }

    #[test]
    fn test_store_error_message_passes_through_transparent() {
        let error = EngineError::from(StoreError::DuplicateJoinCode("XYZ789".into()));
        assert_eq!(
            error.to_string(),
            "join code \"XYZ789\" already belongs to an active session"
        );
    }
}
