//! Typed identifiers for every Parlor entity.
//!
//! Each id is a newtype wrapper around `u64`. Wrapping the primitive buys
//! two things:
//!
//! 1. **Type safety**: a `TeamId` cannot be passed where a `PlayerId` is
//!    expected, even though both are `u64` underneath. Mixing up the two
//!    in a scoring call would silently credit the wrong party otherwise.
//! 2. **Readability**: `fn award(subject: PlayerId)` says more than
//!    `fn award(subject: u64)`.
//!
//! `#[serde(transparent)]` keeps the JSON flat: `SessionId(7)` serializes
//! as `7`, not `{"0":7}`. Clients see plain numbers.
//!
//! Each id also implements `Display` with a short prefix (`S-7`, `P-42`)
//! so log lines stay unambiguous when several id kinds appear together.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a session (one game night).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A unique identifier for a game in the catalog.
///
/// A game here is a playable activity (trivia, charades, a card game),
/// not one run of it. Sessions reference games by id in their playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

/// A unique identifier for a player (host or participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a team within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A unique identifier for one score ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreId(pub u64);

impl fmt::Display for ScoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K-{}", self.0)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_number() {
        // `#[serde(transparent)]` means SessionId(7) → `7`, not `{"0":7}`.
        let json = serde_json::to_string(&SessionId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_session_id_deserializes_from_plain_number() {
        let sid: SessionId = serde_json::from_str("7").unwrap();
        assert_eq!(sid, SessionId(7));
    }

    #[test]
    fn test_id_display_prefixes_are_distinct() {
        assert_eq!(SessionId(1).to_string(), "S-1");
        assert_eq!(GameId(2).to_string(), "G-2");
        assert_eq!(PlayerId(3).to_string(), "P-3");
        assert_eq!(TeamId(4).to_string(), "T-4");
        assert_eq!(ScoreId(5).to_string(), "K-5");
    }

    #[test]
    fn test_player_id_usable_as_hash_map_key() {
        let mut totals = std::collections::HashMap::new();
        totals.insert(PlayerId(9), 12i64);
        assert_eq!(totals[&PlayerId(9)], 12);
    }

    #[test]
    fn test_ids_order_by_inner_value() {
        // Leaderboard tie-breaking relies on id ordering being the
        // numeric creation order.
        assert!(PlayerId(3) < PlayerId(10));
        assert!(TeamId(1) < TeamId(2));
    }
}
