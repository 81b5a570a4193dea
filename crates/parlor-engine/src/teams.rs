//! Team formation: the pure splitting and validation rules.
//!
//! Nothing here touches storage. The lifecycle layer loads the roster,
//! calls these functions to decide the shape of the teams, and then
//! persists the result; keeping the rules pure makes them trivially
//! testable with a seeded random source.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use parlor_model::{Player, PlayerId, SessionId};

use crate::error::EngineError;

/// One requested team in a custom formation: a name and exactly the
/// players the host wants on it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TeamAssignment {
    pub name: String,
    pub player_ids: Vec<PlayerId>,
}

/// Splits `players` into `team_count` random groups.
///
/// Sizes differ by at most one: with `p` players and `n` teams, the
/// first `p % n` groups get `ceil(p / n)` members and the rest get
/// `floor(p / n)`. Every player lands in exactly one group.
///
/// # Errors
/// [`EngineError::InvalidTeamCount`] when `team_count` is zero or
/// exceeds the player count.
pub fn split_into_teams<R: Rng + ?Sized>(
    players: &[PlayerId],
    team_count: usize,
    rng: &mut R,
) -> Result<Vec<Vec<PlayerId>>, EngineError> {
    if team_count == 0 || team_count > players.len() {
        return Err(EngineError::InvalidTeamCount {
            requested: team_count,
            players: players.len(),
        });
    }

    let mut shuffled = players.to_vec();
    shuffled.shuffle(rng);

    let base = players.len() / team_count;
    let extras = players.len() % team_count;

    let mut teams = Vec::with_capacity(team_count);
    let mut offset = 0;
    for index in 0..team_count {
        let size = base + usize::from(index < extras);
        teams.push(shuffled[offset..offset + size].to_vec());
        offset += size;
    }
    Ok(teams)
}

/// Checks a custom formation against the roster before anything is
/// written: every referenced player must be on the roster, and no
/// player may appear twice (across teams or within one).
///
/// # Errors
/// - [`EngineError::UnknownPlayer`] for a reference off the roster
/// - [`EngineError::OverlappingAssignment`] for a repeated player
pub fn check_assignments(
    session_id: SessionId,
    roster: &[Player],
    assignments: &[TeamAssignment],
) -> Result<(), EngineError> {
    let on_roster: HashSet<PlayerId> = roster.iter().map(|p| p.id).collect();
    let mut seen = HashSet::new();

    for assignment in assignments {
        for &player_id in &assignment.player_ids {
            if !on_roster.contains(&player_id) {
                return Err(EngineError::UnknownPlayer {
                    player_id,
                    session_id,
                });
            }
            if !seen.insert(player_id) {
                return Err(EngineError::OverlappingAssignment(player_id));
            }
        }
    }
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parlor_model::PlayerRole;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn pids(ids: std::ops::Range<u64>) -> Vec<PlayerId> {
        ids.map(PlayerId).collect()
    }

    fn roster_of(ids: &[PlayerId]) -> Vec<Player> {
        let now = Utc::now();
        ids.iter()
            .map(|id| Player {
                id: *id,
                name: format!("player {id}"),
                role: PlayerRole::Participant,
                session_id: Some(SessionId(1)),
                team_id: None,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    // =====================================================================
    // split_into_teams
    // =====================================================================

    #[test]
    fn test_split_balances_sizes_within_one() {
        // 7 players over 3 teams: 7 % 3 = 1 team of ceil(7/3) = 3,
        // then two teams of floor(7/3) = 2.
        let teams = split_into_teams(&pids(1..8), 3, &mut rng(1)).unwrap();
        let sizes: Vec<usize> = teams.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 2]);
    }

    #[test]
    fn test_split_three_players_two_teams_is_two_then_one() {
        let teams = split_into_teams(&pids(1..4), 2, &mut rng(1)).unwrap();
        let sizes: Vec<usize> = teams.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[test]
    fn test_split_even_division_gives_equal_teams() {
        let teams = split_into_teams(&pids(1..9), 4, &mut rng(1)).unwrap();
        let sizes: Vec<usize> = teams.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_split_one_team_per_player_gives_singletons() {
        let teams = split_into_teams(&pids(1..5), 4, &mut rng(1)).unwrap();
        assert!(teams.iter().all(|team| team.len() == 1));
    }

    #[test]
    fn test_split_places_every_player_exactly_once() {
        let players = pids(1..12);
        let teams = split_into_teams(&players, 4, &mut rng(9)).unwrap();

        let mut placed: Vec<PlayerId> = teams.into_iter().flatten().collect();
        placed.sort();
        assert_eq!(placed, players);
    }

    #[test]
    fn test_split_zero_teams_is_rejected() {
        let result = split_into_teams(&pids(1..4), 0, &mut rng(1));
        assert!(matches!(
            result,
            Err(EngineError::InvalidTeamCount {
                requested: 0,
                players: 3
            })
        ));
    }

    #[test]
    fn test_split_more_teams_than_players_is_rejected() {
        let result = split_into_teams(&pids(1..4), 5, &mut rng(1));
        assert!(matches!(
            result,
            Err(EngineError::InvalidTeamCount {
                requested: 5,
                players: 3
            })
        ));
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let players = pids(1..10);
        let first = split_into_teams(&players, 3, &mut rng(42)).unwrap();
        let second = split_into_teams(&players, 3, &mut rng(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_actually_shuffles() {
        // With 9 players, at least one seed must produce a grouping
        // that differs from the input order; if every seed returned
        // the players unshuffled, formation would not be random at all.
        let players = pids(1..10);
        let in_order: Vec<Vec<PlayerId>> = vec![pids(1..4), pids(4..7), pids(7..10)];
        let any_shuffled = (0..20).any(|seed| {
            split_into_teams(&players, 3, &mut rng(seed)).unwrap() != in_order
        });
        assert!(any_shuffled);
    }

    // =====================================================================
    // check_assignments
    // =====================================================================

    #[test]
    fn test_check_accepts_a_clean_partition() {
        let roster = roster_of(&pids(1..5));
        let assignments = vec![
            TeamAssignment {
                name: "Reds".into(),
                player_ids: vec![pid(1), pid(2)],
            },
            TeamAssignment {
                name: "Blues".into(),
                player_ids: vec![pid(3), pid(4)],
            },
        ];

        assert!(check_assignments(SessionId(1), &roster, &assignments).is_ok());
    }

    #[test]
    fn test_check_accepts_partial_coverage() {
        // Leaving rostered players off every team is allowed; they just
        // play unaffiliated.
        let roster = roster_of(&pids(1..5));
        let assignments = vec![TeamAssignment {
            name: "Only team".into(),
            player_ids: vec![pid(1)],
        }];

        assert!(check_assignments(SessionId(1), &roster, &assignments).is_ok());
    }

    #[test]
    fn test_check_rejects_player_off_the_roster() {
        let roster = roster_of(&pids(1..3));
        let assignments = vec![TeamAssignment {
            name: "Reds".into(),
            player_ids: vec![pid(1), pid(99)],
        }];

        let result = check_assignments(SessionId(1), &roster, &assignments);
        assert!(matches!(
            result,
            Err(EngineError::UnknownPlayer { player_id, session_id })
                if player_id == pid(99) && session_id == SessionId(1)
        ));
    }

    #[test]
    fn test_check_rejects_player_in_two_teams() {
        let roster = roster_of(&pids(1..4));
        let assignments = vec![
            TeamAssignment {
                name: "Reds".into(),
                player_ids: vec![pid(1), pid(2)],
            },
            TeamAssignment {
                name: "Blues".into(),
                player_ids: vec![pid(2), pid(3)],
            },
        ];

        let result = check_assignments(SessionId(1), &roster, &assignments);
        assert!(matches!(
            result,
            Err(EngineError::OverlappingAssignment(p)) if p == pid(2)
        ));
    }

    #[test]
    fn test_check_rejects_player_twice_in_one_team() {
        let roster = roster_of(&pids(1..3));
        let assignments = vec![TeamAssignment {
            name: "Reds".into(),
            player_ids: vec![pid(1), pid(1)],
        }];

        let result = check_assignments(SessionId(1), &roster, &assignments);
        assert!(matches!(
            result,
            Err(EngineError::OverlappingAssignment(p)) if p == pid(1)
        ));
    }

    #[test]
    fn test_check_accepts_empty_assignment_list() {
        // Replacing all teams with none is a legal (if unusual) request.
        let roster = roster_of(&pids(1..3));
        assert!(check_assignments(SessionId(1), &roster, &[]).is_ok());
    }
}
