// Auto-pick: choose the best legal player for an absent or stalled picker.

use crate::draft::pool::PoolEntry;

/// Pick the best legal candidate from a resolved pool: undrafted, not
/// restricted for the picker the pool was resolved for, highest historical
/// average. Ties keep the first candidate in pool order (alphabetical, since
/// the pool is name-sorted), so the choice is deterministic.
///
/// Returns `None` when no legal candidate exists; the caller decides whether
/// that means "wait" or "error", auto-pick itself never commits anything.
pub fn best_available(pool: &[PoolEntry]) -> Option<&PoolEntry> {
    let mut best: Option<&PoolEntry> = None;
    for entry in pool.iter().filter(|e| !e.drafted && !e.restricted) {
        match best {
            None => best = Some(entry),
            // Strictly greater, so an earlier entry wins its ties.
            Some(current) if entry.average_points > current.average_points => {
                best = Some(entry);
            }
            Some(_) => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::player::{Player, PlayerKind};

    fn entry(id: i64, name: &str, avg: f64, drafted: bool, restricted: bool) -> PoolEntry {
        PoolEntry {
            player: Player {
                id,
                name: name.to_string(),
                kind: PlayerKind::Kid,
                is_active: true,
            },
            restricted,
            drafted,
            average_points: avg,
        }
    }

    #[test]
    fn picks_highest_average() {
        let pool = vec![
            entry(1, "Avery", 2.0, false, false),
            entry(2, "Blake", 7.5, false, false),
            entry(3, "Casey", 4.0, false, false),
        ];
        assert_eq!(best_available(&pool).map(|e| e.player.id), Some(2));
    }

    #[test]
    fn skips_drafted_and_restricted() {
        // The 9.0 candidate is restricted and must never be chosen, even
        // though it outranks everything legal.
        let pool = vec![
            entry(1, "Avery", 9.0, false, true),
            entry(2, "Blake", 6.0, true, false),
            entry(3, "Casey", 3.2, false, false),
        ];
        assert_eq!(best_available(&pool).map(|e| e.player.id), Some(3));
    }

    #[test]
    fn tie_keeps_first_in_pool_order() {
        let pool = vec![
            entry(1, "Avery", 5.0, false, false),
            entry(2, "Blake", 5.0, false, false),
        ];
        assert_eq!(best_available(&pool).map(|e| e.player.id), Some(1));
    }

    #[test]
    fn zero_history_pool_still_yields_a_candidate() {
        let pool = vec![
            entry(1, "Avery", 0.0, false, false),
            entry(2, "Blake", 0.0, false, false),
        ];
        assert_eq!(best_available(&pool).map(|e| e.player.id), Some(1));
    }

    #[test]
    fn no_legal_candidate_is_none() {
        let pool = vec![
            entry(1, "Avery", 5.0, true, false),
            entry(2, "Blake", 5.0, false, true),
        ];
        assert!(best_available(&pool).is_none());
        assert!(best_available(&[]).is_none());
    }
}
