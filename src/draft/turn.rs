// Snake-draft turn projection.
//
// A pure function of the configured draft order and the number of committed
// picks. The engine keeps no turn state of its own: every client re-projects
// from the authoritative pick log on each refresh, so there is nothing to
// invalidate and nothing to drift.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// One slot in a game's configured draft order. `pick_order` is dense and
/// 1-indexed; rows are always consumed sorted by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSlot {
    pub parent_id: String,
    pub pick_order: u32,
}

/// Whose turn it is, derived from the pick count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    /// Current round, 1-indexed.
    pub round: u32,
    /// Zero-based position within the round.
    pub position_in_round: usize,
    /// The parent on the clock. `None` when no draft order is configured,
    /// in which case only a commissioner override may insert a pick.
    pub picker: Option<String>,
}

/// Project the current turn from the draft order and the committed pick count.
///
/// Snake alternation: odd rounds walk the order forward, even rounds walk it
/// backward. With `P` parents and `N` committed picks:
/// `round = N / P + 1`, `position = N % P`.
///
/// Total function: an empty order yields `picker: None` (logged as a data
/// integrity warning if picks already exist) rather than an error.
pub fn project(order: &[OrderSlot], pick_count: usize) -> TurnState {
    let parents = order.len();
    if parents == 0 {
        if pick_count > 0 {
            warn!(
                pick_count,
                "draft picks exist but no draft order is configured; no active picker"
            );
        }
        return TurnState {
            round: 1,
            position_in_round: 0,
            picker: None,
        };
    }

    let round = (pick_count / parents) as u32 + 1;
    let position_in_round = pick_count % parents;

    let index = if round % 2 == 0 {
        parents - 1 - position_in_round
    } else {
        position_in_round
    };

    TurnState {
        round,
        position_in_round,
        picker: Some(order[index].parent_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_of(ids: &[&str]) -> Vec<OrderSlot> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| OrderSlot {
                parent_id: id.to_string(),
                pick_order: i as u32 + 1,
            })
            .collect()
    }

    #[test]
    fn snake_order_three_parents() {
        let order = order_of(&["A", "B", "C"]);

        // Round 1: A, B, C
        let expected = ["A", "B", "C", "C", "B", "A", "A"];
        for (picks_so_far, who) in expected.iter().enumerate() {
            let turn = project(&order, picks_so_far);
            assert_eq!(
                turn.picker.as_deref(),
                Some(*who),
                "pick {} should belong to {}",
                picks_so_far + 1,
                who
            );
        }

        assert_eq!(project(&order, 0).round, 1);
        assert_eq!(project(&order, 3).round, 2);
        assert_eq!(project(&order, 6).round, 3);
    }

    #[test]
    fn round_and_position_arithmetic_holds_for_many_sizes() {
        for parents in 1..=8usize {
            let ids: Vec<String> = (0..parents).map(|i| format!("p{i}")).collect();
            let order: Vec<OrderSlot> = ids
                .iter()
                .enumerate()
                .map(|(i, id)| OrderSlot {
                    parent_id: id.clone(),
                    pick_order: i as u32 + 1,
                })
                .collect();

            for picks in 0..parents * 5 {
                let turn = project(&order, picks);
                assert_eq!(turn.round, (picks / parents) as u32 + 1);
                assert_eq!(turn.position_in_round, picks % parents);

                // Alternation: odd rounds forward, even rounds reversed.
                let expected = if turn.round % 2 == 1 {
                    &ids[picks % parents]
                } else {
                    &ids[parents - 1 - picks % parents]
                };
                assert_eq!(turn.picker.as_deref(), Some(expected.as_str()));
            }
        }
    }

    #[test]
    fn adjacent_rounds_reverse_each_other() {
        let order = order_of(&["A", "B", "C", "D"]);
        for round in 0..6usize {
            for pos in 0..4usize {
                let forward = project(&order, round * 2 * 4 + pos);
                let reversed = project(&order, (round * 2 + 1) * 4 + (3 - pos));
                assert_eq!(forward.picker, reversed.picker);
            }
        }
    }

    #[test]
    fn single_parent_always_on_the_clock() {
        let order = order_of(&["solo"]);
        for picks in 0..10 {
            let turn = project(&order, picks);
            assert_eq!(turn.picker.as_deref(), Some("solo"));
            assert_eq!(turn.round, picks as u32 + 1);
            assert_eq!(turn.position_in_round, 0);
        }
    }

    #[test]
    fn empty_order_reports_no_picker() {
        let turn = project(&[], 0);
        assert_eq!(turn.picker, None);
        assert_eq!(turn.round, 1);
    }

    #[test]
    fn empty_order_with_orphaned_picks_degrades_instead_of_panicking() {
        // Data-integrity case: picks exist but the order was never configured.
        let turn = project(&[], 5);
        assert_eq!(turn.picker, None);
    }
}
