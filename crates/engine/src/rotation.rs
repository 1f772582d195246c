//! Vacation-aware round-robin rotation over the duty roster.
//!
//! Position `1` is the currently serving participant and position `2` is the
//! designated next holder, snapshotted at the previous advance. An advance
//! therefore prefers the available participant at position 2 and falls back
//! to the lowest available position. Vacationing participants are skipped as
//! candidates but shifted like everyone else, so their queue depth survives
//! the vacation.

use std::collections::HashMap;

use chrono::NaiveDate;
use rota_core::UserId;
use rota_store::{RosterStore, VacationStore};
use tracing::debug;

/// The roster position of the designated next duty holder.
const NEXT_UP_POSITION: u32 = 2;

/// Select the next duty holder and rotate the roster.
///
/// Returns `None` without mutating when every participant is on vacation on
/// `today` (or the roster is empty). Otherwise the selectee moves to
/// position 1 and all other participants keep their relative order, closing
/// any position gaps a removal left behind. The caller persists the roster.
///
/// This is a pure selection+rotate step: calling it again performs the next
/// hand-off. Once-per-day semantics belong to the scheduler.
pub fn advance(
    roster: &mut RosterStore,
    vacations: &VacationStore,
    today: NaiveDate,
) -> Option<UserId> {
    let available: Vec<(UserId, u32)> = roster
        .iter()
        .filter(|p| !vacations.is_on_vacation(p.id, today))
        .map(|p| (p.id, p.position))
        .collect();

    let (selectee, _) = available
        .iter()
        .find(|(_, pos)| *pos == NEXT_UP_POSITION)
        .or_else(|| available.iter().min_by_key(|(_, pos)| *pos))?;
    let selectee = *selectee;

    // Rotate the position order cyclically so the selectee lands on 1 and
    // everyone else keeps their relative order. For a contiguous roster with
    // the selectee at position 2 this is the classic "1 -> max, others -1"
    // shift; it also holds the permutation invariant for fallback selectees
    // and re-establishes contiguity after removals.
    let mut order: Vec<(UserId, u32)> = roster.iter().map(|p| (p.id, p.position)).collect();
    order.sort_by_key(|(_, pos)| *pos);
    let idx = order.iter().position(|(id, _)| *id == selectee)?;
    order.rotate_left(idx);

    let new_positions: HashMap<UserId, u32> = order
        .iter()
        .enumerate()
        .map(|(i, (id, _))| (*id, i as u32 + 1))
        .collect();
    for p in roster.iter_mut() {
        if let Some(pos) = new_positions.get(&p.id) {
            p.position = *pos;
        }
    }

    debug!(user_id = selectee, "rotation advanced");
    Some(selectee)
}
