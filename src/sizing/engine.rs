use tracing::debug;

use crate::domain::{Direction, SizingState};

/// Advance the streak for a new signal and return the order quantity.
///
/// Same direction as the last signal grows the streak by one; anything else
/// (reversal, or no prior direction) restarts it at one. Quantity is
/// `streak * multiplier`. The multiplier is validated upstream.
pub fn compute_quantity(state: &mut SizingState, direction: Direction, multiplier: u32) -> u64 {
    if state.last_direction == Some(direction) {
        state.streak_count = state.streak_count.saturating_add(1);
    } else {
        state.last_direction = Some(direction);
        state.streak_count = 1;
    }

    let qty = u64::from(state.streak_count) * u64::from(multiplier);
    debug!(
        direction = %direction,
        streak = state.streak_count,
        multiplier,
        qty,
        "sized signal"
    );
    qty
}
