//! Health state tracking
//!
//! Applies one resolved heartbeat to the service state: sets the target's
//! up/down flag and advances its streak counters. An up report increments
//! the up streak and clears the down streak; a down report does the
//! reverse, so at most one of the two counters is non-zero per target.
//!
//! Callers must hold the engine lock; the tracker only ever sees a
//! resolved boolean, never a raw request body.

use crate::model::{ServiceState, TargetId};

/// Apply a heartbeat for `target`
pub fn report(state: &mut ServiceState, target: TargetId, is_up: bool) {
    let (flag, up_streak, down_streak) = match target {
        TargetId::Target1 => (
            &mut state.target1_up,
            &mut state.s1_up_streak,
            &mut state.s1_down_streak,
        ),
        TargetId::Target2 => (
            &mut state.target2_up,
            &mut state.s2_up_streak,
            &mut state.s2_down_streak,
        ),
    };

    *flag = is_up;
    if is_up {
        *up_streak = up_streak.saturating_add(1);
        *down_streak = 0;
    } else {
        *down_streak = down_streak.saturating_add(1);
        *up_streak = 0;
    }
}
