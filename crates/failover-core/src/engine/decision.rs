//! Failover policy
//!
//! Pure evaluation of a [`ServiceState`] against the configured targets.
//! The engine runs this under its lock and acts on the returned verdict;
//! nothing here performs I/O.
//!
//! Policy, in order:
//! 1. Frozen state is held.
//! 2. A switch within `cooldown_seconds` of the previous one is held.
//! 3. Target 1 wins when it is up and its up-streak meets `up_threshold`.
//!    Target 2 is considered only while target 1 is down, with the same
//!    streak rule. If neither qualifies the published value is kept.
//!
//! Down reports take effect at once because they clear the target's
//! up-streak; only recovery is gated by `up_threshold`. `down_threshold`
//! is carried in state but not consulted here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

use crate::model::{ServiceState, TargetId, Targets};

/// Why a decision did not recompute the desired target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum HoldReason {
    /// Operator freeze is active
    Frozen,
    /// The previous switch happened too recently
    Cooldown {
        /// Seconds left before another switch is allowed
        remaining_secs: u64,
    },
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldReason::Frozen => f.write_str("frozen"),
            HoldReason::Cooldown { remaining_secs } => {
                write!(f, "cooldown, {}s remaining", remaining_secs)
            }
        }
    }
}

/// Result of evaluating the policy once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No recomputation took place
    Hold(HoldReason),
    /// The desired target is already published
    Keep,
    /// DNS should move to this address
    Switch(IpAddr),
}

/// Whether `target` has enough consecutive up reports to be published
pub fn is_eligible(state: &ServiceState, target: TargetId) -> bool {
    state.is_up(target)
        && (state.up_threshold <= 1 || state.up_streak(target) >= state.up_threshold)
}

/// Target the policy would publish, ignoring freeze and cooldown
///
/// `None` means neither target qualifies and the current value is kept.
pub fn desired_target(state: &ServiceState) -> Option<TargetId> {
    if is_eligible(state, TargetId::Target1) {
        Some(TargetId::Target1)
    } else if !state.target1_up && is_eligible(state, TargetId::Target2) {
        Some(TargetId::Target2)
    } else {
        None
    }
}

/// Seconds left in the cooldown window, or `None` when switching is allowed
pub fn cooldown_remaining(state: &ServiceState, now: DateTime<Utc>) -> Option<u64> {
    if state.cooldown_seconds == 0 {
        return None;
    }

    let last = state.last_switch_at?;
    let elapsed = now.signed_duration_since(last).num_seconds().max(0) as u64;

    if elapsed < state.cooldown_seconds {
        Some(state.cooldown_seconds - elapsed)
    } else {
        None
    }
}

/// Evaluate the failover policy
pub fn evaluate(state: &ServiceState, targets: &Targets, now: DateTime<Utc>) -> Verdict {
    if state.freeze {
        return Verdict::Hold(HoldReason::Frozen);
    }

    if let Some(remaining_secs) = cooldown_remaining(state, now) {
        return Verdict::Hold(HoldReason::Cooldown { remaining_secs });
    }

    match desired_target(state).map(|target| targets.ip(target)) {
        Some(desired) if desired != state.current_target => Verdict::Switch(desired),
        _ => Verdict::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health;
    use chrono::Duration;

    fn targets() -> Targets {
        Targets::new("192.0.2.1".parse().unwrap(), "192.0.2.2".parse().unwrap())
    }

    fn state() -> ServiceState {
        ServiceState::initial(targets().target1, 60)
    }

    #[test]
    fn healthy_primary_is_kept() {
        let state = state();
        assert_eq!(evaluate(&state, &targets(), Utc::now()), Verdict::Keep);
    }

    #[test]
    fn primary_down_moves_to_fallback() {
        let mut state = state();
        health::report(&mut state, TargetId::Target1, false);
        assert_eq!(
            evaluate(&state, &targets(), Utc::now()),
            Verdict::Switch(targets().target2)
        );
    }

    #[test]
    fn both_down_keeps_current() {
        let mut state = state();
        health::report(&mut state, TargetId::Target1, false);
        health::report(&mut state, TargetId::Target2, false);
        assert_eq!(evaluate(&state, &targets(), Utc::now()), Verdict::Keep);
    }

    #[test]
    fn recovery_waits_for_up_threshold() {
        let mut state = state();
        state.up_threshold = 3;
        state.current_target = targets().target2;
        health::report(&mut state, TargetId::Target1, false);

        health::report(&mut state, TargetId::Target1, true);
        health::report(&mut state, TargetId::Target1, true);
        assert_eq!(desired_target(&state), None);
        assert_eq!(evaluate(&state, &targets(), Utc::now()), Verdict::Keep);

        health::report(&mut state, TargetId::Target1, true);
        assert_eq!(
            evaluate(&state, &targets(), Utc::now()),
            Verdict::Switch(targets().target1)
        );
    }

    #[test]
    fn fallback_needs_primary_down() {
        let mut state = state();
        state.up_threshold = 2;
        state.current_target = targets().target2;
        health::report(&mut state, TargetId::Target2, true);
        health::report(&mut state, TargetId::Target2, true);
        health::report(&mut state, TargetId::Target1, true);

        // Target 1 is up but not yet eligible; target 2 is not considered.
        assert_eq!(desired_target(&state), None);
    }

    #[test]
    fn down_threshold_is_ignored() {
        let mut state = state();
        state.down_threshold = 5;
        health::report(&mut state, TargetId::Target1, false);
        assert_eq!(desired_target(&state), Some(TargetId::Target2));
    }

    #[test]
    fn freeze_holds_before_anything_else() {
        let mut state = state();
        state.freeze = true;
        health::report(&mut state, TargetId::Target1, false);
        assert_eq!(
            evaluate(&state, &targets(), Utc::now()),
            Verdict::Hold(HoldReason::Frozen)
        );
    }

    #[test]
    fn cooldown_window() {
        let now = Utc::now();
        let mut state = state();
        state.cooldown_seconds = 300;
        state.last_switch_at = Some(now - Duration::seconds(100));
        health::report(&mut state, TargetId::Target1, false);

        assert_eq!(
            evaluate(&state, &targets(), now),
            Verdict::Hold(HoldReason::Cooldown { remaining_secs: 200 })
        );
        assert_eq!(
            evaluate(&state, &targets(), now + Duration::seconds(200)),
            Verdict::Switch(targets().target2)
        );
    }

    #[test]
    fn cooldown_without_previous_switch_is_open() {
        let mut state = state();
        state.cooldown_seconds = 300;
        assert_eq!(cooldown_remaining(&state, Utc::now()), None);
    }
}
