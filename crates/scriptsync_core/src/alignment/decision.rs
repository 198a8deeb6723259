//! Per-chunk accept/retry decision.
//!
//! After a window returns scenes, the controller must decide whether
//! the result can be trusted enough to advance the remaining script.
//! The decision is pure so it can be tested without any service in the
//! loop.

use crate::models::Scene;
use crate::script::find_split_point;

/// What to do with a window's scenes.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutcome {
    /// The last narration was located in the remaining script; keep the
    /// scenes and continue from `remaining`.
    Advance {
        remaining: String,
        consumed: usize,
    },
    /// The narration could not be located and attempts remain; discard
    /// the scenes and ask again.
    Retry,
    /// The narration could not be located and attempts are exhausted;
    /// keep the scenes but leave the script untrimmed.
    DegradedAccept,
    /// No scene carried narration to trim against; keep the scenes and
    /// leave the script untrimmed.
    NothingToTrim,
}

/// Decide how to proceed given the scenes a window produced.
pub fn decide_trim(remaining_script: &str, scenes: &[Scene], retries_left: bool) -> TrimOutcome {
    let last_narration = scenes
        .iter()
        .rev()
        .map(|s| s.narration.trim())
        .find(|n| !n.is_empty());

    let Some(fragment) = last_narration else {
        return TrimOutcome::NothingToTrim;
    };

    match find_split_point(remaining_script, fragment) {
        Some(consumed) => {
            let remaining = remaining_script[consumed..].trim_start().to_string();
            TrimOutcome::Advance {
                remaining,
                consumed,
            }
        }
        None if retries_left => TrimOutcome::Retry,
        None => TrimOutcome::DegradedAccept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(narration: &str) -> Scene {
        Scene {
            scene_number: 1,
            start_time: "00:00:05".to_string(),
            end_time: "00:00:15".to_string(),
            duration_seconds: Some(10.0),
            narration: narration.to_string(),
            status: None,
            skip_reason: None,
        }
    }

    const SCRIPT: &str = "First the river rose over the old stone bridge. \
        Then the mill wheel stopped turning for the first time in years. \
        Finally the valley fell silent under the flood water.";

    #[test]
    fn matched_narration_advances_past_it() {
        let scenes = vec![
            scene("First the river rose over the old stone bridge."),
            scene("Then the mill wheel stopped turning for the first time in years."),
        ];
        match decide_trim(SCRIPT, &scenes, true) {
            TrimOutcome::Advance {
                remaining,
                consumed,
            } => {
                assert!(remaining.starts_with("Finally the valley"));
                assert!(consumed > 0);
            }
            other => panic!("expected Advance, got {other:?}"),
        }
    }

    #[test]
    fn whole_script_consumed_leaves_empty_remainder() {
        let scenes = vec![scene(SCRIPT)];
        match decide_trim(SCRIPT, &scenes, true) {
            TrimOutcome::Advance { remaining, .. } => assert!(remaining.is_empty()),
            other => panic!("expected Advance, got {other:?}"),
        }
    }

    #[test]
    fn trim_uses_last_nonempty_narration() {
        let scenes = vec![
            scene("First the river rose over the old stone bridge."),
            scene("   "),
        ];
        match decide_trim(SCRIPT, &scenes, true) {
            TrimOutcome::Advance { remaining, .. } => {
                assert!(remaining.starts_with("Then the mill wheel"));
            }
            other => panic!("expected Advance, got {other:?}"),
        }
    }

    #[test]
    fn all_empty_narrations_is_nothing_to_trim() {
        let scenes = vec![scene(""), scene("  ")];
        assert_eq!(decide_trim(SCRIPT, &scenes, true), TrimOutcome::NothingToTrim);
        assert_eq!(
            decide_trim(SCRIPT, &scenes, false),
            TrimOutcome::NothingToTrim
        );
    }

    #[test]
    fn unlocatable_narration_retries_then_degrades() {
        let scenes = vec![scene(
            "Completely unrelated sentence about quarterly budget forecasts and staffing.",
        )];
        assert_eq!(decide_trim(SCRIPT, &scenes, true), TrimOutcome::Retry);
        assert_eq!(
            decide_trim(SCRIPT, &scenes, false),
            TrimOutcome::DegradedAccept
        );
    }
}
