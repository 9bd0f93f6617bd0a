//! Continuous-anomaly-streak detector
//!
//! Decides, for each freshly ingested sample, whether a cradle just crossed
//! the threshold of 6 contiguous anomalous samples for the first time in the
//! current run. All state is re-derived from a bounded newest-first window on
//! every call, so the module holds nothing between invocations and performs
//! no I/O.
//!
//! Window layout: element 0 is the sample just inserted, elements 1..6 are
//! the prior samples, element 6 (when present) is the one sample beyond the
//! streak length. A fire requires elements 0..6 all anomalous and element 6
//! absent or clear; a still-anomalous element 6 means the streak already
//! fired on an earlier sample.

use serde::{Deserialize, Serialize};

/// Contiguous anomalous samples required before a notification fires.
pub const STREAK_LEN: usize = 6;

/// Samples fetched per evaluation: the streak plus one look-behind sample.
pub const WINDOW_LEN: usize = STREAK_LEN + 1;

/// Anomaly flags of a single sample, newest-first in the evaluation window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFlags {
    pub overall: bool,
    pub temperature: bool,
    pub humidity: bool,
    pub motion: bool,
    pub noise: bool,
}

/// Outcome of evaluating one freshly inserted sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreakDecision {
    /// Nothing to do: sample not anomalous, streak too short, streak broken,
    /// or the streak already fired on a previous sample.
    NoAction,
    /// The streak crossed the threshold on this exact sample.
    Fire { issues: Vec<&'static str> },
}

/// Per-cradle streak state, re-derived from the window on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakState {
    /// Latest sample non-anomalous, or no history at all.
    Normal,
    /// 1 to 5 contiguous anomalies ending at the latest sample.
    Streaking,
    /// 6 or more contiguous anomalies; the notification for this run has
    /// already fired.
    Notified,
}

/// Evaluate a newest-first window of up to [`WINDOW_LEN`] samples.
///
/// `window[0]` must be the sample that was just persisted. Returns
/// [`StreakDecision::Fire`] exactly once per contiguous anomalous run.
pub fn evaluate(window: &[SampleFlags]) -> StreakDecision {
    let Some(newest) = window.first() else {
        return StreakDecision::NoAction;
    };

    // Only an anomalous sample can complete a streak.
    if !newest.overall {
        return StreakDecision::NoAction;
    }

    // Insufficient history to confirm a full streak.
    if window.len() < STREAK_LEN {
        return StreakDecision::NoAction;
    }

    // The newest STREAK_LEN samples must all be anomalous.
    if !window[..STREAK_LEN].iter().all(|s| s.overall) {
        return StreakDecision::NoAction;
    }

    // A still-anomalous sample beyond the streak means the transition
    // already fired on an earlier insert.
    if window.get(STREAK_LEN).is_some_and(|s| s.overall) {
        return StreakDecision::NoAction;
    }

    StreakDecision::Fire {
        issues: issue_labels(newest),
    }
}

/// Classify the current streak state from a newest-first window.
///
/// Used by the status read surface; never triggers side effects.
pub fn streak_state(window: &[SampleFlags]) -> StreakState {
    let run = window.iter().take_while(|s| s.overall).count();
    match run {
        0 => StreakState::Normal,
        n if n < STREAK_LEN => StreakState::Streaking,
        _ => StreakState::Notified,
    }
}

/// Human-readable issue labels derived from a sample's sub-flags.
///
/// Falls back to a single generic label when the overall flag was raised
/// without any specific sub-flag.
pub fn issue_labels(flags: &SampleFlags) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if flags.temperature {
        issues.push("Temperature");
    }
    if flags.humidity {
        issues.push("Humidity");
    }
    if flags.motion {
        issues.push("Motion");
    }
    if flags.noise {
        issues.push("Noise");
    }
    if issues.is_empty() {
        issues.push("General Anomaly");
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomalous() -> SampleFlags {
        SampleFlags {
            overall: true,
            ..Default::default()
        }
    }

    fn clear() -> SampleFlags {
        SampleFlags::default()
    }

    fn window(overall: &[bool]) -> Vec<SampleFlags> {
        overall
            .iter()
            .map(|&o| SampleFlags {
                overall: o,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn empty_window_no_action() {
        assert_eq!(evaluate(&[]), StreakDecision::NoAction);
    }

    #[test]
    fn non_anomalous_newest_never_fires() {
        // Even with a fully anomalous tail behind it.
        let w = window(&[false, true, true, true, true, true, true]);
        assert_eq!(evaluate(&w), StreakDecision::NoAction);
    }

    #[test]
    fn short_history_no_action() {
        for len in 1..STREAK_LEN {
            let w = vec![anomalous(); len];
            assert_eq!(evaluate(&w), StreakDecision::NoAction, "len {}", len);
        }
    }

    #[test]
    fn exactly_six_anomalies_fires() {
        let w = vec![anomalous(); STREAK_LEN];
        assert!(matches!(evaluate(&w), StreakDecision::Fire { .. }));
    }

    #[test]
    fn six_anomalies_with_clear_seventh_fires() {
        let mut w = vec![anomalous(); STREAK_LEN];
        w.push(clear());
        assert!(matches!(evaluate(&w), StreakDecision::Fire { .. }));
    }

    #[test]
    fn seven_anomalies_suppressed() {
        // The transition fired on the previous sample already.
        let w = vec![anomalous(); WINDOW_LEN];
        assert_eq!(evaluate(&w), StreakDecision::NoAction);
    }

    #[test]
    fn broken_streak_no_action() {
        let mut w = vec![anomalous(); STREAK_LEN];
        w[3] = clear();
        assert_eq!(evaluate(&w), StreakDecision::NoAction);
    }

    #[test]
    fn issues_from_sub_flags_in_order() {
        let newest = SampleFlags {
            overall: true,
            temperature: true,
            noise: true,
            ..Default::default()
        };
        let mut w = vec![newest];
        w.extend(vec![anomalous(); STREAK_LEN - 1]);

        match evaluate(&w) {
            StreakDecision::Fire { issues } => {
                assert_eq!(issues, vec!["Temperature", "Noise"]);
            }
            other => panic!("expected Fire, got {:?}", other),
        }
    }

    #[test]
    fn issues_fall_back_to_general_anomaly() {
        assert_eq!(issue_labels(&anomalous()), vec!["General Anomaly"]);
    }

    #[test]
    fn issue_labels_full_order() {
        let flags = SampleFlags {
            overall: true,
            temperature: true,
            humidity: true,
            motion: true,
            noise: true,
        };
        assert_eq!(
            issue_labels(&flags),
            vec!["Temperature", "Humidity", "Motion", "Noise"]
        );
    }

    #[test]
    fn streak_state_classification() {
        assert_eq!(streak_state(&[]), StreakState::Normal);
        assert_eq!(streak_state(&window(&[false, true, true])), StreakState::Normal);
        assert_eq!(streak_state(&window(&[true])), StreakState::Streaking);
        assert_eq!(streak_state(&vec![anomalous(); 5]), StreakState::Streaking);
        assert_eq!(streak_state(&vec![anomalous(); 6]), StreakState::Notified);
        assert_eq!(streak_state(&vec![anomalous(); 9]), StreakState::Notified);
    }

    /// Feeds a sample sequence through the detector the way the ingest path
    /// does: newest-first window of at most WINDOW_LEN after each insert.
    fn run_sequence(sequence: &[bool]) -> Vec<bool> {
        let mut stored: Vec<SampleFlags> = Vec::new();
        let mut fired = Vec::new();

        for &overall in sequence {
            stored.push(SampleFlags {
                overall,
                ..Default::default()
            });
            let w: Vec<SampleFlags> =
                stored.iter().rev().take(WINDOW_LEN).copied().collect();
            fired.push(matches!(evaluate(&w), StreakDecision::Fire { .. }));
        }
        fired
    }

    #[test]
    fn end_to_end_fires_exactly_once_per_streak() {
        // Samples 1-5 anomalous: nothing. Sample 6: fire. Sample 7: nothing.
        // Sample 8 clear: reset. Sample 9 anomalous: count restarts at 1.
        let fired = run_sequence(&[
            true, true, true, true, true, // 1-5
            true,  // 6 -> fire
            true,  // 7 -> suppressed
            false, // 8 -> reset
            true,  // 9 -> streak of 1
        ]);
        assert_eq!(
            fired,
            vec![false, false, false, false, false, true, false, false, false]
        );
    }

    #[test]
    fn second_streak_fires_again_after_reset() {
        let mut sequence = vec![true; 7];
        sequence.push(false);
        sequence.extend(vec![true; 6]);

        let fired = run_sequence(&sequence);
        assert_eq!(fired.iter().filter(|&&f| f).count(), 2);
        assert!(fired[5], "first streak fires at its 6th sample");
        assert!(fired[13], "second streak fires at its 6th sample");
    }
}
