//! Proctoring status reporting

use crate::causes::{Cause, CauseSet};
use crate::state::PersistenceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Debug score keys
pub mod keys {
    pub const HEAD_COUNT: &str = "head_count";
    pub const HAND_COUNT: &str = "hand_count";
    pub const HEAD_OFFSET_H: &str = "head_offset_h_pct";
    pub const HEAD_OFFSET_V: &str = "head_offset_v_pct";
    pub const LEFT_GAZE_H: &str = "left_gaze_h_pct";
    pub const LEFT_GAZE_V: &str = "left_gaze_v_pct";
    pub const RIGHT_GAZE_H: &str = "right_gaze_h_pct";
    pub const RIGHT_GAZE_V: &str = "right_gaze_v_pct";
    pub const HAND_Y: &str = "hand_y_pct";
    pub const ANOMALY_DURATION: &str = "anomaly_duration_s";
}

pub const SAFE_TEXT: &str = "Monitoring (Safe)";
pub const INITIALIZING_TEXT: &str = "STATUS: Initializing...";
pub const VIDEO_NOT_READY_TEXT: &str = "STATUS: Video not ready";
pub const DETECTION_ERROR_TEXT: &str = "STATUS: Detection error";

/// Named scalars exposed for inspection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugScores(BTreeMap<String, f64>);

impl DebugScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    /// Store a normalized measure in percent
    pub fn set_pct(&mut self, key: &str, value: f32) {
        self.set(key, f64::from(value) * 100.0);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// Result of one processed frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringStatus {
    /// Any cause present this frame
    pub is_anomalous: bool,

    /// Primary cause held past the persistence duration
    pub is_critical: bool,

    /// Causes in priority order
    pub causes: CauseSet,

    pub status_text: String,

    pub debug_scores: DebugScores,
}

impl ProctoringStatus {
    /// Non-anomalous status with an explanatory text
    pub fn neutral(text: &str) -> Self {
        Self {
            status_text: text.to_string(),
            ..Default::default()
        }
    }

    /// Build the status for a frame whose persistence state has been updated
    pub fn report(
        causes: CauseSet,
        state: &PersistenceState,
        now_ms: u64,
        mut debug_scores: DebugScores,
    ) -> Self {
        let status_text = match state {
            PersistenceState::Normal => SAFE_TEXT.to_string(),
            PersistenceState::Tracking { cause, .. } => {
                let elapsed = state.elapsed_ms(now_ms) as f64 / 1000.0;
                debug_scores.set(keys::ANOMALY_DURATION, elapsed);
                format!("WARNING: {} ({:.1}s)", cause, elapsed)
            }
            PersistenceState::Critical { cause, .. } => {
                debug_scores.set(keys::ANOMALY_DURATION, state.elapsed_ms(now_ms) as f64 / 1000.0);
                format!("CRITICAL: {}", cause)
            }
        };

        Self {
            is_anomalous: !causes.is_empty(),
            is_critical: state.is_critical() && !causes.is_empty(),
            causes,
            status_text,
            debug_scores,
        }
    }

    /// Highest-priority cause, if any
    pub fn primary_cause(&self) -> Option<Cause> {
        self.causes.primary()
    }
}
