//! Rule evaluation
//!
//! Stateless checks run in a fixed order each frame:
//! 1. Face count (gates head and gaze checks)
//! 2. Head deviation, per axis
//! 3. Gaze deviation, either eye, either axis
//! 4. Hand proximity, independent of the face checks

use crate::analysis::{keys, DebugScores};
use crate::causes::{Cause, CauseSet};
use crate::config::{is_active, RuleConfig};
use crate::features::{self, FaceFeatures, GazeRatio, HeadOffset};
use landmarks::{FaceLandmarks, Frame, HandLandmarks};
use tracing::debug;

/// Causes and scores of one frame
#[derive(Debug, Clone, Default)]
pub struct FrameEvaluation {
    pub causes: CauseSet,
    pub scores: DebugScores,
}

/// Applies `RuleConfig` thresholds to landmark geometry
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    config: RuleConfig,
}

impl RuleEvaluator {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate every rule against one frame
    pub fn evaluate(&self, frame: &Frame) -> FrameEvaluation {
        let mut scores = DebugScores::new();
        scores.set(keys::HEAD_COUNT, frame.faces.len() as f64);
        scores.set(keys::HAND_COUNT, frame.hands.len() as f64);

        let mut causes = CauseSet::new();
        causes.extend(self.check_faces(&frame.faces, &mut scores));
        causes.extend(self.check_hands(&frame.hands, &mut scores));

        debug!(
            "Frame {} evaluated: {} faces, {} hands, causes {:?}",
            frame.timestamp_ms,
            frame.faces.len(),
            frame.hands.len(),
            causes.as_slice()
        );

        FrameEvaluation { causes, scores }
    }

    fn check_faces(&self, faces: &[FaceLandmarks], scores: &mut DebugScores) -> Vec<Cause> {
        match faces {
            [] => vec![Cause::NoFace],
            [face] => {
                let features = features::extract_face(face);
                record_face(&features, scores);

                let mut causes = self.check_head(features.head);
                if self.check_gaze(&features) {
                    causes.push(Cause::GazeShift);
                }
                causes
            }
            _ => vec![Cause::MultipleFaces],
        }
    }

    fn check_head(&self, head: Option<HeadOffset>) -> Vec<Cause> {
        let Some(head) = head else {
            return Vec::new();
        };

        let mut causes = Vec::new();
        if exceeds(head.horizontal, self.config.head_deviation_h) {
            causes.push(Cause::HeadDeviationH);
        }
        if exceeds(head.vertical, self.config.head_deviation_v) {
            causes.push(Cause::HeadDeviationV);
        }
        causes
    }

    fn check_gaze(&self, features: &FaceFeatures) -> bool {
        let deviating = |ratio: Option<GazeRatio>| {
            ratio.is_some_and(|r| {
                exceeds(r.horizontal, self.config.gaze_deviation_h)
                    || exceeds(r.vertical, self.config.gaze_deviation_v)
            })
        };
        deviating(features.left_gaze) || deviating(features.right_gaze)
    }

    fn check_hands(&self, hands: &[HandLandmarks], scores: &mut DebugScores) -> Option<Cause> {
        if !is_active(self.config.hand_proximity_y) {
            return None;
        }

        let flagged = hands
            .iter()
            .filter(|hand| hand.confidence >= self.config.min_hand_confidence)
            .filter_map(features::fingertip_y)
            .find(|&y| y < self.config.hand_proximity_y)?;

        scores.set_pct(keys::HAND_Y, flagged);
        Some(Cause::HandProximity)
    }
}

fn exceeds(value: f32, threshold: f32) -> bool {
    is_active(threshold) && value > threshold
}

fn record_face(features: &FaceFeatures, scores: &mut DebugScores) {
    if let Some(head) = features.head {
        scores.set_pct(keys::HEAD_OFFSET_H, head.horizontal);
        scores.set_pct(keys::HEAD_OFFSET_V, head.vertical);
    }
    if let Some(gaze) = features.left_gaze {
        scores.set_pct(keys::LEFT_GAZE_H, gaze.horizontal);
        scores.set_pct(keys::LEFT_GAZE_V, gaze.vertical);
    }
    if let Some(gaze) = features.right_gaze {
        scores.set_pct(keys::RIGHT_GAZE_H, gaze.horizontal);
        scores.set_pct(keys::RIGHT_GAZE_V, gaze.vertical);
    }
}
