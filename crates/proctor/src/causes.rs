//! Violation causes and per-frame aggregation

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cause {
    #[serde(rename = "No Face")]
    NoFace,

    #[serde(rename = "Multiple Faces")]
    MultipleFaces,

    #[serde(rename = "Head Deviation (H)")]
    HeadDeviationH,

    #[serde(rename = "Head Deviation (V)")]
    HeadDeviationV,

    #[serde(rename = "Gaze Shift")]
    GazeShift,

    #[serde(rename = "Hand Proximity")]
    HandProximity,

    /// Perception failure under the fail-closed policy
    #[serde(rename = "Detection Error")]
    DetectionError,
}

impl Cause {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::NoFace => "No Face",
            Cause::MultipleFaces => "Multiple Faces",
            Cause::HeadDeviationH => "Head Deviation (H)",
            Cause::HeadDeviationV => "Head Deviation (V)",
            Cause::GazeShift => "Gaze Shift",
            Cause::HandProximity => "Hand Proximity",
            Cause::DetectionError => "Detection Error",
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered causes of one frame.
///
/// Insertion order is priority order: identity checks first, then pose,
/// gaze, and hand activity. The first entry is the primary cause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CauseSet(Vec<Cause>);

impl CauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cause unless already present
    pub fn push(&mut self, cause: Cause) {
        if !self.0.contains(&cause) {
            self.0.push(cause);
        }
    }

    /// Append every cause of a later check
    pub fn extend(&mut self, causes: impl IntoIterator<Item = Cause>) {
        for cause in causes {
            self.push(cause);
        }
    }

    pub fn primary(&self) -> Option<Cause> {
        self.0.first().copied()
    }

    pub fn contains(&self, cause: Cause) -> bool {
        self.0.contains(&cause)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Cause] {
        &self.0
    }
}

impl FromIterator<Cause> for CauseSet {
    fn from_iter<I: IntoIterator<Item = Cause>>(iter: I) -> Self {
        let mut set = CauseSet::new();
        set.extend(iter);
        set
    }
}
