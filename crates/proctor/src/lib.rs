//! Proctoring Anomaly Detection
//!
//! Real-time exam integrity analysis from face and hand landmarks:
//! - Face presence and multiple-face detection
//! - Head deviation from frame center
//! - Per-eye gaze deviation
//! - Hand proximity to the upper frame region
//! - Debounced escalation of sustained violations into incidents

pub mod analysis;
pub mod causes;
pub mod config;
pub mod detector;
pub mod features;
pub mod incident;
pub mod rules;
pub mod session;
pub mod state;

pub use analysis::{DebugScores, ProctoringStatus};
pub use causes::{Cause, CauseSet};
pub use config::{ConfigError, FailurePolicy, RuleConfig};
pub use detector::AnomalyDetector;
pub use incident::{Incident, IncidentSink, MemorySink};
pub use rules::{FrameEvaluation, RuleEvaluator};
pub use session::ProctoringSession;
pub use state::{PersistenceState, Transition};

use landmarks::LandmarkError;
use thiserror::Error;

/// Proctoring error types
#[derive(Error, Debug)]
pub enum ProctorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Landmark source error: {0}")]
    Source(#[from] LandmarkError),
}
