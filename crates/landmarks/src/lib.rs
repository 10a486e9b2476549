//! Landmark Model for Proctoring
//!
//! Geometry handed over by the external perception model, once per frame:
//! - Normalized 2D points for faces and hands
//! - The versioned landmark index scheme the detector relies on
//! - The `LandmarkSource` boundary and a replay source for recordings

pub mod frame;
pub mod index;
pub mod replay;
pub mod synthetic;

pub use frame::{FaceLandmarks, Frame, HandLandmarks, LandmarkPoint, VideoFrame};
pub use replay::ReplaySource;

use std::future::Future;
use thiserror::Error;

/// Landmark source error types
#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("Landmark model not loaded")]
    NotLoaded,

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Recording I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recording parse error on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Perception model that turns a video frame into landmark sets.
///
/// Implementations own the model handle. `load` may suspend while the model
/// is fetched; `detect` is synchronous and is called once per frame with a
/// monotonically increasing timestamp.
pub trait LandmarkSource {
    /// Acquire the underlying model. Called at most once per session start.
    fn load(&mut self) -> impl Future<Output = Result<(), LandmarkError>>;

    /// Run detection on one video frame
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: u64) -> Result<Frame, LandmarkError>;

    /// Release the model handle
    fn close(&mut self);
}
