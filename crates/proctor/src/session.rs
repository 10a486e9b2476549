//! Proctoring session lifecycle
//!
//! Wraps an `AnomalyDetector` together with the perception model that feeds
//! it, and handles the frames the detector cannot judge.

use crate::analysis::{ProctoringStatus, INITIALIZING_TEXT, VIDEO_NOT_READY_TEXT};
use crate::detector::AnomalyDetector;
use crate::ProctorError;
use landmarks::{Frame, LandmarkSource, VideoFrame};
use tracing::{debug, error, info};

/// Session driving one detector from a landmark source
pub struct ProctoringSession<S: LandmarkSource> {
    source: S,
    detector: AnomalyDetector,
    initialized: bool,
}

impl<S: LandmarkSource> ProctoringSession<S> {
    pub fn new(source: S, detector: AnomalyDetector) -> Self {
        Self {
            source,
            detector,
            initialized: false,
        }
    }

    /// Acquire the perception model. Does nothing when already initialized.
    pub async fn initialize(&mut self) -> Result<(), ProctorError> {
        if self.initialized {
            return Ok(());
        }

        self.source.load().await.map_err(|e| {
            error!("Failed to initialize landmark source: {}", e);
            ProctorError::Source(e)
        })?;

        self.initialized = true;
        info!("Proctoring session initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run perception and rules on one video frame.
    ///
    /// `timestamp_ms` drives persistence tracking, whatever the source
    /// stamped on the landmarks it returned.
    pub fn process_frame(&mut self, frame: &VideoFrame, timestamp_ms: u64) -> ProctoringStatus {
        if !self.initialized {
            return ProctoringStatus::neutral(INITIALIZING_TEXT);
        }

        if !frame.is_decodable() {
            debug!(
                "Skipping undecodable frame {} ({}x{})",
                frame.sequence, frame.width, frame.height
            );
            return ProctoringStatus::neutral(VIDEO_NOT_READY_TEXT);
        }

        match self.source.detect(frame, timestamp_ms) {
            Ok(landmarks) => self.detector.process(&Frame {
                timestamp_ms,
                ..landmarks
            }),
            Err(e) => self.detector.process_failure(timestamp_ms, &e.to_string()),
        }
    }

    /// Seconds spent in the current incident, or 0
    pub fn anomaly_duration(&self) -> f64 {
        self.detector.anomaly_duration()
    }

    /// Start monitoring afresh
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Release the perception model; `initialize` must be called again
    pub fn destroy(&mut self) {
        if self.initialized {
            self.source.close();
            self.initialized = false;
            info!("Proctoring session destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::causes::Cause;
    use crate::config::RuleConfig;
    use crate::incident::MemorySink;
    use landmarks::synthetic::SyntheticFace;
    use landmarks::LandmarkError;
    use std::sync::Arc;

    /// Source returning a scripted result per sequence number
    struct ScriptedSource {
        loads: usize,
        closed: bool,
        fail_load: bool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                loads: 0,
                closed: false,
                fail_load: false,
            }
        }
    }

    impl LandmarkSource for ScriptedSource {
        async fn load(&mut self) -> Result<(), LandmarkError> {
            if self.fail_load {
                return Err(LandmarkError::Detection("model fetch failed".into()));
            }
            self.loads += 1;
            Ok(())
        }

        fn detect(&mut self, frame: &VideoFrame, timestamp_ms: u64) -> Result<Frame, LandmarkError> {
            match frame.sequence {
                0 => Ok(Frame::new(vec![SyntheticFace::centered().build()], vec![], timestamp_ms)),
                1 => Ok(Frame::empty(timestamp_ms)),
                _ => Err(LandmarkError::Detection("glitch".into())),
            }
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    /// Source that leaves every frame stamped at zero
    struct UnstampedSource;

    impl LandmarkSource for UnstampedSource {
        async fn load(&mut self) -> Result<(), LandmarkError> {
            Ok(())
        }

        fn detect(&mut self, _frame: &VideoFrame, _timestamp_ms: u64) -> Result<Frame, LandmarkError> {
            Ok(Frame::empty(0))
        }

        fn close(&mut self) {}
    }

    fn session() -> ProctoringSession<ScriptedSource> {
        let detector = AnomalyDetector::new(RuleConfig::default()).unwrap();
        ProctoringSession::new(ScriptedSource::new(), detector)
    }

    #[test]
    fn test_uninitialized_is_neutral() {
        let mut session = session();
        let status = session.process_frame(&VideoFrame::blank(4, 4, 1), 0);
        assert!(!status.is_anomalous);
        assert!(status.causes.is_empty());
        assert_eq!(status.status_text, "STATUS: Initializing...");
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let mut session = session();
        session.initialize().await.unwrap();
        session.initialize().await.unwrap();
        assert!(session.is_initialized());
        assert_eq!(session.source.loads, 1);
    }

    #[tokio::test]
    async fn test_initialize_failure_reported() {
        let mut session = session();
        session.source.fail_load = true;
        assert!(matches!(session.initialize().await, Err(ProctorError::Source(_))));
        assert!(!session.is_initialized());
    }

    #[tokio::test]
    async fn test_undecodable_frame_leaves_state() {
        let mut session = session();
        session.initialize().await.unwrap();

        session.process_frame(&VideoFrame::blank(4, 4, 1), 0);
        let before = session.detector().state();

        let status = session.process_frame(&VideoFrame::new(vec![], 0, 0, 1), 3000);
        assert_eq!(status.status_text, "STATUS: Video not ready");
        assert!(!status.is_anomalous);
        assert_eq!(session.detector().state(), before);
    }

    #[tokio::test]
    async fn test_frames_flow_through_detector() {
        let mut session = session();
        session.initialize().await.unwrap();

        let status = session.process_frame(&VideoFrame::blank(4, 4, 0), 0);
        assert!(!status.is_anomalous);

        let status = session.process_frame(&VideoFrame::blank(4, 4, 1), 100);
        assert_eq!(status.primary_cause(), Some(Cause::NoFace));

        session.process_frame(&VideoFrame::blank(4, 4, 1), 1600);
        assert_eq!(session.anomaly_duration(), 1.5);

        let status = session.process_frame(&VideoFrame::blank(4, 4, 7), 1700);
        assert_eq!(status.status_text, "STATUS: Detection error");
        assert_eq!(session.anomaly_duration(), 0.0);
    }

    #[tokio::test]
    async fn test_caller_timestamp_drives_persistence() {
        let sink = Arc::new(MemorySink::new());
        let detector = AnomalyDetector::new(RuleConfig::default())
            .unwrap()
            .with_sink(sink.clone());
        let mut session = ProctoringSession::new(UnstampedSource, detector);
        session.initialize().await.unwrap();

        let video = VideoFrame::blank(4, 4, 0);
        for t in (0..5000).step_by(500) {
            assert!(!session.process_frame(&video, t).is_critical);
        }
        assert_eq!(session.anomaly_duration(), 4.5);

        let status = session.process_frame(&video, 5000);
        assert!(status.is_critical);
        assert_eq!(status.status_text, "CRITICAL: No Face");
        assert_eq!(sink.incidents().len(), 1);
        assert_eq!(sink.incidents()[0].timestamp_ms, 5000);
    }

    #[tokio::test]
    async fn test_destroy_releases_source() {
        let mut session = session();
        session.initialize().await.unwrap();
        session.destroy();
        assert!(session.source.closed);
        assert!(!session.is_initialized());

        let status = session.process_frame(&VideoFrame::blank(4, 4, 0), 0);
        assert_eq!(status.status_text, "STATUS: Initializing...");
    }
}
