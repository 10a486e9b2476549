//! Replay of recorded landmark streams
//!
//! A recording is a JSON-lines file with one `Frame` per line. Each video
//! frame handed to `detect` selects the recorded frame at its sequence number.

use crate::frame::{Frame, VideoFrame};
use crate::{LandmarkError, LandmarkSource};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Landmark source backed by a recording
pub struct ReplaySource {
    path: Option<PathBuf>,
    frames: Vec<Frame>,
    loaded: bool,
}

impl ReplaySource {
    /// Source that reads its recording from disk on `load`
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            frames: Vec::new(),
            loaded: false,
        }
    }

    /// Source over frames already in memory
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            path: None,
            frames,
            loaded: false,
        }
    }

    /// Parse a JSON-lines recording. Blank lines are skipped.
    pub fn parse(content: &str) -> Result<Vec<Frame>, LandmarkError> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|source| LandmarkError::Parse {
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }

    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl LandmarkSource for ReplaySource {
    async fn load(&mut self) -> Result<(), LandmarkError> {
        if let Some(path) = &self.path {
            info!("Loading landmark recording from {}", path.display());
            let content = tokio::fs::read_to_string(path).await?;
            self.frames = Self::parse(&content)?;
        }
        info!("Replay source ready with {} frames", self.frames.len());
        self.loaded = true;
        Ok(())
    }

    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: u64) -> Result<Frame, LandmarkError> {
        if !self.loaded {
            return Err(LandmarkError::NotLoaded);
        }

        let recorded = self.frames.get(frame.sequence as usize).ok_or_else(|| {
            LandmarkError::Detection(format!(
                "sequence {} beyond recording of {} frames",
                frame.sequence,
                self.frames.len()
            ))
        })?;

        debug!(
            "Replaying frame {} ({} faces, {} hands)",
            frame.sequence,
            recorded.faces.len(),
            recorded.hands.len()
        );

        Ok(Frame {
            timestamp_ms,
            ..recorded.clone()
        })
    }

    fn close(&mut self) {
        self.loaded = false;
        if self.path.is_some() {
            self.frames.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{self, SyntheticFace};
    use std::io::Write;

    fn recording() -> String {
        let frames = [
            Frame::new(vec![SyntheticFace::centered().build()], vec![], 0),
            Frame::empty(33),
            Frame::new(vec![], vec![synthetic::hand(0.5, 0.4, 0.9)], 66),
        ];
        frames
            .iter()
            .map(|f| serde_json::to_string(f).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_parse_reports_line() {
        let err = ReplaySource::parse("{}\n\nnot json").unwrap_err();
        assert!(matches!(err, LandmarkError::Parse { line: 3, .. }));
    }

    #[tokio::test]
    async fn test_detect_requires_load() {
        let mut source = ReplaySource::from_frames(vec![Frame::empty(0)]);
        let video = VideoFrame::blank(2, 2, 0);
        assert!(matches!(source.detect(&video, 0), Err(LandmarkError::NotLoaded)));

        source.load().await.unwrap();
        assert!(source.detect(&video, 0).is_ok());
    }

    #[tokio::test]
    async fn test_missing_recording_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ReplaySource::from_path(dir.path().join("absent.jsonl"));
        assert!(matches!(source.load().await, Err(LandmarkError::Io(_))));
        assert!(!source.is_loaded());
    }

    #[tokio::test]
    async fn test_replay_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(recording().as_bytes()).unwrap();

        let mut source = ReplaySource::from_path(file.path());
        source.load().await.unwrap();
        assert_eq!(source.len(), 3);

        let frame = source.detect(&VideoFrame::blank(2, 2, 2), 500).unwrap();
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.timestamp_ms, 500);

        let missing = source.detect(&VideoFrame::blank(2, 2, 3), 533);
        assert!(matches!(missing, Err(LandmarkError::Detection(_))));

        source.close();
        assert!(!source.is_loaded());
        assert!(source.is_empty());
    }
}
