//! Frame and landmark types

use serde::{Deserialize, Serialize};

/// Point normalized to [0, 1] of frame width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Frame center (0.5, 0.5)
    pub const fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }
}

/// Landmarks of one detected face, ordered by the model's anatomical index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks(pub Vec<LandmarkPoint>);

impl FaceLandmarks {
    /// Point at a model index, if the set is long enough
    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Landmarks of one detected hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub points: Vec<LandmarkPoint>,
    /// Detection confidence (0-1)
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

impl HandLandmarks {
    pub fn new(points: Vec<LandmarkPoint>, confidence: f32) -> Self {
        Self { points, confidence }
    }

    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }
}

/// Perception output for one detection cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub faces: Vec<FaceLandmarks>,
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
    /// Frame timestamp (milliseconds, monotonic)
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl Frame {
    pub fn new(faces: Vec<FaceLandmarks>, hands: Vec<HandLandmarks>, timestamp_ms: u64) -> Self {
        Self {
            faces,
            hands,
            timestamp_ms,
        }
    }

    /// Frame with nothing detected
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }
}

/// Decoded RGB video frame handed to the perception model
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// Black frame of the given size
    pub fn blank(width: u32, height: u32, sequence: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self::new(vec![0; len], width, height, sequence)
    }

    /// Whether the frame carries a full pixel buffer
    pub fn is_decodable(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == self.width as usize * self.height as usize * 3
    }
}
