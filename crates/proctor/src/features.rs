//! Geometric feature extraction
//!
//! All measures are computed in normalized coordinates so they do not
//! depend on camera resolution. Gaze is normalized by the eye's own box,
//! which also removes the subject's distance from the camera.

use landmarks::index::{self, EyeIndices};
use landmarks::{FaceLandmarks, HandLandmarks, LandmarkPoint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Eye boxes narrower or shorter than this are treated as collapsed
pub const MIN_EYE_EXTENT: f32 = 1e-6;

/// Geometry that cannot produce a measure
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("Degenerate eye box ({width} x {height})")]
    DegenerateEyeBox { width: f32, height: f32 },

    #[error("Landmark {0} missing from set")]
    MissingLandmark(usize),
}

/// Nose-tip offset from frame center
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadOffset {
    pub horizontal: f32,
    pub vertical: f32,
}

/// Iris displacement from eye-box center, relative to box size
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeRatio {
    pub horizontal: f32,
    pub vertical: f32,
}

/// Measures taken from one face
#[derive(Debug, Clone, Default)]
pub struct FaceFeatures {
    pub head: Option<HeadOffset>,
    pub left_gaze: Option<GazeRatio>,
    pub right_gaze: Option<GazeRatio>,
}

fn point(face: &FaceLandmarks, idx: usize) -> Result<LandmarkPoint, GeometryError> {
    face.point(idx).ok_or(GeometryError::MissingLandmark(idx))
}

/// Head deviation of the nose tip from (0.5, 0.5)
pub fn head_offset(face: &FaceLandmarks) -> Result<HeadOffset, GeometryError> {
    let nose = point(face, index::NOSE_TIP)?;
    let center = LandmarkPoint::center();
    Ok(HeadOffset {
        horizontal: (nose.x - center.x).abs(),
        vertical: (nose.y - center.y).abs(),
    })
}

/// Gaze ratio of one eye
pub fn gaze_ratio(face: &FaceLandmarks, eye: &EyeIndices) -> Result<GazeRatio, GeometryError> {
    let iris = point(face, eye.iris)?;
    let left = point(face, eye.left)?;
    let right = point(face, eye.right)?;
    let top = point(face, eye.top)?;
    let bottom = point(face, eye.bottom)?;

    let width = (left.x - right.x).abs();
    let height = (top.y - bottom.y).abs();
    if width < MIN_EYE_EXTENT || height < MIN_EYE_EXTENT {
        return Err(GeometryError::DegenerateEyeBox { width, height });
    }

    let center_x = (left.x + right.x) / 2.0;
    let center_y = (top.y + bottom.y) / 2.0;

    Ok(GazeRatio {
        horizontal: (iris.x - center_x).abs() / width,
        vertical: (iris.y - center_y).abs() / height,
    })
}

/// Vertical position of the index fingertip
pub fn fingertip_y(hand: &HandLandmarks) -> Option<f32> {
    hand.point(index::INDEX_FINGER_TIP).map(|p| p.y)
}

/// Extract head and gaze measures from one face.
///
/// A measure whose geometry is unusable is left as `None`; the other
/// measures are still taken.
pub fn extract_face(face: &FaceLandmarks) -> FaceFeatures {
    FaceFeatures {
        head: head_offset(face).ok(),
        left_gaze: gaze_ratio(face, &index::LEFT_EYE).ok(),
        right_gaze: gaze_ratio(face, &index::RIGHT_EYE).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use landmarks::synthetic::{self, SyntheticFace};

    #[test]
    fn test_centered_head_has_no_offset() {
        let face = SyntheticFace::centered().build();
        let offset = head_offset(&face).unwrap();
        assert_eq!(offset, HeadOffset::default());
    }

    #[test]
    fn test_head_offset_is_absolute() {
        let face = SyntheticFace::centered().nose(0.3, 0.7).build();
        let offset = head_offset(&face).unwrap();
        assert!((offset.horizontal - 0.2).abs() < 1e-6);
        assert!((offset.vertical - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_centered_iris_has_zero_ratio() {
        let face = SyntheticFace::centered().eye_size(0.08, 0.02).build();
        let ratio = gaze_ratio(&face, &index::LEFT_EYE).unwrap();
        assert!(ratio.horizontal < 1e-4);
        assert!(ratio.vertical < 1e-4);
    }

    #[test]
    fn test_ratio_independent_of_eye_size() {
        let small = SyntheticFace::centered().eye_size(0.03, 0.015).gaze(0.3, 0.2).build();
        let large = SyntheticFace::centered().eye_size(0.09, 0.045).gaze(0.3, 0.2).build();

        let a = gaze_ratio(&small, &index::RIGHT_EYE).unwrap();
        let b = gaze_ratio(&large, &index::RIGHT_EYE).unwrap();
        assert!((a.horizontal - 0.3).abs() < 1e-3);
        assert!((a.horizontal - b.horizontal).abs() < 1e-3);
        assert!((a.vertical - b.vertical).abs() < 1e-3);
    }

    #[test]
    fn test_collapsed_eye_is_degenerate() {
        let face = SyntheticFace::centered().collapse_left_eye().build();
        assert!(matches!(
            gaze_ratio(&face, &index::LEFT_EYE),
            Err(GeometryError::DegenerateEyeBox { .. })
        ));

        let features = extract_face(&face);
        assert!(features.left_gaze.is_none());
        assert!(features.right_gaze.is_some());
        assert!(features.head.is_some());

        let features = extract_face(&SyntheticFace::centered().collapse_right_eye().build());
        assert!(features.left_gaze.is_some());
        assert!(features.right_gaze.is_none());
    }

    #[test]
    fn test_short_set_reports_missing_landmark() {
        let face = FaceLandmarks(vec![LandmarkPoint::center(); 10]);
        assert!(head_offset(&face).is_ok());
        assert_eq!(
            gaze_ratio(&face, &index::LEFT_EYE),
            Err(GeometryError::MissingLandmark(index::LEFT_EYE.iris))
        );
    }

    #[test]
    fn test_fingertip() {
        let hand = synthetic::hand(0.5, 0.42, 1.0);
        assert_eq!(fingertip_y(&hand), Some(0.42));
        assert_eq!(fingertip_y(&HandLandmarks::new(vec![], 1.0)), None);
    }
}
