//! Synthetic landmark sets
//!
//! Full-size face and hand sets with controllable geometry, for recordings,
//! demos and tests.

use crate::frame::{FaceLandmarks, HandLandmarks, LandmarkPoint};
use crate::index::{self, EyeIndices};

/// Builder for a face mesh with axis-aligned eye boxes
#[derive(Debug, Clone)]
pub struct SyntheticFace {
    nose: LandmarkPoint,
    eye_width: f32,
    eye_height: f32,
    /// Iris displacement as a fraction of eye width/height
    left_iris: (f32, f32),
    right_iris: (f32, f32),
    collapsed_left: bool,
    collapsed_right: bool,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            nose: LandmarkPoint::center(),
            eye_width: 0.06,
            eye_height: 0.03,
            left_iris: (0.0, 0.0),
            right_iris: (0.0, 0.0),
            collapsed_left: false,
            collapsed_right: false,
        }
    }
}

impl SyntheticFace {
    /// Face looking straight into the camera from the frame center
    pub fn centered() -> Self {
        Self::default()
    }

    pub fn nose(mut self, x: f32, y: f32) -> Self {
        self.nose = LandmarkPoint::new(x, y);
        self
    }

    pub fn eye_size(mut self, width: f32, height: f32) -> Self {
        self.eye_width = width;
        self.eye_height = height;
        self
    }

    /// Shift both irises by the given fraction of the eye box
    pub fn gaze(mut self, dx: f32, dy: f32) -> Self {
        self.left_iris = (dx, dy);
        self.right_iris = (dx, dy);
        self
    }

    pub fn left_gaze(mut self, dx: f32, dy: f32) -> Self {
        self.left_iris = (dx, dy);
        self
    }

    pub fn right_gaze(mut self, dx: f32, dy: f32) -> Self {
        self.right_iris = (dx, dy);
        self
    }

    /// Collapse the left eye's corners onto one point
    pub fn collapse_left_eye(mut self) -> Self {
        self.collapsed_left = true;
        self
    }

    pub fn collapse_right_eye(mut self) -> Self {
        self.collapsed_right = true;
        self
    }

    pub fn build(&self) -> FaceLandmarks {
        let mut points = vec![self.nose; index::FACE_LANDMARK_COUNT];
        points[index::NOSE_TIP] = self.nose;

        // The subject's left eye appears on the right of the image
        let eye_y = self.nose.y - 0.08;
        let left_center = LandmarkPoint::new(self.nose.x + 0.05, eye_y);
        let right_center = LandmarkPoint::new(self.nose.x - 0.05, eye_y);

        self.place_eye(&mut points, &index::LEFT_EYE, left_center, self.left_iris, self.collapsed_left);
        self.place_eye(&mut points, &index::RIGHT_EYE, right_center, self.right_iris, self.collapsed_right);

        FaceLandmarks(points)
    }

    fn place_eye(
        &self,
        points: &mut [LandmarkPoint],
        eye: &EyeIndices,
        center: LandmarkPoint,
        iris: (f32, f32),
        collapsed: bool,
    ) {
        let (half_w, half_h) = if collapsed {
            (0.0, 0.0)
        } else {
            (self.eye_width / 2.0, self.eye_height / 2.0)
        };

        points[eye.left] = LandmarkPoint::new(center.x - half_w, center.y);
        points[eye.right] = LandmarkPoint::new(center.x + half_w, center.y);
        points[eye.top] = LandmarkPoint::new(center.x, center.y - half_h);
        points[eye.bottom] = LandmarkPoint::new(center.x, center.y + half_h);
        points[eye.iris] = LandmarkPoint::new(
            center.x + iris.0 * self.eye_width,
            center.y + iris.1 * self.eye_height,
        );
    }
}

/// Hand with its index fingertip at the given position
pub fn hand(tip_x: f32, tip_y: f32, confidence: f32) -> HandLandmarks {
    let wrist = LandmarkPoint::new(tip_x, (tip_y + 0.15).min(1.0));
    let mut points = vec![wrist; index::HAND_LANDMARK_COUNT];
    points[index::INDEX_FINGER_TIP] = LandmarkPoint::new(tip_x, tip_y);
    HandLandmarks::new(points, confidence)
}
