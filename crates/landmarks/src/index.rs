//! Landmark index scheme
//!
//! Positions follow the 478-point face mesh (with iris refinement) and the
//! 21-point hand model. The detector addresses landmarks by position only.

/// Face mesh size with iris refinement
pub const FACE_LANDMARK_COUNT: usize = 478;

/// Hand model size
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const NOSE_TIP: usize = 1;

pub const INDEX_FINGER_TIP: usize = 8;

/// Indices of one eye: iris center plus the four corners of its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeIndices {
    pub iris: usize,
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

pub const LEFT_EYE: EyeIndices = EyeIndices {
    iris: 468,
    left: 362,
    right: 263,
    top: 386,
    bottom: 374,
};

pub const RIGHT_EYE: EyeIndices = EyeIndices {
    iris: 473,
    left: 33,
    right: 133,
    top: 159,
    bottom: 145,
};
