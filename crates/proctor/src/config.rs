//! Rule configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid rule configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a non-negative number or infinity, got {value}")]
    InvalidThreshold { field: &'static str, value: f32 },

    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("persistence_ms must be greater than zero")]
    ZeroPersistence,
}

/// What a perception failure counts as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Frame produces no causes
    #[default]
    FailOpen,
    /// Frame produces the `Detection Error` cause
    FailClosed,
}

/// Rule thresholds. A threshold of 0 or infinity disables its check.
///
/// Every threshold must be present when deserialized; only the failure
/// policy falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Max horizontal nose offset from frame center (normalized)
    pub head_deviation_h: f32,

    /// Max vertical nose offset from frame center (normalized)
    pub head_deviation_v: f32,

    /// Max horizontal iris offset as a fraction of eye width
    pub gaze_deviation_h: f32,

    /// Max vertical iris offset as a fraction of eye height
    pub gaze_deviation_v: f32,

    /// Fingertips above this fraction of frame height are flagged
    pub hand_proximity_y: f32,

    /// Continuous time a primary cause must hold before it is critical
    pub persistence_ms: u64,

    /// Hands below this confidence are ignored
    pub min_hand_confidence: f32,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            head_deviation_h: 0.12,
            head_deviation_v: 0.15,
            gaze_deviation_h: 0.18,
            gaze_deviation_v: 0.25,
            hand_proximity_y: 0.75,
            persistence_ms: 5000,
            min_hand_confidence: 0.5,
            failure_policy: FailurePolicy::FailOpen,
        }
    }
}

impl RuleConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            head_deviation_h: 0.08,
            head_deviation_v: 0.10,
            gaze_deviation_h: 0.12,
            gaze_deviation_v: 0.18,
            persistence_ms: 3000,
            failure_policy: FailurePolicy::FailClosed,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            head_deviation_h: 0.18,
            head_deviation_v: 0.22,
            gaze_deviation_h: 0.25,
            gaze_deviation_v: 0.35,
            hand_proximity_y: 0.6,
            persistence_ms: 10_000,
            ..Default::default()
        }
    }

    /// Reject partial or nonsensical configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        threshold("head_deviation_h", self.head_deviation_h)?;
        threshold("head_deviation_v", self.head_deviation_v)?;
        threshold("gaze_deviation_h", self.gaze_deviation_h)?;
        threshold("gaze_deviation_v", self.gaze_deviation_v)?;
        threshold("hand_proximity_y", self.hand_proximity_y)?;

        if self.hand_proximity_y.is_finite() {
            in_unit_range("hand_proximity_y", self.hand_proximity_y)?;
        }
        in_unit_range("min_hand_confidence", self.min_hand_confidence)?;

        if self.persistence_ms == 0 {
            return Err(ConfigError::ZeroPersistence);
        }
        Ok(())
    }
}

/// Whether a threshold enables its check
pub(crate) fn is_active(threshold: f32) -> bool {
    threshold > 0.0 && threshold.is_finite()
}

fn threshold(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_nan() || value < 0.0 {
        return Err(ConfigError::InvalidThreshold { field, value });
    }
    Ok(())
}

fn in_unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(RuleConfig::default().validate().is_ok());
        assert!(RuleConfig::strict().validate().is_ok());
        assert!(RuleConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let config = RuleConfig {
            gaze_deviation_v: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { field: "gaze_deviation_v", .. })
        ));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = RuleConfig {
            head_deviation_h: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_thresholds_accepted() {
        let config = RuleConfig {
            head_deviation_h: f32::INFINITY,
            head_deviation_v: 0.0,
            hand_proximity_y: f32::INFINITY,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(!is_active(config.head_deviation_h));
        assert!(!is_active(config.head_deviation_v));
        assert!(is_active(config.gaze_deviation_h));
    }

    #[test]
    fn test_hand_range_and_persistence() {
        let config = RuleConfig {
            hand_proximity_y: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));

        let config = RuleConfig {
            persistence_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPersistence));
    }

    #[test]
    fn test_missing_threshold_rejected() {
        let partial = serde_json::from_str::<RuleConfig>(r#"{"persistence_ms": 8000}"#);
        assert!(partial.is_err());
    }

    #[test]
    fn test_failure_policy_defaults_to_fail_open() {
        let mut value = serde_json::to_value(RuleConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("failure_policy");
        let config: RuleConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::FailOpen);

        let closed: FailurePolicy = serde_json::from_str(r#""fail_closed""#).unwrap();
        assert_eq!(closed, FailurePolicy::FailClosed);
    }
}
