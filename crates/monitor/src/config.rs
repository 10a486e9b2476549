//! Monitor configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `PROCTOR__SECTION__KEY` environment variables.

use alerting::AlertConfig;
use config::{Config, Environment, File};
use incident_log::IncidentLogConfig;
use proctor::RuleConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub rules: RuleConfig,
    pub alerts: AlertConfig,
    /// JSON-lines landmark recording to replay
    pub recording_path: PathBuf,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Detection loop period (milliseconds)
    pub detection_interval_ms: u64,
    /// Observation loop period (milliseconds)
    pub observation_interval_ms: u64,
    pub report_path: Option<PathBuf>,
    pub incident_log: Option<IncidentLogConfig>,
    /// Prometheus scrape address
    pub metrics_addr: Option<SocketAddr>,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            rules: RuleConfig::default(),
            alerts: AlertConfig::default(),
            recording_path: PathBuf::from("recording.jsonl"),
            frame_width: 640,
            frame_height: 480,
            detection_interval_ms: 33,
            observation_interval_ms: 1000,
            report_path: None,
            incident_log: None,
            metrics_addr: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl MonitorConfig {
    /// Load configuration, reading `path` when given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix("PROCTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Loop periods and frame size must be usable
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.detection_interval_ms > 0, "detection_interval_ms must be positive");
        anyhow::ensure!(self.observation_interval_ms > 0, "observation_interval_ms must be positive");
        anyhow::ensure!(
            self.frame_width > 0 && self.frame_height > 0,
            "frame size must be positive"
        );
        anyhow::ensure!(
            self.log_level.parse::<Level>().is_ok(),
            "unknown log_level {:?}",
            self.log_level
        );
        self.rules.validate()?;
        Ok(())
    }
}
