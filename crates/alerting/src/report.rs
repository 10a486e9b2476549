//! Exportable session report

use crate::manager::AlertEntry;
use chrono::{DateTime, Utc};
use proctor::Incident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Report export errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Summary of one proctoring session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub incidents: Vec<Incident>,
    /// Incidents per cause label
    pub incident_counts: BTreeMap<String, usize>,
    /// Most recent feed entries, newest first
    pub alerts: Vec<AlertEntry>,
}

impl SessionReport {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Session report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{AlertConfig, AlertManager};
    use chrono::Utc;
    use proctor::{Cause, Incident};

    #[test]
    fn test_report_round_trips_through_file() {
        let now = Utc::now();
        let mut manager = AlertManager::new(AlertConfig::default(), now);
        manager.session_started(now);
        manager.record_incident(
            &Incident {
                cause: Cause::MultipleFaces,
                duration_seconds: 5.2,
                timestamp_ms: 9000,
            },
            now,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        manager.report(now).write_to(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["incidents"][0]["cause"], "Multiple Faces");
        assert_eq!(json["incident_counts"]["Multiple Faces"], 1);
        assert_eq!(json["alerts"][1]["kind"], "info");
    }
}
