//! Alerting System
//!
//! Provides the session alert feed, warning deduplication, and session reports.

mod manager;
mod report;

pub use manager::{AlertConfig, AlertEntry, AlertKind, AlertManager};
pub use report::{ReportError, SessionReport};

use chrono::Utc;
use proctor::{Cause, Incident, IncidentSink};
use std::sync::Mutex;
use tracing::warn;

/// Alert manager shared between the frame loop and the observer
pub struct AlertLog {
    manager: Mutex<AlertManager>,
}

impl AlertLog {
    pub fn new(manager: AlertManager) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    /// Run `f` with the manager locked
    pub fn with<R>(&self, f: impl FnOnce(&mut AlertManager) -> R) -> Option<R> {
        match self.manager.lock() {
            Ok(mut guard) => Some(f(&mut guard)),
            Err(_) => {
                warn!("Alert manager lock poisoned");
                None
            }
        }
    }

    pub fn warn(&self, cause: Cause) -> bool {
        self.with(|m| m.warn(cause, Utc::now())).unwrap_or(false)
    }

    pub fn session_report(&self) -> Option<SessionReport> {
        self.with(|m| m.report(Utc::now()))
    }
}

impl IncidentSink for AlertLog {
    fn report(&self, incident: &Incident) {
        self.with(|m| m.record_incident(incident, Utc::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_records_incidents() {
        let log = AlertLog::new(AlertManager::new(AlertConfig::default(), Utc::now()));
        log.report(&Incident {
            cause: Cause::HandProximity,
            duration_seconds: 5.0,
            timestamp_ms: 5000,
        });
        assert_eq!(log.with(|m| m.incident_count()), Some(1));
        assert_eq!(log.session_report().unwrap().incidents.len(), 1);
    }
}
