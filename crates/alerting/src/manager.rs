//! Alert Manager Implementation

use crate::report::SessionReport;
use chrono::{DateTime, Duration, Utc};
use proctor::{Cause, Incident};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, info};
use uuid::Uuid;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Entries kept in the feed (default: 10)
    pub max_recent: usize,
    /// Minimum gap between warnings for the same cause (seconds)
    pub warning_cooldown_seconds: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            max_recent: 10,
            warning_cooldown_seconds: 10,
        }
    }
}

/// Kind of feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Critical,
}

/// One entry of the alert feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub time: DateTime<Utc>,
    pub kind: AlertKind,
    pub message: String,
}

/// Alert feed and incident bookkeeping for one proctoring session
pub struct AlertManager {
    config: AlertConfig,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    /// Newest first
    recent: VecDeque<AlertEntry>,
    last_warning: HashMap<Cause, DateTime<Utc>>,
    incidents: Vec<Incident>,
    incident_counts: BTreeMap<String, usize>,
}

impl AlertManager {
    /// Create a manager for a session starting at `now`
    pub fn new(config: AlertConfig, now: DateTime<Utc>) -> Self {
        let session_id = Uuid::new_v4();
        info!("Creating alert manager for session {} with config: {:?}", session_id, config);
        Self {
            config,
            session_id,
            started_at: now,
            recent: VecDeque::new(),
            last_warning: HashMap::new(),
            incidents: Vec::new(),
            incident_counts: BTreeMap::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn session_started(&mut self, now: DateTime<Utc>) {
        self.started_at = now;
        self.push(AlertKind::Info, "Proctoring session started".to_string(), now);
    }

    pub fn session_ended(&mut self, now: DateTime<Utc>) {
        self.push(AlertKind::Info, "Proctoring session ended".to_string(), now);
    }

    /// Add a warning for a newly observed cause.
    ///
    /// Returns false when the same cause was warned about within the cooldown.
    pub fn warn(&mut self, cause: Cause, now: DateTime<Utc>) -> bool {
        let cooldown = Duration::seconds(self.config.warning_cooldown_seconds);
        if let Some(last) = self.last_warning.get(&cause) {
            if now - *last < cooldown {
                debug!("Warning suppressed: {} in cooldown period", cause);
                return false;
            }
        }

        self.last_warning.insert(cause, now);
        self.push(AlertKind::Warning, format!("{} detected", cause), now);
        true
    }

    /// Record an escalated incident
    pub fn record_incident(&mut self, incident: &Incident, now: DateTime<Utc>) {
        let count = self
            .incident_counts
            .entry(incident.cause.as_str().to_string())
            .or_insert(0);
        *count += 1;
        let count = *count;

        self.incidents.push(*incident);
        self.push(
            AlertKind::Critical,
            format!(
                "{} sustained for {:.1}s (count: {})",
                incident.cause, incident.duration_seconds, count
            ),
            now,
        );
        info!("Incident recorded: {} (count: {})", incident.cause, count);
    }

    fn push(&mut self, kind: AlertKind, message: String, time: DateTime<Utc>) {
        self.recent.push_front(AlertEntry { time, kind, message });
        self.recent.truncate(self.config.max_recent);
    }

    /// Feed entries, newest first
    pub fn recent(&self) -> impl Iterator<Item = &AlertEntry> {
        self.recent.iter()
    }

    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }

    /// Snapshot of the session for export
    pub fn report(&self, now: DateTime<Utc>) -> SessionReport {
        SessionReport {
            session_id: self.session_id,
            started_at: self.started_at,
            duration_seconds: (now - self.started_at).num_milliseconds().max(0) as f64 / 1000.0,
            incidents: self.incidents.clone(),
            incident_counts: self.incident_counts.clone(),
            alerts: self.recent.iter().cloned().collect(),
        }
    }
}
