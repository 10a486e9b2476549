//! Critical incident boundary

use crate::causes::Cause;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A primary cause that crossed the persistence duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub cause: Cause,
    /// Time the cause had held when it escalated
    pub duration_seconds: f64,
    /// Timestamp of the escalating frame (milliseconds)
    pub timestamp_ms: u64,
}

/// Receiver of escalated incidents.
///
/// Called synchronously from the frame loop, once per escalation. Must not
/// block; delivery failures stay inside the sink.
pub trait IncidentSink: Send + Sync {
    fn report(&self, incident: &Incident);
}

/// Sink that keeps every incident in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    incidents: Mutex<Vec<Incident>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incidents reported so far
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl IncidentSink for MemorySink {
    fn report(&self, incident: &Incident) {
        if let Ok(mut guard) = self.incidents.lock() {
            guard.push(*incident);
        }
    }
}
