//! Anomaly persistence tracking
//!
//! Debounces frame-level causes into incidents. A primary cause must hold
//! continuously for the configured duration before it becomes critical; a
//! different primary cause starts a new incident.

use crate::causes::Cause;
use serde::{Deserialize, Serialize};

/// Persistence state of the current incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PersistenceState {
    #[default]
    Normal,

    /// Primary cause seen since `since_ms`, not yet critical
    Tracking { cause: Cause, since_ms: u64 },

    /// Primary cause held past the persistence duration
    Critical { cause: Cause, since_ms: u64 },
}

/// Edge taken by one `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Normal to Tracking
    Started,
    /// Primary cause changed; timer restarted under the new cause
    Restarted,
    /// Tracking to Critical, taken once per incident
    Escalated,
    /// Back to Normal
    Cleared,
}

impl PersistenceState {
    /// Advance with the frame's primary cause at `now_ms`
    pub fn step(self, primary: Option<Cause>, now_ms: u64, persistence_ms: u64) -> (Self, Transition) {
        let Some(primary) = primary else {
            let transition = if self == PersistenceState::Normal {
                Transition::Unchanged
            } else {
                Transition::Cleared
            };
            return (PersistenceState::Normal, transition);
        };

        match self {
            PersistenceState::Normal => (
                PersistenceState::Tracking {
                    cause: primary,
                    since_ms: now_ms,
                },
                Transition::Started,
            ),
            PersistenceState::Tracking { cause, .. } | PersistenceState::Critical { cause, .. }
                if cause != primary =>
            {
                (
                    PersistenceState::Tracking {
                        cause: primary,
                        since_ms: now_ms,
                    },
                    Transition::Restarted,
                )
            }
            PersistenceState::Tracking { cause, since_ms } => {
                if now_ms.saturating_sub(since_ms) >= persistence_ms {
                    (PersistenceState::Critical { cause, since_ms }, Transition::Escalated)
                } else {
                    (self, Transition::Unchanged)
                }
            }
            PersistenceState::Critical { .. } => (self, Transition::Unchanged),
        }
    }

    pub fn cause(&self) -> Option<Cause> {
        match self {
            PersistenceState::Normal => None,
            PersistenceState::Tracking { cause, .. } | PersistenceState::Critical { cause, .. } => {
                Some(*cause)
            }
        }
    }

    pub fn since_ms(&self) -> Option<u64> {
        match self {
            PersistenceState::Normal => None,
            PersistenceState::Tracking { since_ms, .. }
            | PersistenceState::Critical { since_ms, .. } => Some(*since_ms),
        }
    }

    /// Time spent in the current incident; 0 when normal or if time ran backwards
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.since_ms()
            .map(|since| now_ms.saturating_sub(since))
            .unwrap_or(0)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, PersistenceState::Critical { .. })
    }
}
