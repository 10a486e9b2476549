//! Frame-by-frame anomaly detector

use crate::analysis::{DebugScores, ProctoringStatus, DETECTION_ERROR_TEXT};
use crate::causes::{Cause, CauseSet};
use crate::config::{FailurePolicy, RuleConfig};
use crate::incident::{Incident, IncidentSink};
use crate::rules::RuleEvaluator;
use crate::state::{PersistenceState, Transition};
use crate::ProctorError;
use landmarks::Frame;
use metrics::{counter, gauge};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the rule evaluator and persistence tracking for one subject.
///
/// Time comes from frame timestamps only, so replaying the same frames
/// yields the same statuses. Not safe to share between concurrent callers.
pub struct AnomalyDetector {
    evaluator: RuleEvaluator,
    state: PersistenceState,
    last_timestamp_ms: Option<u64>,
    sinks: Vec<Arc<dyn IncidentSink>>,
}

impl AnomalyDetector {
    /// Create a detector; invalid configuration is rejected
    pub fn new(config: RuleConfig) -> Result<Self, ProctorError> {
        config.validate()?;
        info!("Creating anomaly detector with config: {:?}", config);
        Ok(Self {
            evaluator: RuleEvaluator::new(config),
            state: PersistenceState::Normal,
            last_timestamp_ms: None,
            sinks: Vec::new(),
        })
    }

    /// Register a receiver for escalated incidents
    pub fn with_sink(mut self, sink: Arc<dyn IncidentSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn IncidentSink>) {
        self.sinks.push(sink);
    }

    pub fn config(&self) -> &RuleConfig {
        self.evaluator.config()
    }

    pub fn state(&self) -> PersistenceState {
        self.state
    }

    /// Evaluate one frame of landmarks and advance persistence tracking
    pub fn process(&mut self, frame: &Frame) -> ProctoringStatus {
        let evaluation = self.evaluator.evaluate(frame);
        self.advance(evaluation.causes, evaluation.scores, frame.timestamp_ms)
    }

    /// Account for a frame whose perception call failed
    pub fn process_failure(&mut self, timestamp_ms: u64, reason: &str) -> ProctoringStatus {
        counter!("proctor_detection_failures_total").increment(1);

        match self.config().failure_policy {
            FailurePolicy::FailOpen => {
                warn!("Detection failed at {} ms, treating frame as clean: {}", timestamp_ms, reason);
                let mut status = self.advance(CauseSet::new(), DebugScores::new(), timestamp_ms);
                status.status_text = DETECTION_ERROR_TEXT.to_string();
                status
            }
            FailurePolicy::FailClosed => {
                warn!("Detection failed at {} ms, counting as anomaly: {}", timestamp_ms, reason);
                let causes: CauseSet = [Cause::DetectionError].into_iter().collect();
                self.advance(causes, DebugScores::new(), timestamp_ms)
            }
        }
    }

    fn advance(&mut self, causes: CauseSet, scores: DebugScores, now_ms: u64) -> ProctoringStatus {
        counter!("proctor_frames_total").increment(1);

        let (next, transition) =
            self.state
                .step(causes.primary(), now_ms, self.config().persistence_ms);
        self.state = next;
        self.last_timestamp_ms = Some(now_ms);

        match transition {
            Transition::Started | Transition::Restarted => {
                info!("Anomaly tracking started: {:?} at {} ms", next.cause(), now_ms);
            }
            Transition::Escalated => self.escalate(now_ms),
            Transition::Cleared => debug!("Anomaly cleared at {} ms", now_ms),
            Transition::Unchanged => {}
        }

        gauge!("proctor_anomaly_seconds").set(self.anomaly_duration());
        ProctoringStatus::report(causes, &self.state, now_ms, scores)
    }

    fn escalate(&self, now_ms: u64) {
        let Some(cause) = self.state.cause() else {
            return;
        };
        let incident = Incident {
            cause,
            duration_seconds: self.state.elapsed_ms(now_ms) as f64 / 1000.0,
            timestamp_ms: now_ms,
        };

        info!(
            "Critical incident: {} held for {:.1}s",
            incident.cause, incident.duration_seconds
        );
        counter!("proctor_incidents_total", "cause" => cause.as_str()).increment(1);

        for sink in &self.sinks {
            sink.report(&incident);
        }
    }

    /// Seconds spent in the current incident, or 0
    pub fn anomaly_duration(&self) -> f64 {
        self.last_timestamp_ms
            .map(|now| self.state.elapsed_ms(now) as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Return to the normal state, e.g. when a session restarts
    pub fn reset(&mut self) {
        debug!("Resetting anomaly detector");
        self.state = PersistenceState::Normal;
        self.last_timestamp_ms = None;
    }
}
