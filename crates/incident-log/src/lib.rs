//! Incident Log
//!
//! MQTT publishing of critical incidents with:
//! - One message per escalation, never awaited by the frame loop
//! - Delivery failures logged and counted, never propagated

use chrono::{DateTime, Utc};
use metrics::counter;
use proctor::{Cause, Incident, IncidentSink};
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Incident log error types
#[derive(Error, Debug)]
pub enum IncidentLogError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Incident log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentLogConfig {
    /// MQTT broker host
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Session the incidents belong to
    pub session_id: String,
    /// Keep-alive interval (seconds)
    pub keep_alive_secs: u64,
    /// Outgoing request queue size
    pub queue_capacity: usize,
}

impl Default for IncidentLogConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            session_id: "unknown".to_string(),
            keep_alive_secs: 30,
            queue_capacity: 10,
        }
    }
}

/// Incident message for the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentMessage {
    pub id: Uuid,
    pub message_type: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub cause: Cause,
    pub duration_seconds: f64,
    pub frame_timestamp_ms: u64,
}

impl IncidentMessage {
    pub fn new(session_id: &str, incident: &Incident, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type: "incident".to_string(),
            session_id: session_id.to_string(),
            timestamp,
            cause: incident.cause,
            duration_seconds: incident.duration_seconds,
            frame_timestamp_ms: incident.timestamp_ms,
        }
    }
}

/// Topic incidents of a session are published on
pub fn incident_topic(session_id: &str) -> String {
    format!("proctoring/{}/incidents", session_id)
}

/// Incident publisher
pub struct IncidentLog {
    config: IncidentLogConfig,
    client: Option<AsyncClient>,
    /// Dropping the sender stops the event loop task
    shutdown: Option<oneshot::Sender<()>>,
    poller: Option<JoinHandle<()>>,
    published: AtomicU32,
    dropped: AtomicU32,
}

impl IncidentLog {
    /// Create new incident log
    pub fn new(config: IncidentLogConfig) -> Self {
        Self {
            config,
            client: None,
            shutdown: None,
            poller: None,
            published: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Connect to MQTT broker. Must be called inside a tokio runtime.
    pub fn connect(&mut self) -> Result<(), IncidentLogError> {
        if self.config.broker_url.is_empty() {
            return Err(IncidentLogError::Connection("broker URL is empty".to_string()));
        }

        let mut options = MqttOptions::new(
            format!("proctor-{}", self.config.session_id),
            &self.config.broker_url,
            self.config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));

        let (client, eventloop) = AsyncClient::new(options, self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        self.poller = Some(tokio::spawn(poll_events(eventloop, shutdown_rx)));
        self.shutdown = Some(shutdown_tx);
        self.client = Some(client);
        info!(
            "Incident log connected to MQTT broker: {}:{}",
            self.config.broker_url, self.config.broker_port
        );
        Ok(())
    }

    /// Queue an incident for publishing without waiting
    pub fn publish(&self, incident: &Incident) -> Result<(), IncidentLogError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| IncidentLogError::Connection("Not connected".to_string()))?;

        let message = IncidentMessage::new(&self.config.session_id, incident, Utc::now());
        let payload = serde_json::to_vec(&message)
            .map_err(|e| IncidentLogError::Serialization(e.to_string()))?;

        client
            .try_publish(
                incident_topic(&self.config.session_id),
                QoS::AtLeastOnce,
                false,
                payload,
            )
            .map_err(|e| IncidentLogError::Publish(e.to_string()))?;

        self.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Drop the client and wait for the event loop task to stop
    pub async fn disconnect(&mut self) {
        self.client = None;
        self.shutdown = None;
        if let Some(poller) = self.poller.take() {
            if let Err(e) = poller.await {
                error!("MQTT event loop task failed: {}", e);
            }
            info!("Incident log disconnected");
        }
    }

    /// Incidents handed to the MQTT client
    pub fn published(&self) -> u32 {
        self.published.load(Ordering::Relaxed)
    }

    /// Incidents that could not be queued
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Drive the MQTT connection until shutdown or until every client is gone
async fn poll_events(mut eventloop: EventLoop, mut shutdown: oneshot::Receiver<()>) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(incoming)) => {
                    debug!("MQTT incoming: {:?}", incoming);
                }
                Ok(_) => {}
                Err(ConnectionError::RequestsDone) => break,
                Err(e) => {
                    error!("MQTT error: {}", e);
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                    }
                }
            },
        }
    }
    debug!("MQTT event loop stopped");
}

impl IncidentSink for IncidentLog {
    fn report(&self, incident: &Incident) {
        if let Err(e) = self.publish(incident) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            counter!("proctor_incident_log_dropped_total").increment(1);
            error!("Incident {} not logged: {}", incident.cause, e);
        }
    }
}
