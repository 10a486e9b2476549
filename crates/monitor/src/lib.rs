//! Proctor Monitor
//!
//! Replays a landmark recording through a proctoring session:
//! - Detection loop at the frame cadence, publishing the latest status
//! - Observation loop at its own cadence, feeding the alert log
//! - Incidents fanned out to the alert log and the MQTT incident log

pub mod config;

pub use config::MonitorConfig;

use alerting::{AlertLog, AlertManager, SessionReport};
use anyhow::Context;
use chrono::Utc;
use incident_log::{IncidentLog, IncidentLogConfig};
use landmarks::{ReplaySource, VideoFrame};
use metrics_exporter_prometheus::PrometheusBuilder;
use proctor::analysis::INITIALIZING_TEXT;
use proctor::{AnomalyDetector, Cause, ProctoringSession, ProctoringStatus};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging(config: &MonitorConfig) {
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);

    let result = if config.log_json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Serve Prometheus metrics on `addr`
pub fn install_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Run one monitoring session over the configured recording
pub async fn run(config: MonitorConfig) -> anyhow::Result<SessionReport> {
    let manager = AlertManager::new(config.alerts.clone(), Utc::now());
    let session_id = manager.session_id();
    let alerts = Arc::new(AlertLog::new(manager));

    let mut detector = AnomalyDetector::new(config.rules.clone())?.with_sink(alerts.clone());

    if let Some(log_config) = &config.incident_log {
        let mut log = IncidentLog::new(IncidentLogConfig {
            session_id: session_id.to_string(),
            ..log_config.clone()
        });
        match log.connect() {
            Ok(()) => detector.add_sink(Arc::new(log)),
            Err(e) => warn!("Incident log disabled: {}", e),
        }
    }

    let mut session =
        ProctoringSession::new(ReplaySource::from_path(&config.recording_path), detector);
    session
        .initialize()
        .await
        .with_context(|| format!("failed to load {}", config.recording_path.display()))?;

    let frame_count = session.source().len();
    info!(
        "Session {} started: {} frames from {}",
        session_id,
        frame_count,
        config.recording_path.display()
    );
    alerts.with(|m| m.session_started(Utc::now()));

    let (status_tx, status_rx) = watch::channel(ProctoringStatus::neutral(INITIALIZING_TEXT));
    let observer = tokio::spawn(observe(
        status_rx,
        alerts.clone(),
        Duration::from_millis(config.observation_interval_ms),
    ));

    let mut ticker = interval(Duration::from_millis(config.detection_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut video = VideoFrame::blank(config.frame_width, config.frame_height, 0);
    let start = Instant::now();

    for sequence in 0..frame_count {
        ticker.tick().await;
        video.sequence = sequence as u32;
        let timestamp_ms = start.elapsed().as_millis() as u64;
        status_tx.send_replace(session.process_frame(&video, timestamp_ms));
    }

    // Closing the channel stops the observer after its next read
    drop(status_tx);
    observer.await.context("observer task failed")?;

    session.destroy();
    alerts.with(|m| m.session_ended(Utc::now()));

    let report = alerts
        .session_report()
        .context("alert log unavailable")?;
    info!(
        "Session {} finished: {:.1}s, {} incidents",
        session_id,
        report.duration_seconds,
        report.incidents.len()
    );

    if let Some(path) = &config.report_path {
        report.write_to(path)?;
        info!("Session report written to {}", path.display());
    }

    Ok(report)
}

/// Periodically read the latest status and warn when the primary cause changes
async fn observe(
    mut status_rx: watch::Receiver<ProctoringStatus>,
    alerts: Arc<AlertLog>,
    period: Duration,
) {
    let mut ticker = interval(period);
    let mut last_primary: Option<Cause> = None;

    loop {
        ticker.tick().await;
        let status = status_rx.borrow_and_update().clone();

        let primary = status.primary_cause();
        if primary != last_primary {
            if let Some(cause) = primary {
                alerts.warn(cause);
            }
            last_primary = primary;
        }

        if status.is_critical {
            warn!("{}", status.status_text);
        } else {
            info!("{}", status.status_text);
        }

        if status_rx.has_changed().is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertKind;
    use landmarks::synthetic::SyntheticFace;
    use landmarks::Frame;
    use std::io::Write;

    fn recording(frames: &[Frame]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for frame in frames {
            writeln!(file, "{}", serde_json::to_string(frame).unwrap()).unwrap();
        }
        file
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_absence_is_reported_once() {
        // 200 frames at 33ms: ~6.6s without a face
        let frames: Vec<_> = (0..200).map(|_| Frame::empty(0)).collect();
        let file = recording(&frames);
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("report.json");

        let config = MonitorConfig {
            recording_path: file.path().to_path_buf(),
            report_path: Some(report_path.clone()),
            ..Default::default()
        };

        let report = run(config).await.unwrap();
        assert_eq!(report.incidents.len(), 1);
        assert_eq!(report.incidents[0].cause, Cause::NoFace);
        assert_eq!(report.incident_counts.get("No Face"), Some(&1));
        assert!(report
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::Warning && a.message == "No Face detected"));
        assert!(report_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attentive_session_is_clean() {
        let frames: Vec<_> = (0..100)
            .map(|_| Frame::new(vec![SyntheticFace::centered().build()], vec![], 0))
            .collect();
        let file = recording(&frames);

        let config = MonitorConfig {
            recording_path: file.path().to_path_buf(),
            ..Default::default()
        };

        let report = run(config).await.unwrap();
        assert!(report.incidents.is_empty());
        assert!(report.alerts.iter().all(|a| a.kind == AlertKind::Info));
    }

    #[tokio::test]
    async fn test_missing_recording_fails() {
        let config = MonitorConfig {
            recording_path: "/nonexistent/recording.jsonl".into(),
            ..Default::default()
        };
        assert!(run(config).await.is_err());
    }
}
