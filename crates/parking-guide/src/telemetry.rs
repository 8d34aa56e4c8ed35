//! Logging and metrics setup

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::LoggingConfig;
use crate::GuideError;

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), GuideError> {
    let level: Level = config.level.parse().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| GuideError::Logging(e.to_string()))
}

/// Serve Prometheus metrics on `listen`
pub fn install_metrics_exporter(listen: &str) -> Result<(), GuideError> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| GuideError::Metrics(format!("bad listen address {listen:?}: {e}")))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GuideError::Metrics(e.to_string()))?;
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

pub(crate) fn record_tick(empty_slots: usize) {
    counter!("parking_guide_ticks_total").increment(1);
    gauge!("parking_guide_empty_slots").set(empty_slots as f64);
}

pub(crate) fn record_line_write(level: bool) {
    let level = if level { "full" } else { "available" };
    counter!("parking_guide_line_writes_total", "level" => level).increment(1);
}

pub(crate) fn record_outcome(kind: &'static str) {
    counter!("parking_guide_guidance_total", "outcome" => kind).increment(1);
}
