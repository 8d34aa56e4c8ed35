//! Parking Guide - Main Entry Point

use anyhow::{anyhow, Context};
use line_io::{GpioInput, GpioOutput, MemoryLine, OutputLine, PresenceSensor};
use parking_guide::{
    init_logging, install_metrics_exporter, AppConfig, ConsoleSink, Driver, LineBackend,
    RecordedDetector, ReplayFeed,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_logging(&config.logging)?;

    info!("=== Parking Guide v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(listen) = &config.metrics.listen {
        install_metrics_exporter(listen)?;
    }

    let replay_path = config
        .feed
        .replay_path
        .as_deref()
        .ok_or_else(|| anyhow!("no frame source configured (feed.replay_path)"))?;

    let presence = MemoryLine::new(false);
    let feed = ReplayFeed::open(replay_path)
        .with_context(|| format!("opening replay {replay_path}"))?
        .with_presence(presence.clone());

    let lines = &config.lines;
    let (sensor, output): (Box<dyn PresenceSensor>, Box<dyn OutputLine>) = match lines.backend {
        LineBackend::Gpiod => {
            let sensor =
                GpioInput::request(&lines.chip, lines.trigger_pin, lines.trigger_active_high)?;
            let output = GpioOutput::request(
                &lines.chip,
                lines.lot_full_pin,
                lines.lot_full_active_high,
                false,
            )?;
            (Box::new(sensor) as Box<dyn PresenceSensor>, Box::new(output) as Box<dyn OutputLine>)
        }
        LineBackend::Simulated => (
            Box::new(presence) as Box<dyn PresenceSensor>,
            Box::new(MemoryLine::new(false)) as Box<dyn OutputLine>,
        ),
    };

    let mut driver = Driver::new(
        feed,
        RecordedDetector,
        sensor,
        output,
        ConsoleSink,
        config.guidance.clone(),
    );
    driver
        .calibrate(config.registry.row_split)
        .context("calibrating slot layout")?;

    let interval = Duration::from_millis(config.tick_interval_ms);
    let stop = driver.run(interval, shutdown_signal()).await?;
    info!("Parking guide stopped: {:?}", stop);

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
