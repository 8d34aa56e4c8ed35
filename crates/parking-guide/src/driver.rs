//! Control loop
//!
//! One tick: next frame -> detector -> empty-slot assignment -> lot-full
//! line (edge-triggered) -> guidance state machine -> message sink.

use guidance::{
    GuidanceConfig, GuidanceEffect, GuidanceStateMachine, OccupancySignal, Phase, TickInput,
};
use line_io::{OutputLine, PresenceSensor};
use slot_map::{assign, EmptySlotSet, RowSplit, SlotRegistry};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::feed::{self, Detector, FrameSource};
use crate::sink::MessageSink;
use crate::telemetry;
use crate::GuideError;

/// Why the control loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown signal received
    Shutdown,
    /// Frame source ran out of frames
    EndOfStream,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub phase: Phase,
    pub empty_slots: EmptySlotSet,
    /// Level on the lot-full line after this tick
    pub lot_full: bool,
    pub effects: Vec<GuidanceEffect>,
}

/// Owns every collaborator and all mutable loop state
pub struct Driver<F, D, P, O, M>
where
    F: FrameSource,
{
    source: F,
    detector: D,
    sensor: P,
    output: O,
    sink: M,
    registry: SlotRegistry,
    signal: OccupancySignal,
    machine: GuidanceStateMachine,
}

impl<F, D, P, O, M> Driver<F, D, P, O, M>
where
    F: FrameSource,
    D: Detector<F::Frame>,
    P: PresenceSensor,
    O: OutputLine,
    M: MessageSink,
{
    /// Create a driver; call [`Driver::calibrate`] before running
    pub fn new(
        source: F,
        detector: D,
        sensor: P,
        output: O,
        sink: M,
        config: GuidanceConfig,
    ) -> Self {
        let signal = OccupancySignal::new(output.read_current());
        Self {
            source,
            detector,
            sensor,
            output,
            sink,
            registry: SlotRegistry::default(),
            signal,
            machine: GuidanceStateMachine::new(config),
        }
    }

    /// Build the slot registry from the next frame
    pub fn calibrate(&mut self, split: RowSplit) -> Result<&SlotRegistry, GuideError> {
        let frame = self.source.next_frame()?.ok_or_else(|| {
            error!("Frame source ended before calibration");
            GuideError::Calibration
        })?;
        let detections = feed::normalize(&self.detector.detect(&frame)?);
        self.registry = SlotRegistry::build(&detections, split);

        if self.registry.is_empty() {
            error!("Calibration failed: no parking slots found, refusing to start");
            return Err(GuideError::Calibration);
        }
        info!(
            "Calibration complete: {:?}",
            self.registry.ids().map(|id| id.to_string()).collect::<Vec<_>>()
        );
        Ok(&self.registry)
    }

    /// Run one tick at `now`; `Ok(None)` when the frame source is exhausted
    pub fn tick(&mut self, now: Instant) -> Result<Option<TickReport>, GuideError> {
        if self.registry.is_empty() {
            return Err(GuideError::Calibration);
        }

        let frame = match self.source.next_frame()? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        let detections = feed::normalize(&self.detector.detect(&frame)?);
        let empty_slots = assign(&detections, &self.registry);

        if let Some(level) = self.signal.pending(&empty_slots) {
            self.output.write(level)?;
            self.signal.record(level);
            telemetry::record_line_write(level);
            info!("Lot-full line set to {}", level);
        }

        let sensor_active = self.sensor.is_active()?;
        let effects = self.machine.tick(TickInput {
            sensor_active,
            empty_slots: &empty_slots,
            now,
        });

        for effect in &effects {
            match effect {
                GuidanceEffect::Message(text) => self.sink.display(text),
                GuidanceEffect::Committed(_) => telemetry::record_outcome("slot"),
                GuidanceEffect::LotFull => telemetry::record_outcome("full"),
                GuidanceEffect::PhaseChanged { .. } => {}
            }
        }
        telemetry::record_tick(empty_slots.len());

        Ok(Some(TickReport {
            phase: self.machine.phase(),
            lot_full: self.signal.level(),
            empty_slots,
            effects,
        }))
    }

    /// Tick every `interval` until `shutdown` resolves or the feed ends.
    ///
    /// Teardown runs on every exit path.
    pub async fn run<S>(
        &mut self,
        interval: Duration,
        shutdown: S,
    ) -> Result<StopReason, GuideError>
    where
        S: Future<Output = ()>,
    {
        if self.registry.is_empty() {
            error!("Slot layout unknown, not starting the control loop");
            return Err(GuideError::Calibration);
        }

        self.sink.display(self.machine.message());
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Control loop started, tick every {:?}", interval);
        let result = loop {
            tokio::select! {
                _ = &mut shutdown => break Ok(StopReason::Shutdown),
                _ = ticker.tick() => {
                    // tokio's clock so paused-time tests drive the state timers
                    let now = tokio::time::Instant::now().into_std();
                    match self.tick(now) {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            warn!("Frame source exhausted");
                            break Ok(StopReason::EndOfStream);
                        }
                        Err(e) => {
                            error!("Control loop failed: {}", e);
                            break Err(e);
                        }
                    }
                }
            }
        };

        if let Err(e) = self.shutdown() {
            error!("Teardown failed: {}", e);
            if result.is_ok() {
                return Err(e);
            }
        }
        result
    }

    /// Release the lot-full line
    pub fn shutdown(&mut self) -> Result<(), GuideError> {
        self.output.write(false)?;
        self.signal = OccupancySignal::new(false);
        info!("Shutdown complete: lot-full line cleared");
        Ok(())
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn machine(&self) -> &GuidanceStateMachine {
        &self.machine
    }

    pub fn sink(&self) -> &M {
        &self.sink
    }
}
