use guidance::{GuidanceConfig, Phase};
use line_io::{LineError, MemoryLine, OutputLine};
use parking_guide::{
    Driver, FeedError, FrameSource, GuideError, MessageSink, RawDetection, RecordedDetector,
    RecordedFrame, ReplayFeed, StopReason,
};
use slot_map::RowSplit;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const IDLE: &str = "waiting for vehicle...";

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<String>>>);

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    fn display(&mut self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

struct Script(VecDeque<RecordedFrame>);

impl FrameSource for Script {
    type Frame = RecordedFrame;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>, FeedError> {
        Ok(self.0.pop_front())
    }
}

fn boxed(label: &str, cx: f32, cy: f32) -> RawDetection {
    RawDetection::new(label, [cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0])
}

/// 17 slots in row A (y=10), 3 in row B (y=100), 20px apart
fn calibration_frame() -> RecordedFrame {
    let mut detections = Vec::new();
    for i in 0..17 {
        detections.push(boxed("space-occupied", i as f32 * 20.0, 10.0));
    }
    for i in 0..3 {
        detections.push(boxed("space-occupied", i as f32 * 20.0, 100.0));
    }
    RecordedFrame {
        presence: None,
        detections,
    }
}

/// A3 and B1 free, a person walking past, one box without coordinates
fn a3_b1_free() -> RecordedFrame {
    RecordedFrame {
        presence: None,
        detections: vec![
            boxed("space-empty", 41.0, 11.0),
            boxed("space-empty", 1.0, 99.0),
            boxed("space-occupied", 20.0, 10.0),
            boxed("person", 2.0, 12.0),
            RawDetection {
                label: "space-empty".to_string(),
                bbox: None,
            },
        ],
    }
}

fn lot_full_frame() -> RecordedFrame {
    RecordedFrame {
        presence: None,
        detections: vec![boxed("space-occupied", 0.0, 10.0)],
    }
}

fn script(frames: Vec<RecordedFrame>) -> Script {
    let mut all = VecDeque::from(vec![calibration_frame()]);
    all.extend(frames);
    Script(all)
}

type TestDriver<F> = Driver<F, RecordedDetector, MemoryLine, MemoryLine, RecordingSink>;

fn driver<F: FrameSource<Frame = RecordedFrame>>(
    source: F,
    sensor: &MemoryLine,
    output: &MemoryLine,
    sink: &RecordingSink,
) -> TestDriver<F> {
    Driver::new(
        source,
        RecordedDetector,
        sensor.clone(),
        output.clone(),
        sink.clone(),
        GuidanceConfig::default(),
    )
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn test_end_to_end_guidance() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let mut d = driver(script(vec![a3_b1_free(); 20]), &sensor, &output, &sink);

    let registry = d.calibrate(RowSplit::default()).unwrap();
    assert_eq!(registry.len(), 20);

    let start = Instant::now();
    let report = d.tick(start).unwrap().unwrap();
    assert_eq!(report.phase, Phase::Idle);
    assert_eq!(d.machine().message(), IDLE);
    let ids: Vec<String> = report.empty_slots.iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["A3", "B1"]);
    assert!(!report.lot_full);

    sensor.set(true);
    let t0 = start + ms(1000);
    assert_eq!(d.tick(t0).unwrap().unwrap().phase, Phase::SenseWait);
    assert_eq!(d.tick(t0 + ms(2100)).unwrap().unwrap().phase, Phase::GuideSlot);

    let mut now = t0 + ms(2100);
    for _ in 0..5 {
        now += ms(100);
        assert_eq!(d.tick(now).unwrap().unwrap().phase, Phase::GuideSlot);
    }
    now += ms(100);
    assert_eq!(d.tick(now).unwrap().unwrap().phase, Phase::GuideDone);
    assert_eq!(d.machine().message(), "guide to B1");
    assert_eq!(sink.messages(), vec!["guide to B1"]);

    sensor.set(false);
    assert_eq!(d.tick(now + ms(5000)).unwrap().unwrap().phase, Phase::GuideDone);
    assert_eq!(d.tick(now + ms(5100)).unwrap().unwrap().phase, Phase::Idle);
    assert_eq!(sink.messages(), vec!["guide to B1", IDLE]);

    // Slots were free throughout, the lot-full line was never touched
    assert_eq!(output.write_count(), 0);
}

#[test]
fn test_lot_full_line_written_once() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let frames = vec![lot_full_frame(), lot_full_frame(), a3_b1_free(), lot_full_frame()];
    let mut d = driver(script(frames), &sensor, &output, &sink);
    d.calibrate(RowSplit::default()).unwrap();

    let t0 = Instant::now();
    assert!(d.tick(t0).unwrap().unwrap().lot_full);
    assert!(d.tick(t0 + ms(100)).unwrap().unwrap().lot_full);
    assert_eq!(output.write_count(), 1);
    assert!(output.level());

    assert!(!d.tick(t0 + ms(200)).unwrap().unwrap().lot_full);
    assert!(d.tick(t0 + ms(300)).unwrap().unwrap().lot_full);
    assert_eq!(output.write_count(), 3);

    assert!(d.tick(t0 + ms(400)).unwrap().is_none());
}

/// Output line whose first `failures` writes are rejected
struct FailingLine {
    line: MemoryLine,
    failures: usize,
}

impl OutputLine for FailingLine {
    fn write(&mut self, level: bool) -> Result<(), LineError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(LineError::Io {
                offset: 14,
                source: std::io::Error::new(std::io::ErrorKind::Other, "line busy"),
            });
        }
        self.line.write(level)
    }

    fn read_current(&self) -> bool {
        self.line.level()
    }
}

#[test]
fn test_failed_line_write_is_retried() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let failing = FailingLine {
        line: output.clone(),
        failures: 1,
    };
    let mut d = Driver::new(
        script(vec![lot_full_frame(); 3]),
        RecordedDetector,
        sensor,
        failing,
        RecordingSink::default(),
        GuidanceConfig::default(),
    );
    d.calibrate(RowSplit::default()).unwrap();

    let t0 = Instant::now();
    assert!(matches!(d.tick(t0), Err(GuideError::Line(LineError::Io { offset: 14, .. }))));
    assert!(!output.level());

    let report = d.tick(t0 + ms(100)).unwrap().unwrap();
    assert!(report.lot_full);
    assert!(output.level());
    assert_eq!(output.write_count(), 1);

    assert!(d.tick(t0 + ms(200)).unwrap().unwrap().lot_full);
    assert_eq!(output.write_count(), 1);
}

#[test]
fn test_full_lot_announced() {
    let sensor = MemoryLine::new(true);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let mut d = driver(script(vec![lot_full_frame(); 4]), &sensor, &output, &sink);
    d.calibrate(RowSplit::default()).unwrap();

    let t0 = Instant::now();
    d.tick(t0).unwrap();
    assert_eq!(d.tick(t0 + ms(2000)).unwrap().unwrap().phase, Phase::GuideFull);
    assert_eq!(d.tick(t0 + ms(2100)).unwrap().unwrap().phase, Phase::GuideDone);
    assert_eq!(sink.messages(), vec!["lot full"]);
}

#[test]
fn test_calibration_failure_blocks_loop() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let frames = VecDeque::from(vec![
        RecordedFrame {
            presence: None,
            detections: vec![boxed("car", 10.0, 10.0)],
        },
        a3_b1_free(),
    ]);
    let mut d = driver(Script(frames), &sensor, &output, &sink);

    assert!(matches!(d.calibrate(RowSplit::default()), Err(GuideError::Calibration)));
    assert!(d.registry().is_empty());
    assert!(matches!(d.tick(Instant::now()), Err(GuideError::Calibration)));
}

#[test]
fn test_calibration_needs_a_frame() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let mut d = driver(Script(VecDeque::new()), &sensor, &output, &sink);

    assert!(matches!(d.calibrate(RowSplit::default()), Err(GuideError::Calibration)));
}

fn replay_lines(frames: &[RecordedFrame]) -> String {
    frames
        .iter()
        .map(|f| serde_json::to_string(f).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test(start_paused = true)]
async fn test_run_replay_to_end_of_stream() {
    let mut frames = vec![calibration_frame()];
    for _ in 0..100 {
        let mut frame = a3_b1_free();
        frame.presence = Some(true);
        frames.push(frame);
    }

    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let feed = ReplayFeed::new(Cursor::new(replay_lines(&frames))).with_presence(sensor.clone());
    let mut d = driver(feed, &sensor, &output, &sink);
    d.calibrate(RowSplit::default()).unwrap();

    let stop = d.run(ms(100), std::future::pending::<()>()).await.unwrap();
    assert_eq!(stop, StopReason::EndOfStream);

    let messages = sink.messages();
    assert_eq!(messages[0], IDLE);
    assert_eq!(messages[1], "guide to B1");

    // Teardown drives the line low
    assert!(!output.level());
    assert_eq!(output.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_clears_line() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let mut d = driver(script(vec![lot_full_frame(); 1000]), &sensor, &output, &sink);
    d.calibrate(RowSplit::default()).unwrap();

    let stop = d
        .run(ms(100), tokio::time::sleep(ms(350)))
        .await
        .unwrap();
    assert_eq!(stop, StopReason::Shutdown);

    // Raised once when the lot read full, cleared once on teardown
    assert_eq!(output.write_count(), 2);
    assert!(!output.level());
}

#[tokio::test(start_paused = true)]
async fn test_feed_error_stops_after_teardown() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let data = format!(
        "{}\n{}\nthis is not json\n",
        serde_json::to_string(&calibration_frame()).unwrap(),
        serde_json::to_string(&lot_full_frame()).unwrap(),
    );
    let mut d = driver(ReplayFeed::new(Cursor::new(data)), &sensor, &output, &sink);
    d.calibrate(RowSplit::default()).unwrap();

    let result = d.run(ms(100), std::future::pending::<()>()).await;
    assert!(matches!(result, Err(GuideError::Feed(FeedError::Parse { line: 3, .. }))));
    assert!(!output.level());
}

#[tokio::test]
async fn test_run_refuses_without_calibration() {
    let sensor = MemoryLine::new(false);
    let output = MemoryLine::new(false);
    let sink = RecordingSink::default();
    let mut d = driver(script(vec![]), &sensor, &output, &sink);

    let result = d.run(ms(100), std::future::pending::<()>()).await;
    assert!(matches!(result, Err(GuideError::Calibration)));
    assert!(sink.messages().is_empty());
    assert_eq!(output.write_count(), 0);
}
