//! Integration tests for the capture loop and session lifecycle

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use organoscope::capture::FrameSource;
use organoscope::display::{ChannelSink, DisplaySink};
use organoscope::enhance::ParamStore;
use organoscope::pipeline::{capture_loop, SessionController};
use organoscope::{Config, Error, Frame};

fn test_frame(sequence: u64) -> Frame {
    Frame::from_bgr(vec![120; 16 * 16 * 3], 16, 16, sequence)
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.capture.poll_interval_ms = 1;
    config
}

/// Source that replays a script of reads, then reports Empty forever
struct ScriptedSource {
    script: VecDeque<Option<Frame>>,
    drops: Arc<AtomicU32>,
}

impl ScriptedSource {
    fn new(script: Vec<Option<Frame>>) -> (Self, Arc<AtomicU32>) {
        let drops = Arc::new(AtomicU32::new(0));
        (
            Self {
                script: script.into(),
                drops: Arc::clone(&drops),
            },
            drops,
        )
    }

    fn with_frames(frames: u64) -> (Self, Arc<AtomicU32>) {
        Self::new((1..=frames).map(|s| Some(test_frame(s))).collect())
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        Ok(self.script.pop_front().flatten())
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink that collects every published frame
#[derive(Default)]
struct CollectorSink {
    frames: Mutex<Vec<Arc<Frame>>>,
}

impl DisplaySink for CollectorSink {
    fn publish(&self, frame: Arc<Frame>) {
        self.frames.lock().unwrap().push(frame);
    }
}

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn loop_survives_consecutive_empty_reads() {
    // 10 empty reads, then one good frame
    let mut script: Vec<Option<Frame>> = vec![None; 10];
    script.push(Some(test_frame(1)));
    let (source, _drops) = ScriptedSource::new(script);

    let sink = Arc::new(CollectorSink::default());
    let collector = Arc::clone(&sink);
    let mut handle = capture_loop::spawn(
        Box::new(source),
        Arc::new(ParamStore::default()),
        Arc::new(ArcSwapOption::from(None)),
        sink,
        Duration::from_millis(1),
    );

    let published = wait_until(Duration::from_secs(2), || {
        !collector.frames.lock().unwrap().is_empty()
    });
    assert!(published, "frame after the empty streak never arrived");
    assert!(handle.is_running(), "loop stopped on empty reads");

    let frames = collector.frames.lock().unwrap();
    assert_eq!(frames[0].sequence, 1);
    drop(frames);

    handle.stop();
    assert!(!handle.is_running());
}

#[test]
fn loop_publishes_enhanced_frames() {
    let (source, _drops) = ScriptedSource::with_frames(100);
    let sink = Arc::new(CollectorSink::default());
    let collector = Arc::clone(&sink);
    let latest = Arc::new(ArcSwapOption::from(None));

    let mut handle = capture_loop::spawn(
        Box::new(source),
        Arc::new(ParamStore::default()),
        Arc::clone(&latest),
        sink,
        Duration::from_millis(1),
    );

    assert!(wait_until(Duration::from_secs(2), || {
        collector.frames.lock().unwrap().len() >= 3
    }));
    handle.stop();

    // raw frames land in the shared latest slot, enhanced ones in the sink
    let raw = latest.load_full().expect("latest raw frame missing");
    assert_eq!(raw.data[0], 120);
    let frames = collector.frames.lock().unwrap();
    let enhanced = &frames[0];
    assert_eq!((enhanced.width, enhanced.height), (16, 16));
    // default parameters brighten the flat gray input
    assert_ne!(enhanced.data, raw.data);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_session_twice_is_safe() {
    let (source, drops) = ScriptedSource::with_frames(1000);
    let (sink, _rx) = ChannelSink::new(4);
    let mut controller = SessionController::new(&fast_config(), Arc::new(sink));

    controller.start_session_with_source(Box::new(source));
    assert!(wait_until(Duration::from_secs(2), || controller.is_running()));

    controller.stop_session();
    assert!(!controller.is_running());
    assert_eq!(drops.load(Ordering::SeqCst), 1, "source not released");

    // second stop must not panic or double-release
    controller.stop_session();
    assert_eq!(drops.load(Ordering::SeqCst), 1, "source released twice");
}

#[tokio::test(flavor = "multi_thread")]
async fn restart_does_not_leak_previous_session() {
    let (first, first_drops) = ScriptedSource::with_frames(1000);
    let (second, second_drops) = ScriptedSource::with_frames(1000);
    let (sink, _rx) = ChannelSink::new(4);
    let mut controller = SessionController::new(&fast_config(), Arc::new(sink));

    controller.start_session_with_source(Box::new(first));
    assert!(wait_until(Duration::from_secs(2), || controller.is_running()));

    // starting again tears the previous session down first
    controller.start_session_with_source(Box::new(second));
    assert!(wait_until(Duration::from_secs(2), || controller.is_running()));
    assert_eq!(first_drops.load(Ordering::SeqCst), 1);
    assert_eq!(second_drops.load(Ordering::SeqCst), 0);

    controller.stop_session();
    assert_eq!(second_drops.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_still_needs_directory_and_frame() {
    let (sink, _rx) = ChannelSink::new(4);
    let controller = SessionController::new(&fast_config(), Arc::new(sink));

    // no directory configured
    match controller.capture_still() {
        Err(Error::InvalidConfig(_)) => {}
        other => panic!("expected InvalidConfig, got {other:?}"),
    }

    // directory set but no frame captured yet
    let dir = std::env::temp_dir().join(format!("organoscope_still_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    controller.autocapture().set_save_dir(Some(dir.clone()));
    match controller.capture_still() {
        Err(Error::NoFrame) => {}
        other => panic!("expected NoFrame, got {other:?}"),
    }
    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_still_writes_screenshot() {
    let dir = std::env::temp_dir().join(format!("organoscope_shot_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let (source, _drops) = ScriptedSource::with_frames(1000);
    let (sink, _rx) = ChannelSink::new(4);
    let mut controller = SessionController::new(&fast_config(), Arc::new(sink));
    controller.autocapture().set_save_dir(Some(dir.clone()));

    controller.start_session_with_source(Box::new(source));
    assert!(wait_until(Duration::from_secs(2), || {
        controller.capture_still().is_ok()
    }));

    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(
        names.iter().any(|n| n.starts_with("screenshot_") && n.ends_with(".png")),
        "no screenshot written: {names:?}"
    );

    controller.stop_session();
    std::fs::remove_dir_all(&dir).unwrap();
}
