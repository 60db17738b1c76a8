//! Background capture loop
//!
//! A dedicated thread pulls frames from the source at a fixed cadence,
//! enhances them under a single parameter snapshot per frame, and publishes
//! the frozen result to the display sink. Camera reads are blocking native
//! calls, so this runs on an OS thread rather than the async runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::capture::frame::Frame;
use crate::capture::source::FrameSource;
use crate::display::DisplaySink;
use crate::enhance::{self, ParamStore};

/// Running capture loop; stop is cooperative with latency of about one poll
/// interval
pub struct CaptureLoopHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

pub fn spawn(
    mut source: Box<dyn FrameSource>,
    params: Arc<ParamStore>,
    latest: Arc<ArcSwapOption<Frame>>,
    sink: Arc<dyn DisplaySink>,
    poll_interval: Duration,
) -> CaptureLoopHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let thread = thread::spawn(move || {
        info!("Capture loop started");
        loop {
            if stop_flag.load(Ordering::SeqCst) {
                debug!("Stop signal received");
                break;
            }

            // An empty read is a transient failure: skip and retry
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    thread::sleep(poll_interval);
                    continue;
                }
                Err(e) => {
                    warn!("Frame read failed: {e}");
                    thread::sleep(poll_interval);
                    continue;
                }
            };
            counter!("capture_frames_total").increment(1);

            // Freeze the raw frame for the scheduler, then deep-copy so the
            // enhancement input cannot alias anything the source reuses
            let raw = Arc::new(frame);
            latest.store(Some(Arc::clone(&raw)));
            let working = (*raw).clone();

            let snapshot = params.snapshot();
            let started = Instant::now();
            let enhanced = enhance::enhance(&working, &snapshot);
            histogram!("enhance_duration_us").record(started.elapsed().as_micros() as f64);

            sink.publish(Arc::new(enhanced));
            thread::sleep(poll_interval);
        }
        info!("Capture loop exiting");
        // the source drops with the thread, releasing the camera strictly
        // before a join() on this thread returns
    });

    CaptureLoopHandle {
        stop,
        thread: Some(thread),
    }
}

impl CaptureLoopHandle {
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop and wait for the thread to finish; safe to call twice
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            debug!("Waiting for capture loop to finish");
            if handle.join().is_err() {
                warn!("Capture loop thread panicked");
            }
        }
    }
}

impl Drop for CaptureLoopHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}
