//! Session lifecycle
//!
//! A session is the camera source, the capture loop, and the auto-capture
//! scheduler managed as one unit: started together, stopped together, and
//! restarted when the operator swaps cameras.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tracing::info;

use crate::capture::frame::Frame;
use crate::capture::source::FrameSource;
use crate::capture::v4l2::V4l2Source;
use crate::display::DisplaySink;
use crate::enhance::{self, ParamStore};
use crate::error::Error;
use crate::persist;
use crate::pipeline::autocapture::AutoCapture;
use crate::pipeline::capture_loop::{self, CaptureLoopHandle};
use crate::{CaptureConfig, Config};

pub struct SessionController {
    capture_config: CaptureConfig,
    poll_interval: Duration,
    params: Arc<ParamStore>,
    latest: Arc<ArcSwapOption<Frame>>,
    sink: Arc<dyn DisplaySink>,
    autocapture: AutoCapture,
    session: Option<CaptureLoopHandle>,
}

impl SessionController {
    pub fn new(config: &Config, sink: Arc<dyn DisplaySink>) -> Self {
        let params = Arc::new(ParamStore::new(config.enhance));
        let latest: Arc<ArcSwapOption<Frame>> = Arc::new(ArcSwapOption::from(None));
        let autocapture = AutoCapture::new(
            &config.autocapture,
            Arc::clone(&params),
            Arc::clone(&latest),
        );
        Self {
            capture_config: config.capture.clone(),
            poll_interval: Duration::from_millis(config.capture.poll_interval_ms),
            params,
            latest,
            sink,
            autocapture,
            session: None,
        }
    }

    /// Shared parameter store; the operator UI writes through this
    pub fn params(&self) -> Arc<ParamStore> {
        Arc::clone(&self.params)
    }

    pub fn autocapture(&self) -> &AutoCapture {
        &self.autocapture
    }

    /// Open the camera and start the session; open failure is surfaced to
    /// the operator and nothing is started
    pub fn start_session(&mut self, device_index: u32) -> Result<(), Error> {
        let source = V4l2Source::open(device_index, &self.capture_config)?;
        self.start_session_with_source(Box::new(source));
        Ok(())
    }

    /// Start with an injected source (tests, alternative camera backends)
    pub fn start_session_with_source(&mut self, source: Box<dyn FrameSource>) {
        self.stop_session();
        info!("Starting capture session");
        self.session = Some(capture_loop::spawn(
            source,
            Arc::clone(&self.params),
            Arc::clone(&self.latest),
            Arc::clone(&self.sink),
            self.poll_interval,
        ));
        // scheduler restarts with its last-configured period
        self.autocapture.start();
    }

    /// Idempotent teardown: signals the loop, joins its thread (which
    /// releases the camera), stops the scheduler, drops the held frame
    pub fn stop_session(&mut self) {
        if let Some(mut handle) = self.session.take() {
            info!("Stopping capture session");
            handle.stop();
        }
        self.autocapture.stop();
        self.latest.store(None);
    }

    /// Stop-then-start, e.g. on camera swap or manual restart
    pub fn refresh_session(&mut self, device_index: u32) -> Result<(), Error> {
        self.stop_session();
        self.start_session(device_index)
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().map(|s| s.is_running()).unwrap_or(false)
    }

    /// Manual capture: enhance the latest raw frame and write it as
    /// `screenshot_{timestamp}.png`; unlike auto-capture, failures surface
    pub fn capture_still(&self) -> Result<PathBuf, Error> {
        let dir = self
            .autocapture
            .save_dir()
            .ok_or_else(|| Error::InvalidConfig("no save directory configured".into()))?;
        let raw = self.latest.load_full().ok_or(Error::NoFrame)?;

        let working = (*raw).clone();
        let snapshot = self.params.snapshot();
        let enhanced = enhance::enhance(&working, &snapshot);
        persist::save_png(&enhanced, &dir, "screenshot")
    }
}
