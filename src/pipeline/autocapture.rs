//! Periodic auto-capture scheduler
//!
//! Runs independently of the capture loop: each tick takes the latest raw
//! frame (best-effort), enhances it with current parameters, and writes a
//! timestamped PNG. Persistence failures never stop the timer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::capture::frame::Frame;
use crate::enhance::{self, ParamStore};
use crate::error::Error;
use crate::persist;
use crate::AutoCaptureConfig;

struct Inner {
    params: Arc<ParamStore>,
    latest: Arc<ArcSwapOption<Frame>>,
    period_secs: AtomicU64,
    save_dir: ArcSwapOption<PathBuf>,
}

pub struct AutoCapture {
    inner: Arc<Inner>,
    task: Option<(flume::Sender<()>, tokio::task::JoinHandle<()>)>,
}

impl AutoCapture {
    pub fn new(
        config: &AutoCaptureConfig,
        params: Arc<ParamStore>,
        latest: Arc<ArcSwapOption<Frame>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                params,
                latest,
                period_secs: AtomicU64::new(config.period_secs.max(1)),
                save_dir: ArcSwapOption::from(config.save_dir.clone().map(Arc::new)),
            }),
            task: None,
        }
    }

    /// Reconfigure the period; non-positive input is rejected and the prior
    /// period stays active
    pub fn set_period_secs(&self, secs: i64) -> Result<(), Error> {
        if secs <= 0 {
            return Err(Error::InvalidConfig(format!(
                "auto-capture period must be a positive number of seconds, got {secs}"
            )));
        }
        self.inner.period_secs.store(secs as u64, Ordering::SeqCst);
        Ok(())
    }

    pub fn period_secs(&self) -> u64 {
        self.inner.period_secs.load(Ordering::SeqCst)
    }

    /// Captures are skipped while no directory is configured
    pub fn set_save_dir(&self, dir: Option<PathBuf>) {
        self.inner.save_dir.store(dir.map(Arc::new));
    }

    pub fn save_dir(&self) -> Option<Arc<PathBuf>> {
        self.inner.save_dir.load_full()
    }

    /// (Re)start the timer with the currently configured period
    pub fn start(&mut self) {
        self.stop();
        let inner = Arc::clone(&self.inner);
        let (shutdown_tx, shutdown_rx) = flume::bounded::<()>(1);
        let handle = tokio::spawn(async move {
            info!(
                period_secs = inner.period_secs.load(Ordering::SeqCst),
                "Auto-capture scheduler started"
            );
            loop {
                // Re-read each lap so period changes apply on the next tick
                let period = Duration::from_secs(inner.period_secs.load(Ordering::SeqCst));
                tokio::select! {
                    _ = shutdown_rx.recv_async() => break,
                    _ = tokio::time::sleep(period) => {
                        inner.tick();
                    }
                }
            }
            info!("Auto-capture scheduler stopped");
        });
        self.task = Some((shutdown_tx, handle));
    }

    /// Stop the timer; independent of the capture loop's run state
    pub fn stop(&mut self) {
        if let Some((shutdown_tx, _handle)) = self.task.take() {
            let _ = shutdown_tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Inner {
    /// One scheduler tick; every failure path is logged and swallowed
    fn tick(&self) -> Option<PathBuf> {
        let dir = self.save_dir.load_full()?;
        let raw = match self.latest.load_full() {
            Some(raw) => raw,
            None => {
                debug!("No frame available, skipping auto-capture tick");
                return None;
            }
        };

        let working = (*raw).clone();
        let snapshot = self.params.snapshot();
        let enhanced = enhance::enhance(&working, &snapshot);

        match persist::save_png(&enhanced, &dir, "auto") {
            Ok(path) => {
                info!(path = %path.display(), "Auto-capture saved");
                Some(path)
            }
            Err(e) => {
                counter!("autocapture_failures_total").increment(1);
                warn!("Auto-capture failed: {e}");
                None
            }
        }
    }
}
