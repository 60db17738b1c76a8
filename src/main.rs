//! Organoscope acquisition pipeline runner
//!
//! Headless wiring of the capture session: camera in, enhanced frames out to
//! a channel-backed display sink, periodic auto-captures to disk.

use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::{eyre::eyre, Result};
use tracing::{error, info};

use organoscope::display::ChannelSink;
use organoscope::pipeline::SessionController;
use organoscope::{utils, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("organoscope=debug")
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("Organoscope launching...");

    // Load configuration, auto-detecting the capture device if needed
    let mut config = Config::load().map_err(|e| eyre!("configuration error: {e}"))?;
    if config.capture.device_index.is_none() {
        let found = utils::auto_detect_device()
            .ok_or_else(|| eyre!("no suitable capture device found"))?;
        config.capture.device_index = Some(found.index);
        config.capture.format = found.format;
    }
    organoscope::CONFIG.store(Arc::new(config.clone()));

    let device_index = config.capture.device_index.unwrap_or(0);
    info!(device_index, "Using capture device");

    // Start the session: capture loop + auto-capture scheduler
    let (sink, frames) = ChannelSink::new(8);
    let mut controller = SessionController::new(&config, Arc::new(sink));
    controller.start_session(device_index)?;

    // Consume published frames on this side of the channel; a real frontend
    // would render them, the headless runner reports throughput
    let _display_handle = tokio::spawn(async move {
        let mut received = 0u64;
        let mut window_start = Instant::now();
        loop {
            match frames.recv_async().await {
                Ok(frame) => {
                    received += 1;
                    if window_start.elapsed() >= Duration::from_secs(1) {
                        info!(
                            fps = received,
                            sequence = frame.sequence,
                            width = frame.width,
                            height = frame.height,
                            "Display stream"
                        );
                        received = 0;
                        window_start = Instant::now();
                    }
                }
                Err(e) => {
                    error!("Display channel closed: {e}");
                    break;
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Organoscope shutting down");
    controller.stop_session();
    Ok(())
}
