pub mod capture;
pub mod display;
pub mod enhance;
pub mod error;
pub mod persist;
pub mod pipeline;
pub mod utils;

use std::path::PathBuf;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use capture::frame::PixelFormat;
pub use capture::Frame;
pub use enhance::{EnhanceParams, ParamStore};
pub use error::Error;

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<Config>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub enhance: EnhanceParams,
    pub autocapture: AutoCaptureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index (`/dev/video{N}`); `None` auto-detects
    pub device_index: Option<u32>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: PixelFormat,
    /// Pacing of the capture loop between reads
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCaptureConfig {
    /// Seconds between automatic captures
    pub period_secs: u64,
    /// Destination for auto/manual captures; captures are skipped while unset
    pub save_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            enhance: EnhanceParams::default(),
            autocapture: AutoCaptureConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            width: 800,
            height: 600,
            fps: 30,
            format: PixelFormat::Mjpeg,
            poll_interval_ms: 30,
        }
    }
}

impl Default for AutoCaptureConfig {
    fn default() -> Self {
        Self {
            period_secs: 300, // one capture every 5 minutes
            save_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `organoscope.toml` and `ORGANOSCOPE_*`
    /// environment overrides, falling back to defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("organoscope").required(false))
            .add_source(config::Environment::with_prefix("ORGANOSCOPE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = Config::default();
        assert_eq!(config.capture.poll_interval_ms, 30);
        assert_eq!(config.autocapture.period_secs, 300);
        assert!(config.autocapture.save_dir.is_none());
    }
}
