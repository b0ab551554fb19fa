//! Platform layer for Solidframe.
//!
//! Provides window creation and a non-blocking window message source via winit.

mod host;

pub use host::{translate_event, WindowHost};

use solidframe_core::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Solidframe".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            resizable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_resizable_720p() {
        let config = PlatformConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert!(config.resizable);
    }
}
