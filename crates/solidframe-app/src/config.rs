//! Application configuration.

use solidframe_core::constants::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use solidframe_core::ClearColor;
use solidframe_platform::PlatformConfig;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Color every frame is cleared to.
    pub clear_color: ClearColor,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Solidframe".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            clear_color: ClearColor::DEFAULT,
            vsync: true,
            validation: cfg!(debug_assertions),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the clear color.
    pub fn with_clear_color(mut self, color: ClearColor) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable or disable vsync.
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Enable or disable validation layers.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    pub(crate) fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            resizable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 720);
        assert!(config.vsync);
        assert_relative_eq!(config.clear_color.g, 0.2);
        assert_relative_eq!(config.clear_color.b, 0.6);
    }

    #[test]
    fn builder_overrides() {
        let config = AppConfig::new("Test")
            .with_size(640, 480)
            .with_clear_color(ClearColor::new(1.0, 0.0, 0.0, 1.0))
            .with_vsync(false)
            .with_validation(true);

        assert_eq!(config.title, "Test");
        assert_eq!((config.width, config.height), (640, 480));
        assert_relative_eq!(config.clear_color.r, 1.0);
        assert!(!config.vsync);
        assert!(config.validation);

        let platform = config.platform_config();
        assert_eq!(platform.title, "Test");
        assert_eq!((platform.width, platform.height), (640, 480));
    }
}
