//! GPU error types.

use ash::vk;
use solidframe_core::FrameError;
use thiserror::Error;

/// Vulkan setup errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// The Vulkan loader could not be found.
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;

impl From<GpuError> for FrameError {
    fn from(err: GpuError) -> Self {
        Self::Initialization(err.to_string())
    }
}

/// Map a failed presentation call.
pub(crate) fn presentation(err: vk::Result) -> FrameError {
    FrameError::Presentation(err.to_string())
}

/// Map a failed recording call.
pub(crate) fn recording(err: vk::Result) -> FrameError {
    FrameError::Recording(err.to_string())
}

/// Map a failed queue submission.
pub(crate) fn submission(err: vk::Result) -> FrameError {
    FrameError::Submission(err.to_string())
}

/// Map a failed fence query or wait.
pub(crate) fn synchronization(err: vk::Result) -> FrameError {
    FrameError::Synchronization(err.to_string())
}
