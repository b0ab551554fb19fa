//! Backend-agnostic frame pipeline for the Solidframe renderer.
//!
//! This crate provides:
//! - The frame data model (back buffers, clear color, fence values)
//! - Traits a graphics backend implements
//! - Swapchain management, command recording, submission and fence synchronization
//! - The owning [`Renderer`] and the window-message driven [`run`] loop

pub mod backend;
pub mod error;
pub mod event;
pub mod fence;
pub mod recorder;
pub mod renderer;
pub mod stats;
pub mod submit;
pub mod swapchain;
pub mod types;

pub use backend::{
    Backend, BackendParts, CommandQueue, CommandRecording, PresentationSurface, TimelineFence,
};
pub use error::{FrameError, Result};
pub use event::{run, EventSource, RunSummary, WindowMessage, PAUSED_POLL_INTERVAL};
pub use fence::FenceSynchronizer;
pub use recorder::FrameRecorder;
pub use renderer::{FrameReport, Renderer};
pub use stats::FrameStats;
pub use submit::SubmissionController;
pub use swapchain::{BackBuffer, SwapchainManager};
pub use types::{BufferState, ClearColor, FrameIndex, SignalValue, SubmissionTicket, Transition};

/// Pipeline-wide constants.
pub mod constants {
    /// Back buffers requested from the presentation surface.
    pub const BACK_BUFFER_COUNT: u32 = 2;
    /// Default window width.
    pub const DEFAULT_WIDTH: u32 = 1280;
    /// Default window height.
    pub const DEFAULT_HEIGHT: u32 = 720;
}
