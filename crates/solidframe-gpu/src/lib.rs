//! Vulkan backend for the Solidframe frame pipeline.
//!
//! This crate provides:
//! - Vulkan instance and device management
//! - GPU capability detection
//! - Window surface and swapchain handling
//! - The command recording, graphics queue and timeline fence the renderer drives

pub mod backend;
pub mod capabilities;
pub mod command;
pub mod context;
pub mod error;
pub mod instance;
pub mod queue;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use backend::VulkanBackend;
pub use capabilities::{GpuCapabilities, GpuVendor};
pub use command::{CommandPool, FrameCommands};
pub use context::{GpuContext, GpuContextBuilder};
pub use error::{GpuError, Result};
pub use queue::GraphicsQueue;
pub use surface::{SurfaceCapabilities, SurfaceContext};
pub use swapchain::{Swapchain, SwapchainConfig, SwapchainTarget};
pub use sync::{create_semaphore, create_semaphores, create_timeline_semaphore, TimelineSemaphore};
