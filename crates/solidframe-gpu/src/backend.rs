//! Vulkan implementation of the frame pipeline backend.

use crate::command::FrameCommands;
use crate::context::GpuContext;
use crate::error::Result;
use crate::queue::GraphicsQueue;
use crate::surface::SurfaceContext;
use crate::swapchain::{Swapchain, SwapchainConfig, SwapchainTarget};
use crate::sync::TimelineSemaphore;
use solidframe_core::{Backend, BackendParts};

/// Marker type selecting the Vulkan objects for [`solidframe_core::Renderer`].
pub struct VulkanBackend;

impl Backend for VulkanBackend {
    type Target = SwapchainTarget;
    type Surface = Swapchain;
    type Recording = FrameCommands;
    type Fence = TimelineSemaphore;
    type Queue = GraphicsQueue;
}

impl VulkanBackend {
    /// Create the swapchain, command recording, queue and fence for a window surface.
    ///
    /// # Safety
    /// The GPU context and surface must be valid and outlive the returned parts.
    pub unsafe fn create_parts(
        gpu: &GpuContext,
        surface: &SurfaceContext,
        config: SwapchainConfig,
    ) -> Result<BackendParts<Self>> {
        let swapchain = surface.create_swapchain(gpu, config)?;
        let recording = FrameCommands::new(gpu.device().clone(), gpu.graphics_queue_family())?;
        let fence = TimelineSemaphore::new(gpu.device().clone())?;
        let queue = GraphicsQueue::new(gpu.device().clone(), gpu.graphics_queue());

        Ok(BackendParts {
            surface: swapchain,
            recording,
            queue,
            fence,
        })
    }
}
