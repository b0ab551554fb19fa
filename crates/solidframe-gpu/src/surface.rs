//! Surface management for windowed rendering.
//!
//! Provides abstractions for Vulkan surface creation and management,
//! hiding the raw-window-handle complexity from application code.

use crate::context::GpuContext;
use crate::error::{GpuError, Result};
use crate::swapchain::{Swapchain, SwapchainConfig};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Surface context for windowed rendering.
///
/// Must outlive every swapchain created from it.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
}

impl SurfaceContext {
    /// Create a new surface context from a window.
    ///
    /// # Safety
    /// The GPU context must be valid and the window must have valid handles
    /// that outlive the surface.
    pub unsafe fn from_window<W>(gpu: &GpuContext, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

        let surface = ash_window::create_surface(
            gpu.entry(),
            gpu.instance(),
            display.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

        let surface_loader = ash::khr::surface::Instance::new(gpu.entry(), gpu.instance());

        // The selected queue must be able to present to this window
        let supported = surface_loader
            .get_physical_device_surface_support(
                gpu.physical_device(),
                gpu.graphics_queue_family(),
                surface,
            )
            .unwrap_or(false);
        if !supported {
            surface_loader.destroy_surface(surface, None);
            return Err(GpuError::SurfaceCreation(
                "graphics queue cannot present to this window".to_string(),
            ));
        }

        Ok(Self {
            surface,
            surface_loader,
        })
    }

    /// Create a swapchain for this surface.
    ///
    /// # Safety
    /// The GPU context must be valid and must outlive the swapchain.
    pub unsafe fn create_swapchain(
        &self,
        gpu: &GpuContext,
        config: SwapchainConfig,
    ) -> Result<Swapchain> {
        Swapchain::new(gpu, self, config)
    }
}

impl Drop for SurfaceContext {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

/// Surface capabilities query result.
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

pub(crate) fn query_capabilities(
    surface_loader: &ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<SurfaceCapabilities> {
    unsafe {
        let capabilities =
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?;
        let formats = surface_loader.get_physical_device_surface_formats(physical_device, surface)?;
        let present_modes =
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?;

        Ok(SurfaceCapabilities {
            capabilities,
            formats,
            present_modes,
        })
    }
}
