//! Swapchain management.

use std::sync::Arc;

use ash::vk;
use solidframe_core::{FrameError, FrameIndex, PresentationSurface};
use tracing::{debug, info};

use crate::context::GpuContext;
use crate::error::{self, GpuError, Result};
use crate::surface::{query_capabilities, SurfaceContext};
use crate::sync::{create_semaphore, create_semaphores};

/// Requested swapchain shape.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainConfig {
    pub width: u32,
    pub height: u32,
    /// FIFO presentation, one vblank per present.
    pub vsync: bool,
    /// Images to request; clamped to what the surface allows.
    pub buffer_count: u32,
}

/// One swapchain image as seen by the recorder and queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainTarget {
    /// Image index.
    pub index: u32,
    /// The image cleared by the frame.
    pub image: vk::Image,
    /// Signaled by acquisition; the frame's submission waits on it.
    pub acquire: vk::Semaphore,
    /// Signaled by the frame's submission; presentation waits on it.
    pub present: vk::Semaphore,
}

/// Swapchain wrapper.
///
/// The next image is acquired lazily by `current_index`, which the frame loop
/// calls only after the previous frame's fence wait. The acquire semaphore is
/// therefore never reused while a wait on it is pending.
pub struct Swapchain {
    device: Arc<ash::Device>,
    loader: ash::khr::swapchain::Device,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
    queue: vk::Queue,
    queue_family: u32,
    config: SwapchainConfig,

    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::Format,
    extent: vk::Extent2D,
    acquire_semaphore: vk::Semaphore,
    present_semaphores: Vec<vk::Semaphore>,
    acquired: Option<u32>,
}

impl Swapchain {
    /// Create a new swapchain.
    ///
    /// # Safety
    /// The GPU context and surface must be valid and outlive the swapchain.
    pub unsafe fn new(
        gpu: &GpuContext,
        surface: &SurfaceContext,
        config: SwapchainConfig,
    ) -> Result<Self> {
        let mut swapchain = Self {
            device: gpu.device().clone(),
            loader: ash::khr::swapchain::Device::new(gpu.instance(), gpu.device()),
            surface_loader: surface.surface_loader.clone(),
            surface: surface.surface,
            physical_device: gpu.physical_device(),
            queue: gpu.graphics_queue(),
            queue_family: gpu.graphics_queue_family(),
            config,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
            acquire_semaphore: vk::Semaphore::null(),
            present_semaphores: Vec::new(),
            acquired: None,
        };
        swapchain.build(config.width, config.height)?;

        info!(
            "Swapchain created: {}x{} ({} images, {:?})",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.images.len(),
            swapchain.format
        );

        Ok(swapchain)
    }

    /// (Re)create the swapchain and its per-image semaphores.
    ///
    /// # Safety
    /// No previous swapchain resource may be in use by the GPU.
    unsafe fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let caps = query_capabilities(&self.surface_loader, self.physical_device, self.surface)?;
        if caps.formats.is_empty() {
            return Err(GpuError::SwapchainCreation(
                "surface reports no formats".to_string(),
            ));
        }

        let surface_format = select_surface_format(&caps.formats);
        let present_mode = select_present_mode(&caps.present_modes, self.config.vsync);
        let extent = calculate_extent(&caps.capabilities, width, height);
        let image_count = select_image_count(&caps.capabilities, self.config.buffer_count);

        let old_swapchain = self.swapchain;
        let queue_families = [self.queue_family];
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_families)
            .pre_transform(caps.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = self
            .loader
            .create_swapchain(&create_info, None)
            .map_err(|e| GpuError::SwapchainCreation(e.to_string()))?;

        self.destroy_owned();

        self.swapchain = swapchain;
        self.images = self.loader.get_swapchain_images(swapchain)?;
        self.format = surface_format.format;
        self.extent = extent;
        self.acquire_semaphore = create_semaphore(&self.device)?;
        self.present_semaphores = create_semaphores(&self.device, self.images.len())?;
        self.acquired = None;

        Ok(())
    }

    /// Destroy the swapchain and semaphores currently held.
    unsafe fn destroy_owned(&mut self) {
        for semaphore in self.present_semaphores.drain(..) {
            self.device.destroy_semaphore(semaphore, None);
        }
        if self.acquire_semaphore != vk::Semaphore::null() {
            self.device.destroy_semaphore(self.acquire_semaphore, None);
            self.acquire_semaphore = vk::Semaphore::null();
        }
        if self.swapchain != vk::SwapchainKHR::null() {
            self.loader.destroy_swapchain(self.swapchain, None);
            self.swapchain = vk::SwapchainKHR::null();
        }
        self.images.clear();
    }
}

impl PresentationSurface for Swapchain {
    type Target = SwapchainTarget;

    fn buffer_count(&self) -> usize {
        self.images.len()
    }

    fn target(&self, index: FrameIndex) -> Option<SwapchainTarget> {
        let i = index.as_usize();
        Some(SwapchainTarget {
            index: index.0,
            image: *self.images.get(i)?,
            acquire: self.acquire_semaphore,
            present: *self.present_semaphores.get(i)?,
        })
    }

    fn current_index(&mut self) -> solidframe_core::Result<FrameIndex> {
        if let Some(index) = self.acquired {
            return Ok(FrameIndex(index));
        }

        let (index, suboptimal) = unsafe {
            self.loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.acquire_semaphore,
                vk::Fence::null(),
            )
        }
        .map_err(error::presentation)?;

        if suboptimal {
            debug!("Acquired suboptimal swapchain image {index}");
        }
        self.acquired = Some(index);
        Ok(FrameIndex(index))
    }

    fn present(&mut self, index: FrameIndex) -> solidframe_core::Result<()> {
        if self.acquired != Some(index.0) {
            return Err(FrameError::Presentation(format!(
                "image {index} was not acquired"
            )));
        }

        let swapchains = [self.swapchain];
        let image_indices = [index.0];
        let wait_semaphores = [self.present_semaphores[index.as_usize()]];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.loader.queue_present(self.queue, &present_info) };
        self.acquired = None;

        match result {
            Ok(false) => Ok(()),
            Ok(true) => {
                debug!("Presented to a suboptimal swapchain");
                Ok(())
            }
            Err(e) => Err(error::presentation(e)),
        }
    }

    fn resize(&mut self, width: u32, height: u32) -> solidframe_core::Result<()> {
        unsafe {
            // Pending presents still reference the old semaphores
            self.device
                .queue_wait_idle(self.queue)
                .map_err(error::presentation)?;
            self.build(width, height)
                .map_err(|e| FrameError::Presentation(e.to_string()))?;
        }

        info!(
            "Swapchain recreated: {}x{}",
            self.extent.width, self.extent.height
        );
        Ok(())
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.queue_wait_idle(self.queue);
            self.destroy_owned();
        }
    }
}

/// Select an 8-bit UNORM surface format.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    for preferred in [vk::Format::R8G8B8A8_UNORM, vk::Format::B8G8R8A8_UNORM] {
        if let Some(format) = available.iter().find(|f| {
            f.format == preferred && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        }) {
            return *format;
        }
    }

    // Fall back to first available
    available[0]
}

/// Select the present mode.
pub fn select_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        vk::PresentModeKHR::FIFO
    } else {
        for &mode in available {
            if mode == vk::PresentModeKHR::MAILBOX {
                return mode;
            }
        }
        for &mode in available {
            if mode == vk::PresentModeKHR::IMMEDIATE {
                return mode;
            }
        }
        // Fall back to FIFO (always supported)
        vk::PresentModeKHR::FIFO
    }
}

/// Clamp the requested image count to the surface limits.
pub fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR, requested: u32) -> u32 {
    let mut count = requested.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        count = count.min(capabilities.max_image_count);
    }
    count
}

/// Calculate swapchain extent.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired_width: u32,
    desired_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: desired_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn prefers_rgba_unorm() {
        let available = [
            format(vk::Format::B8G8R8A8_SRGB),
            format(vk::Format::B8G8R8A8_UNORM),
            format(vk::Format::R8G8B8A8_UNORM),
        ];
        assert_eq!(
            select_surface_format(&available).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn falls_back_to_bgra_then_first() {
        let bgra = [
            format(vk::Format::B8G8R8A8_SRGB),
            format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(
            select_surface_format(&bgra).format,
            vk::Format::B8G8R8A8_UNORM
        );

        let other = [format(vk::Format::A2B10G10R10_UNORM_PACK32)];
        assert_eq!(
            select_surface_format(&other).format,
            vk::Format::A2B10G10R10_UNORM_PACK32
        );
    }

    #[test]
    fn vsync_uses_fifo() {
        let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];
        assert_eq!(select_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
        assert_eq!(select_present_mode(&modes, false), vk::PresentModeKHR::MAILBOX);
        assert_eq!(
            select_present_mode(&[vk::PresentModeKHR::FIFO], false),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn image_count_respects_limits() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(select_image_count(&caps, 2), 2);

        let needs_three = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(select_image_count(&needs_three, 2), 3);

        let single = vk::SurfaceCapabilitiesKHR {
            min_image_count: 1,
            max_image_count: 1,
            ..Default::default()
        };
        assert_eq!(select_image_count(&single, 2), 1);
    }

    #[test]
    fn extent_follows_surface_when_fixed() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
            ..Default::default()
        };
        assert_eq!(
            calculate_extent(&caps, 640, 480),
            vk::Extent2D {
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn extent_clamped_when_free() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 1024,
                height: 1024,
            },
            ..Default::default()
        };
        assert_eq!(
            calculate_extent(&caps, 1280, 720),
            vk::Extent2D {
                width: 1024,
                height: 720
            }
        );
    }
}
