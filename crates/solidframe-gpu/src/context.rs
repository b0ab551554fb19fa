//! Device and queue provider.

use crate::capabilities::GpuCapabilities;
use crate::error::{GpuError, Result};
use crate::instance::{create_instance, select_physical_device, SelectedAdapter};
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::sync::Arc;

/// Logical device and its single graphics queue.
///
/// Created once at startup and kept for the lifetime of the program. Every
/// object created from it must be dropped before it.
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: Arc<ash::Device>,
    pub(crate) capabilities: GpuCapabilities,
    pub(crate) graphics_queue_family: u32,
    pub(crate) graphics_queue: vk::Queue,
}

impl GpuContext {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &Arc<ash::Device> {
        &self.device
    }

    /// Get the Vulkan entry point.
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Get adapter capabilities.
    pub fn capabilities(&self) -> &GpuCapabilities {
        &self.capabilities
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Get the graphics queue family index.
    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Builder for creating a GPU context.
pub struct GpuContextBuilder {
    app_name: String,
    enable_validation: bool,
    display: Option<RawDisplayHandle>,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Solidframe".to_string(),
            enable_validation: cfg!(debug_assertions),
            display: None,
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Enable the surface extensions needed for windows on `display`.
    pub fn display(mut self, display: RawDisplayHandle) -> Self {
        self.display = Some(display);
        self
    }

    /// Build the GPU context.
    pub fn build(self) -> Result<GpuContext> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        let instance = unsafe {
            create_instance(&entry, &self.app_name, self.enable_validation, self.display)
        }?;

        // From here on the instance must be destroyed on failure
        let selected = unsafe { select_physical_device(&instance) };
        let SelectedAdapter {
            physical_device,
            capabilities,
            graphics_queue_family,
        } = match selected {
            Ok(selected) => selected,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        tracing::info!("Selected GPU: {}", capabilities.summary());

        let device = match unsafe { create_device(&instance, physical_device, graphics_queue_family) }
        {
            Ok(device) => device,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        let graphics_queue = unsafe { device.get_device_queue(graphics_queue_family, 0) };

        Ok(GpuContext {
            entry,
            instance,
            physical_device,
            device: Arc::new(device),
            capabilities,
            graphics_queue_family,
            graphics_queue,
        })
    }
}

/// Create the logical device with one graphics queue.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    graphics_queue_family: u32,
) -> Result<ash::Device> {
    let queue_priority = 1.0_f32;
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(graphics_queue_family)
        .queue_priorities(std::slice::from_ref(&queue_priority))];

    let extension_names = [ash::khr::swapchain::NAME.as_ptr()];

    // Timeline semaphores back the frame fence; synchronization2 the barriers
    let mut vulkan_1_3_features = vk::PhysicalDeviceVulkan13Features::default().synchronization2(true);
    let mut vulkan_1_2_features =
        vk::PhysicalDeviceVulkan12Features::default().timeline_semaphore(true);

    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .push_next(&mut vulkan_1_3_features)
        .push_next(&mut vulkan_1_2_features);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .push_next(&mut features2);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(GpuError::from)?;

    Ok(device)
}
