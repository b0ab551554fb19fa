//! Adapter capability detection.

use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// What an adapter offers that the frame loop depends on.
#[derive(Debug, Clone)]
pub struct GpuCapabilities {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Device name
    pub device_name: String,
    /// Vulkan API version
    pub api_version: u32,
    /// Driver version
    pub driver_version: u32,
    /// Discrete, integrated, virtual, CPU...
    pub device_type: vk::PhysicalDeviceType,

    /// Timeline semaphores, used as the frame fence (VK 1.2 core feature)
    pub supports_timeline_semaphores: bool,
    /// Synchronization2 barriers (VK 1.3 core feature)
    pub supports_synchronization2: bool,
    /// First queue family with graphics support
    pub graphics_queue_family: Option<u32>,

    // Available extensions
    pub available_extensions: HashSet<String>,
}

impl GpuCapabilities {
    /// Query capabilities from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();

        let available_extensions: HashSet<String> = extensions
            .iter()
            .filter_map(|ext| {
                CStr::from_ptr(ext.extension_name.as_ptr())
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let vendor = GpuVendor::from_vendor_id(properties.vendor_id);
        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        // The feature chain is only valid to query on 1.3 devices
        let api_version = properties.api_version;
        let (supports_timeline_semaphores, supports_synchronization2) =
            if is_at_least_1_3(api_version) {
                let mut vulkan_1_2_features = vk::PhysicalDeviceVulkan12Features::default();
                let mut vulkan_1_3_features = vk::PhysicalDeviceVulkan13Features::default();
                {
                    let mut features2 = vk::PhysicalDeviceFeatures2::default()
                        .push_next(&mut vulkan_1_2_features)
                        .push_next(&mut vulkan_1_3_features);
                    instance.get_physical_device_features2(physical_device, &mut features2);
                }
                (
                    vulkan_1_2_features.timeline_semaphore == vk::TRUE,
                    vulkan_1_3_features.synchronization2 == vk::TRUE,
                )
            } else {
                (false, false)
            };

        let graphics_queue_family = instance
            .get_physical_device_queue_family_properties(physical_device)
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|i| i as u32);

        Self {
            vendor,
            device_name,
            api_version,
            driver_version: properties.driver_version,
            device_type: properties.device_type,
            supports_timeline_semaphores,
            supports_synchronization2,
            graphics_queue_family,
            available_extensions,
        }
    }

    /// Check if the adapter can run the frame loop.
    pub fn meets_requirements(&self) -> bool {
        is_at_least_1_3(self.api_version)
            && self.supports_timeline_semaphores
            && self.supports_synchronization2
            && self.graphics_queue_family.is_some()
            && self.available_extensions.contains(
                ash::khr::swapchain::NAME
                    .to_str()
                    .unwrap_or("VK_KHR_swapchain"),
            )
    }

    /// Queue family the frame loop runs on, or `None` if the adapter is unusable.
    pub fn frame_queue_family(&self) -> Option<u32> {
        if self.meets_requirements() {
            self.graphics_queue_family
        } else {
            None
        }
    }

    /// Get a human-readable summary of capabilities.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}, {:?}) - Vulkan {}.{}.{}",
            self.device_name,
            self.vendor,
            self.device_type,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

fn is_at_least_1_3(api_version: u32) -> bool {
    let major = vk::api_version_major(api_version);
    let minor = vk::api_version_minor(api_version);
    major > 1 || (major == 1 && minor >= 3)
}
