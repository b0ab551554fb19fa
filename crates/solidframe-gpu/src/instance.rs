//! Vulkan instance creation and adapter selection.

use crate::capabilities::GpuCapabilities;
use crate::error::{GpuError, Result};
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

/// Instance extensions needed to present to windows on `display`.
///
/// Without a display only the extensions required on every platform are
/// returned.
pub fn required_instance_extensions(
    display: Option<RawDisplayHandle>,
) -> Result<Vec<*const c_char>> {
    let extensions = match display {
        Some(display) => ash_window::enumerate_required_extensions(display)?.to_vec(),
        None => Vec::new(),
    };

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let extensions = {
        let mut extensions = extensions;
        extensions.push(ash::khr::portability_enumeration::NAME.as_ptr());
        extensions
    };

    Ok(extensions)
}

/// Validation layers to enable in debug builds.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![c"VK_LAYER_KHRONOS_validation"]
}

/// Create a Vulkan instance.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    enable_validation: bool,
    display: Option<RawDisplayHandle>,
) -> Result<ash::Instance> {
    let app_name = CString::new(app_name)
        .map_err(|e| GpuError::Loading(format!("Invalid application name: {e}")))?;
    let engine_name = c"Solidframe";

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);

    let extension_names = required_instance_extensions(display)?;

    let layers = if enable_validation {
        validation_layers()
    } else {
        vec![]
    };

    // Missing layers are skipped rather than failing instance creation
    let available_layers = entry.enumerate_instance_layer_properties()?;
    let layers: Vec<&CStr> = layers
        .into_iter()
        .filter(|layer| {
            let found = available_layers
                .iter()
                .any(|props| CStr::from_ptr(props.layer_name.as_ptr()) == *layer);
            if !found {
                tracing::warn!("Validation layer {:?} not available", layer);
            }
            found
        })
        .collect();

    let layer_names: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None)?;

    Ok(instance)
}

/// The adapter the frame loop runs on.
pub struct SelectedAdapter {
    pub physical_device: vk::PhysicalDevice,
    pub capabilities: GpuCapabilities,
    pub graphics_queue_family: u32,
}

/// Select the first adapter that can run the frame loop.
///
/// Adapters are taken in enumeration order; there is no ranking.
///
/// # Safety
/// The instance must be valid.
pub unsafe fn select_physical_device(instance: &ash::Instance) -> Result<SelectedAdapter> {
    let devices = instance.enumerate_physical_devices()?;

    for device in devices {
        let capabilities = GpuCapabilities::query(instance, device);
        if let Some(graphics_queue_family) = capabilities.frame_queue_family() {
            return Ok(SelectedAdapter {
                physical_device: device,
                capabilities,
                graphics_queue_family,
            });
        }
        tracing::debug!("Skipping adapter {}", capabilities.summary());
    }

    Err(GpuError::NoSuitableDevice)
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use raw_window_handle::XlibDisplayHandle;

    fn names(extensions: &[*const c_char]) -> Vec<&'static CStr> {
        extensions
            .iter()
            .map(|&ext| unsafe { CStr::from_ptr(ext) })
            .collect()
    }

    #[test]
    fn xlib_display_needs_only_xlib_surface() {
        let display = RawDisplayHandle::Xlib(XlibDisplayHandle::new(None, 0));
        let extensions = required_instance_extensions(Some(display)).unwrap();
        let names = names(&extensions);

        assert!(names.contains(&ash::khr::surface::NAME));
        assert!(names.contains(&ash::khr::xlib_surface::NAME));
        assert!(!names.contains(&ash::khr::wayland_surface::NAME));
    }

    #[test]
    fn no_display_needs_no_surface_extensions() {
        assert!(required_instance_extensions(None).unwrap().is_empty());
    }
}
