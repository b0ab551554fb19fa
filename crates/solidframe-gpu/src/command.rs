//! Command pool and command buffer recording.

use std::sync::Arc;

use crate::error::{self, Result};
use crate::swapchain::SwapchainTarget;
use ash::vk;
use solidframe_core::{BufferState, ClearColor, CommandRecording, Transition};

/// Command pool for allocating command buffers.
pub struct CommandPool {
    pool: vk::CommandPool,
}

impl CommandPool {
    /// Create a new command pool.
    ///
    /// # Safety
    /// The device must be valid and the queue family must exist.
    pub unsafe fn new(
        device: &ash::Device,
        queue_family: u32,
        flags: vk::CommandPoolCreateFlags,
    ) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(flags);

        let pool = device.create_command_pool(&create_info, None)?;

        Ok(Self { pool })
    }

    /// Allocate a single command buffer.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn allocate_command_buffer(
        &self,
        device: &ash::Device,
        level: vk::CommandBufferLevel,
    ) -> Result<vk::CommandBuffer> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(level)
            .command_buffer_count(1);

        let buffers = device.allocate_command_buffers(&alloc_info)?;
        Ok(buffers[0])
    }

    /// Reset the command pool, returning every buffer to the initial state.
    ///
    /// # Safety
    /// The device must be valid and all command buffers from this pool must not be in use.
    pub unsafe fn reset(
        &self,
        device: &ash::Device,
        flags: vk::CommandPoolResetFlags,
    ) -> std::result::Result<(), vk::Result> {
        device.reset_command_pool(self.pool, flags)
    }

    /// Destroy the command pool.
    ///
    /// # Safety
    /// The device must be valid and the pool must not be in use.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        device.destroy_command_pool(self.pool, None);
    }
}

/// Image layout standing for a logical back-buffer state.
///
/// Back-buffer contents are discarded between frames, so leaving the
/// presentable state uses `UNDEFINED` as the old layout. This is also the
/// only valid choice for an image's first use.
pub fn layout_for(state: BufferState, as_source: bool) -> vk::ImageLayout {
    match state {
        BufferState::Presentable if as_source => vk::ImageLayout::UNDEFINED,
        BufferState::Presentable => vk::ImageLayout::PRESENT_SRC_KHR,
        BufferState::RenderTarget => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
    }
}

/// Build the image barrier for a back-buffer transition.
pub fn transition_barrier(
    image: vk::Image,
    transition: Transition,
) -> vk::ImageMemoryBarrier2<'static> {
    let (src_stage, src_access, dst_stage, dst_access) = match transition.after {
        BufferState::RenderTarget => (
            vk::PipelineStageFlags2::ALL_TRANSFER,
            vk::AccessFlags2::NONE,
            vk::PipelineStageFlags2::CLEAR,
            vk::AccessFlags2::TRANSFER_WRITE,
        ),
        BufferState::Presentable => (
            vk::PipelineStageFlags2::CLEAR,
            vk::AccessFlags2::TRANSFER_WRITE,
            vk::PipelineStageFlags2::BOTTOM_OF_PIPE,
            vk::AccessFlags2::NONE,
        ),
    };

    vk::ImageMemoryBarrier2::default()
        .src_stage_mask(src_stage)
        .src_access_mask(src_access)
        .dst_stage_mask(dst_stage)
        .dst_access_mask(dst_access)
        .old_layout(layout_for(transition.before, true))
        .new_layout(layout_for(transition.after, false))
        .image(image)
        .subresource_range(color_subresource_range())
}

fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// The reusable allocator + command buffer pair for the frame loop.
///
/// Remembers the swapchain semaphores of the image it last targeted so the
/// queue can wait on acquisition and signal presentation.
pub struct FrameCommands {
    device: Arc<ash::Device>,
    pool: CommandPool,
    command_buffer: vk::CommandBuffer,
    target: Option<SwapchainTarget>,
}

impl FrameCommands {
    /// Create the pool and allocate its single primary command buffer.
    ///
    /// # Safety
    /// The device must be valid and outlive the recording.
    pub unsafe fn new(device: Arc<ash::Device>, queue_family: u32) -> Result<Self> {
        let pool = CommandPool::new(&device, queue_family, vk::CommandPoolCreateFlags::TRANSIENT)?;
        let command_buffer = match pool.allocate_command_buffer(&device, vk::CommandBufferLevel::PRIMARY) {
            Ok(cmd) => cmd,
            Err(e) => {
                pool.destroy(&device);
                return Err(e);
            }
        };

        Ok(Self {
            device,
            pool,
            command_buffer,
            target: None,
        })
    }

    /// Get the raw command buffer handle.
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Swapchain image targeted by the last recording.
    pub fn target(&self) -> Option<SwapchainTarget> {
        self.target
    }
}

impl CommandRecording for FrameCommands {
    type Target = SwapchainTarget;

    fn reset(&mut self) -> solidframe_core::Result<()> {
        self.target = None;
        unsafe {
            self.pool
                .reset(&self.device, vk::CommandPoolResetFlags::empty())
                .map_err(error::recording)?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(error::recording)?;
        }
        Ok(())
    }

    fn resource_barrier(&mut self, target: &SwapchainTarget, transition: Transition) {
        self.target = Some(*target);
        let barrier = transition_barrier(target.image, transition);
        let dependency_info =
            vk::DependencyInfo::default().image_memory_barriers(std::slice::from_ref(&barrier));
        unsafe {
            self.device
                .cmd_pipeline_barrier2(self.command_buffer, &dependency_info);
        }
    }

    fn clear_render_target(&mut self, target: &SwapchainTarget, color: ClearColor) {
        self.target = Some(*target);
        let clear_value = vk::ClearColorValue {
            float32: color.to_array(),
        };
        let range = color_subresource_range();
        unsafe {
            self.device.cmd_clear_color_image(
                self.command_buffer,
                target.image,
                layout_for(BufferState::RenderTarget, false),
                &clear_value,
                std::slice::from_ref(&range),
            );
        }
    }

    fn close(&mut self) -> solidframe_core::Result<()> {
        unsafe {
            self.device
                .end_command_buffer(self.command_buffer)
                .map_err(error::recording)
        }
    }
}

impl Drop for FrameCommands {
    fn drop(&mut self) {
        unsafe {
            self.pool.destroy(&self.device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_for_states() {
        assert_eq!(
            layout_for(BufferState::Presentable, false),
            vk::ImageLayout::PRESENT_SRC_KHR
        );
        assert_eq!(
            layout_for(BufferState::Presentable, true),
            vk::ImageLayout::UNDEFINED
        );
        assert_eq!(
            layout_for(BufferState::RenderTarget, true),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL
        );
    }

    #[test]
    fn barrier_into_render_target() {
        let barrier = transition_barrier(vk::Image::null(), Transition::TO_RENDER_TARGET);
        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(barrier.dst_access_mask, vk::AccessFlags2::TRANSFER_WRITE);
    }

    #[test]
    fn barrier_back_to_presentable() {
        let barrier = transition_barrier(vk::Image::null(), Transition::TO_PRESENTABLE);
        assert_eq!(barrier.old_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(barrier.new_layout, vk::ImageLayout::PRESENT_SRC_KHR);
        assert_eq!(barrier.src_access_mask, vk::AccessFlags2::TRANSFER_WRITE);
    }
}
