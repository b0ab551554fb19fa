//! Graphics queue submission.

use std::sync::Arc;

use crate::command::FrameCommands;
use crate::error;
use crate::sync::TimelineSemaphore;
use ash::vk;
use solidframe_core::{CommandQueue, FrameError, SignalValue};

/// The device's graphics queue.
///
/// Executes recorded frames and signals the frame fence once everything
/// submitted before the signal has finished.
pub struct GraphicsQueue {
    device: Arc<ash::Device>,
    queue: vk::Queue,
}

impl GraphicsQueue {
    /// Wrap a queue retrieved from `device`.
    pub fn new(device: Arc<ash::Device>, queue: vk::Queue) -> Self {
        Self { device, queue }
    }
}

impl CommandQueue for GraphicsQueue {
    type Recording = FrameCommands;
    type Fence = TimelineSemaphore;

    fn execute(&mut self, recording: &FrameCommands) -> solidframe_core::Result<()> {
        let target = recording.target().ok_or_else(|| {
            FrameError::Submission("recording does not target a back buffer".to_string())
        })?;

        // The clear may not start before the image is released by the presentation engine
        let wait_semaphores = [target.acquire];
        let wait_stages = [vk::PipelineStageFlags::TRANSFER];
        let signal_semaphores = [target.present];
        let command_buffers = [recording.command_buffer()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(self.queue, std::slice::from_ref(&submit_info), vk::Fence::null())
                .map_err(error::submission)
        }
    }

    fn signal(&mut self, fence: &TimelineSemaphore, value: SignalValue) -> solidframe_core::Result<()> {
        let signal_values = [value.0];
        let signal_semaphores = [fence.handle()];
        let mut timeline_info =
            vk::TimelineSemaphoreSubmitInfo::default().signal_semaphore_values(&signal_values);

        let submit_info = vk::SubmitInfo::default()
            .signal_semaphores(&signal_semaphores)
            .push_next(&mut timeline_info);

        unsafe {
            self.device
                .queue_submit(self.queue, std::slice::from_ref(&submit_info), vk::Fence::null())
                .map_err(error::submission)
        }
    }
}
