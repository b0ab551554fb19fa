//! Queue submission and presentation.

use tracing::trace;

use crate::backend::{CommandQueue, CommandRecording, PresentationSurface};
use crate::error::Result;
use crate::recorder::FrameRecorder;
use crate::swapchain::SwapchainManager;
use crate::types::{FrameIndex, SubmissionTicket};

/// Submits closed recordings and requests presentation.
#[derive(Debug, Default)]
pub struct SubmissionController {
    submitted: u64,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recordings enqueued so far.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Enqueue the recorder's closed recording.
    ///
    /// Returns as soon as the work is queued; the ticket must be passed to
    /// [`FenceSynchronizer::signal_after`](crate::FenceSynchronizer::signal_after).
    pub fn submit<R, Q>(
        &mut self,
        queue: &mut Q,
        recorder: &mut FrameRecorder<R>,
    ) -> Result<SubmissionTicket>
    where
        R: CommandRecording,
        Q: CommandQueue<Recording = R>,
    {
        let frame_index = recorder.closed_for()?;
        queue.execute(recorder.recording())?;

        self.submitted += 1;
        recorder.mark_submitted(self.submitted);
        trace!("Submission {} enqueued for back buffer {frame_index}", self.submitted);

        Ok(SubmissionTicket {
            submission: self.submitted,
            frame_index,
        })
    }

    /// Present back buffer `index` through the swapchain manager.
    pub fn present<S: PresentationSurface>(
        &self,
        swapchain: &mut SwapchainManager<S>,
        index: FrameIndex,
    ) -> Result<()> {
        swapchain.present(index)
    }
}
