//! Per-frame command recording.

use tracing::trace;

use crate::backend::{CommandRecording, PresentationSurface, TimelineFence};
use crate::error::{FrameError, Result};
use crate::fence::FenceSynchronizer;
use crate::swapchain::SwapchainManager;
use crate::types::{BufferState, ClearColor, FrameIndex};

/// Where the single recording is in its reuse cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RecordingState {
    /// Reset or never used.
    Empty,
    /// Closed against a back buffer, not yet submitted.
    Closed(FrameIndex),
    /// Enqueued as submission `n`; must not be reset until the fence confirms it.
    Submitted(u64),
}

/// Builds the clear command sequence for one frame.
///
/// Owns the one command recording shared by every frame.
pub struct FrameRecorder<R> {
    recording: R,
    state: RecordingState,
}

impl<R: CommandRecording> FrameRecorder<R> {
    /// Take ownership of a recording.
    pub fn new(recording: R) -> Self {
        Self {
            recording,
            state: RecordingState::Empty,
        }
    }

    /// The owned recording.
    pub fn recording(&self) -> &R {
        &self.recording
    }

    /// Record a full clear of back buffer `index`.
    ///
    /// Fails with [`FrameError::Recording`] if the previous submission of the
    /// recording has not been confirmed complete by `fence`.
    pub fn record<S, F>(
        &mut self,
        fence: &FenceSynchronizer<F>,
        swapchain: &mut SwapchainManager<S>,
        index: FrameIndex,
        color: ClearColor,
    ) -> Result<&R>
    where
        S: PresentationSurface<Target = R::Target>,
        F: TimelineFence,
    {
        if let RecordingState::Submitted(submission) = self.state {
            if !fence.is_confirmed(submission)? {
                return Err(FrameError::Recording(format!(
                    "submission {submission} may still be executing"
                )));
            }
        }

        let target = swapchain.back_buffer(index)?.target;

        self.recording.reset()?;
        self.state = RecordingState::Empty;

        let to_render_target = swapchain.transition(index, BufferState::RenderTarget)?;
        self.recording.resource_barrier(&target, to_render_target);

        self.recording.clear_render_target(&target, color);

        let to_presentable = swapchain.transition(index, BufferState::Presentable)?;
        self.recording.resource_barrier(&target, to_presentable);

        self.recording.close()?;
        self.state = RecordingState::Closed(index);
        trace!("Recorded clear of back buffer {index} with {target:?}");

        Ok(&self.recording)
    }

    /// The back buffer a closed, unsubmitted recording writes.
    pub(crate) fn closed_for(&self) -> Result<FrameIndex> {
        match self.state {
            RecordingState::Closed(index) => Ok(index),
            RecordingState::Empty => Err(FrameError::Recording(
                "no closed recording to submit".to_string(),
            )),
            RecordingState::Submitted(n) => Err(FrameError::Recording(format!(
                "recording already submitted as submission {n}"
            ))),
        }
    }

    pub(crate) fn mark_submitted(&mut self, submission: u64) {
        self.state = RecordingState::Submitted(submission);
    }
}
