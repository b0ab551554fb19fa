//! The owning context that drives one frame at a time.

use std::time::Instant;

use tracing::{debug, info};

use crate::backend::{Backend, BackendParts};
use crate::error::Result;
use crate::fence::FenceSynchronizer;
use crate::recorder::FrameRecorder;
use crate::stats::FrameStats;
use crate::submit::SubmissionController;
use crate::swapchain::SwapchainManager;
use crate::types::{ClearColor, FrameIndex, SignalValue};

/// Outcome of one rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Back buffer that was cleared and presented.
    pub frame_index: FrameIndex,
    /// Fence value signaled after the frame's work.
    pub signal: SignalValue,
    /// Whether the fence wait had to block.
    pub blocked: bool,
}

/// Owns every frame pipeline component for one window.
///
/// Exactly one command recording is in use, so each frame waits for the GPU
/// before the next one is recorded.
pub struct Renderer<B: Backend> {
    swapchain: SwapchainManager<B::Surface>,
    recorder: FrameRecorder<B::Recording>,
    submitter: SubmissionController,
    fence: FenceSynchronizer<B::Fence>,
    queue: B::Queue,
    clear_color: ClearColor,
    stats: FrameStats,
    paused: bool,
}

impl<B: Backend> Renderer<B> {
    /// Assemble the pipeline from a backend's objects.
    pub fn new(parts: BackendParts<B>, clear_color: ClearColor) -> Result<Self> {
        let swapchain = SwapchainManager::new(parts.surface)?;
        info!(
            "Renderer ready: {} back buffers, clear color {:?}",
            swapchain.buffer_count(),
            clear_color.to_array()
        );

        Ok(Self {
            swapchain,
            recorder: FrameRecorder::new(parts.recording),
            submitter: SubmissionController::new(),
            fence: FenceSynchronizer::new(parts.fence),
            queue: parts.queue,
            clear_color,
            stats: FrameStats::new(),
            paused: false,
        })
    }

    /// Record, submit, present and wait for one frame.
    ///
    /// Returns `None` while the window is minimized.
    pub fn render_frame(&mut self) -> Result<Option<FrameReport>> {
        if self.paused {
            return Ok(None);
        }

        let frame_index = self.swapchain.current_index()?;

        self.recorder.record(
            &self.fence,
            &mut self.swapchain,
            frame_index,
            self.clear_color,
        )?;

        let ticket = self.submitter.submit(&mut self.queue, &mut self.recorder)?;
        self.submitter.present(&mut self.swapchain, frame_index)?;

        let signal = self.fence.signal_after(&mut self.queue, ticket)?;
        let blocked_before = self.fence.blocked_waits();
        self.fence.wait_until(signal)?;
        let blocked = self.fence.blocked_waits() > blocked_before;

        self.stats.record_frame(Instant::now(), blocked);

        Ok(Some(FrameReport {
            frame_index,
            signal,
            blocked,
        }))
    }

    /// React to a window size change.
    ///
    /// A zero-sized window pauses rendering until a non-zero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            debug!("Window minimized, pausing");
            self.paused = true;
            return Ok(());
        }

        self.wait_idle()?;
        self.swapchain.resize(width, height)?;
        self.paused = false;
        info!("Resized to {}x{}", width, height);
        Ok(())
    }

    /// Wait for all signaled work and report statistics.
    pub fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down renderer...");
        self.wait_idle()?;
        self.stats.log_summary();
        Ok(())
    }

    /// Block until the last signaled value completes.
    pub fn wait_idle(&mut self) -> Result<()> {
        let last = self.fence.last_signaled();
        self.fence.wait_until(last)
    }

    /// Whether rendering is paused for a minimized window.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn clear_color(&self) -> ClearColor {
        self.clear_color
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn swapchain(&self) -> &SwapchainManager<B::Surface> {
        &self.swapchain
    }

    pub fn fence(&self) -> &FenceSynchronizer<B::Fence> {
        &self.fence
    }

    pub fn queue(&self) -> &B::Queue {
        &self.queue
    }

    pub fn recording(&self) -> &B::Recording {
        self.recorder.recording()
    }

    /// Number of recordings submitted so far.
    pub fn submitted(&self) -> u64 {
        self.submitter.submitted()
    }
}
