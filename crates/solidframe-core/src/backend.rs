//! Traits implemented by a graphics backend.
//!
//! The frame pipeline never talks to a graphics API directly. A backend
//! provides four objects: a presentation surface, one reusable command
//! recording, a command queue and a timeline fence. `solidframe-gpu`
//! implements them on Vulkan; `solidframe-test` implements them in memory.

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::types::{ClearColor, FrameIndex, SignalValue, Transition};

/// A window surface owning a fixed set of presentable back buffers.
pub trait PresentationSurface {
    /// Handle the recorder uses to address one back buffer (its image and view).
    type Target: Copy + fmt::Debug;

    /// Number of back buffers.
    fn buffer_count(&self) -> usize;

    /// The render target of back buffer `index`, or `None` if out of range.
    fn target(&self, index: FrameIndex) -> Option<Self::Target>;

    /// Index of the back buffer the surface will show next.
    ///
    /// Only meaningful after construction or a successful [`present`](Self::present).
    fn current_index(&mut self) -> Result<FrameIndex>;

    /// Queue back buffer `index` for display and advance the surface.
    fn present(&mut self, index: FrameIndex) -> Result<()>;

    /// Recreate the back buffers for a new window size.
    ///
    /// Called only while the GPU is idle.
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;
}

/// An allocator and command buffer pair, reset and refilled every frame.
pub trait CommandRecording {
    /// Back-buffer handle, shared with the [`PresentationSurface`].
    type Target: Copy + fmt::Debug;

    /// Reset the allocator, then the command buffer against it.
    fn reset(&mut self) -> Result<()>;

    /// Record a state transition barrier for `target`.
    fn resource_barrier(&mut self, target: &Self::Target, transition: Transition);

    /// Record a clear of `target`'s render target view.
    fn clear_render_target(&mut self, target: &Self::Target, color: ClearColor);

    /// Seal the recording so it can be submitted.
    fn close(&mut self) -> Result<()>;
}

/// A CPU/GPU timeline fence.
pub trait TimelineFence {
    /// Highest value the GPU has reached.
    fn completed_value(&self) -> Result<u64>;

    /// Arm a wait handle and block until the GPU reaches `value`.
    ///
    /// Returns `false` if `timeout` elapsed first. `None` waits forever.
    fn wait(&self, value: u64, timeout: Option<Duration>) -> Result<bool>;
}

/// The command queue that executes recordings and signals fences.
pub trait CommandQueue {
    /// Recording type accepted by [`execute`](Self::execute).
    type Recording;
    /// Fence type accepted by [`signal`](Self::signal).
    type Fence;

    /// Enqueue a closed recording. Returns before the GPU runs it.
    fn execute(&mut self, recording: &Self::Recording) -> Result<()>;

    /// Enqueue a signal of `fence` to `value` after all previously enqueued work.
    fn signal(&mut self, fence: &Self::Fence, value: SignalValue) -> Result<()>;
}

/// Ties the four backend objects together.
pub trait Backend {
    /// Back-buffer handle.
    type Target: Copy + fmt::Debug;
    /// Presentation surface.
    type Surface: PresentationSurface<Target = Self::Target>;
    /// Command recording.
    type Recording: CommandRecording<Target = Self::Target>;
    /// Timeline fence.
    type Fence: TimelineFence;
    /// Command queue.
    type Queue: CommandQueue<Recording = Self::Recording, Fence = Self::Fence>;
}

/// The objects a backend hands to [`Renderer::new`](crate::Renderer::new).
pub struct BackendParts<B: Backend> {
    pub surface: B::Surface,
    pub recording: B::Recording,
    pub queue: B::Queue,
    pub fence: B::Fence,
}
