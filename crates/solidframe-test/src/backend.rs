//! In-memory implementations of the backend traits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use solidframe_core::{
    Backend, BackendParts, ClearColor, CommandQueue, CommandRecording, FrameError, FrameIndex,
    PresentationSurface, Renderer, SignalValue, TimelineFence, Transition,
};

use crate::gpu::{FakeGpu, FenceCell};
use crate::log::{Event, EventLog};

/// A fake back buffer: its index and a view handle unique to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FakeTarget {
    pub buffer: u32,
    pub view: u64,
}

/// Base of the fake view handles. Each resize moves to a new generation.
const VIEW_BASE: u64 = 0x1000;
const VIEW_GENERATION_STRIDE: u64 = 0x100;

/// Surface with a fixed buffer count and an optional scripted index sequence.
///
/// Without a script the current index rotates through the buffers.
pub struct FakeSurface {
    log: EventLog,
    buffer_count: u32,
    script: Vec<u32>,
    presented: usize,
    generation: u64,
    fail_present_at: Option<usize>,
}

impl FakeSurface {
    /// Number of successful presents.
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Number of resizes.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl PresentationSurface for FakeSurface {
    type Target = FakeTarget;

    fn buffer_count(&self) -> usize {
        self.buffer_count as usize
    }

    fn target(&self, index: FrameIndex) -> Option<FakeTarget> {
        (index.0 < self.buffer_count).then(|| FakeTarget {
            buffer: index.0,
            view: VIEW_BASE + self.generation * VIEW_GENERATION_STRIDE + u64::from(index.0),
        })
    }

    fn current_index(&mut self) -> solidframe_core::Result<FrameIndex> {
        let index = if self.script.is_empty() {
            (self.presented % self.buffer_count as usize) as u32
        } else {
            self.script[self.presented % self.script.len()]
        };
        self.log.record(Event::Acquire { index });
        Ok(FrameIndex(index))
    }

    fn present(&mut self, index: FrameIndex) -> solidframe_core::Result<()> {
        if self.fail_present_at == Some(self.presented) {
            return Err(FrameError::Presentation(format!(
                "surface lost while presenting {index}"
            )));
        }
        self.log.record(Event::Present { index: index.0 });
        self.presented += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> solidframe_core::Result<()> {
        self.log.record(Event::Resize { width, height });
        self.generation += 1;
        Ok(())
    }
}

/// A command list that logs what it records.
#[derive(Debug)]
pub struct FakeRecording {
    log: EventLog,
    commands: Vec<Event>,
    open: bool,
    resets: u64,
}

impl FakeRecording {
    /// Commands recorded since the last reset.
    pub fn commands(&self) -> &[Event] {
        &self.commands
    }

    /// Whether the recording was reset and not yet closed.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of resets.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Last target addressed by a recorded command.
    pub fn target(&self) -> Option<FakeTarget> {
        self.commands.iter().rev().find_map(|command| match command {
            Event::Barrier { target, .. } | Event::Clear { target, .. } => Some(*target),
            _ => None,
        })
    }

    fn push(&mut self, event: Event) {
        self.log.record(event);
        self.commands.push(event);
    }
}

impl CommandRecording for FakeRecording {
    type Target = FakeTarget;

    fn reset(&mut self) -> solidframe_core::Result<()> {
        self.log.record(Event::Reset);
        self.commands.clear();
        self.open = true;
        self.resets += 1;
        Ok(())
    }

    fn resource_barrier(&mut self, target: &FakeTarget, transition: Transition) {
        self.push(Event::Barrier {
            target: *target,
            transition,
        });
    }

    fn clear_render_target(&mut self, target: &FakeTarget, color: ClearColor) {
        self.push(Event::Clear {
            target: *target,
            color,
        });
    }

    fn close(&mut self) -> solidframe_core::Result<()> {
        if !self.open {
            return Err(FrameError::Recording(
                "close called on a recording that is not open".to_string(),
            ));
        }
        self.log.record(Event::Close);
        self.open = false;
        Ok(())
    }
}

/// A timeline fence advanced by the fake GPU thread.
pub struct FakeFence {
    log: EventLog,
    cell: Arc<FenceCell>,
}

impl FakeFence {
    pub(crate) fn cell(&self) -> Arc<FenceCell> {
        self.cell.clone()
    }
}

impl TimelineFence for FakeFence {
    fn completed_value(&self) -> solidframe_core::Result<u64> {
        Ok(self.cell.completed())
    }

    fn wait(&self, value: u64, timeout: Option<Duration>) -> solidframe_core::Result<bool> {
        self.log.record(Event::WaitArmed { value });
        let deadline = timeout.map(|t| Instant::now() + t);
        let reached = self.cell.wait_for(value, deadline);
        self.log.record(Event::WaitReturned { value, reached });
        Ok(reached)
    }
}

/// A queue feeding the fake GPU thread.
pub struct FakeQueue {
    log: EventLog,
    gpu: FakeGpu,
    submissions: u64,
}

impl FakeQueue {
    /// Number of recordings executed.
    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    /// Keep the fake GPU from executing anything queued from now on.
    pub fn hold_gpu(&self) {
        self.gpu.hold();
    }

    /// Let the fake GPU catch up with queued work.
    pub fn release_gpu(&self) {
        self.gpu.release();
    }
}

impl CommandQueue for FakeQueue {
    type Recording = FakeRecording;
    type Fence = FakeFence;

    fn execute(&mut self, recording: &FakeRecording) -> solidframe_core::Result<()> {
        if recording.is_open() {
            return Err(FrameError::Submission(
                "recording was not closed".to_string(),
            ));
        }

        let submission = self.submissions + 1;
        self.log.record(Event::Execute {
            submission,
            target: recording.target(),
        });
        if !self.gpu.execute(submission) {
            return Err(FrameError::Submission("fake GPU is gone".to_string()));
        }
        self.submissions = submission;
        Ok(())
    }

    fn signal(&mut self, fence: &FakeFence, value: SignalValue) -> solidframe_core::Result<()> {
        self.log.record(Event::Signal { value: value.0 });
        if !self.gpu.signal(fence.cell(), value.0) {
            return Err(FrameError::Submission("fake GPU is gone".to_string()));
        }
        Ok(())
    }
}

/// Selects the fakes for [`Renderer`].
pub struct FakeBackend;

impl Backend for FakeBackend {
    type Target = FakeTarget;
    type Surface = FakeSurface;
    type Recording = FakeRecording;
    type Fence = FakeFence;
    type Queue = FakeQueue;
}

/// Configures a fake device.
#[derive(Clone, Debug)]
pub struct HarnessBuilder {
    buffer_count: u32,
    script: Vec<u32>,
    gpu_latency: Duration,
    fail_present_at: Option<usize>,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            buffer_count: solidframe_core::constants::BACK_BUFFER_COUNT,
            script: Vec::new(),
            gpu_latency: Duration::ZERO,
            fail_present_at: None,
        }
    }
}

impl HarnessBuilder {
    /// Number of back buffers.
    pub fn buffers(mut self, count: u32) -> Self {
        self.buffer_count = count;
        self
    }

    /// Indices the surface reports, repeated once exhausted.
    pub fn script(mut self, indices: impl IntoIterator<Item = u32>) -> Self {
        self.script = indices.into_iter().collect();
        self
    }

    /// Time the fake GPU spends on each execution.
    pub fn gpu_latency(mut self, latency: Duration) -> Self {
        self.gpu_latency = latency;
        self
    }

    /// Make the `n`th present (zero-based) fail.
    pub fn fail_present_at(mut self, n: usize) -> Self {
        self.fail_present_at = Some(n);
        self
    }

    /// Create the fakes, all logging into one shared log.
    pub fn build(self) -> Harness {
        let log = EventLog::new();

        let parts = BackendParts {
            surface: FakeSurface {
                log: log.clone(),
                buffer_count: self.buffer_count,
                script: self.script,
                presented: 0,
                generation: 0,
                fail_present_at: self.fail_present_at,
            },
            recording: FakeRecording {
                log: log.clone(),
                commands: Vec::new(),
                open: false,
                resets: 0,
            },
            queue: FakeQueue {
                log: log.clone(),
                gpu: FakeGpu::spawn(log.clone(), self.gpu_latency),
                submissions: 0,
            },
            fence: FakeFence {
                log: log.clone(),
                cell: Arc::new(FenceCell::default()),
            },
        };

        Harness { log, parts }
    }
}

/// A fake device's parts and the log they share.
pub struct Harness {
    pub log: EventLog,
    pub parts: BackendParts<FakeBackend>,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Build a renderer clearing to the default color.
    pub fn renderer(self) -> solidframe_core::Result<(Renderer<FakeBackend>, EventLog)> {
        let renderer = Renderer::new(self.parts, ClearColor::DEFAULT)?;
        Ok((renderer, self.log))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_have_distinct_views() {
        let harness = Harness::builder().buffers(3).build();
        let surface = &harness.parts.surface;
        let views: Vec<u64> = (0..3)
            .filter_map(|i| surface.target(FrameIndex(i)))
            .map(|t| t.view)
            .collect();
        assert_eq!(views.len(), 3);
        assert!(views[0] != views[1] && views[1] != views[2] && views[0] != views[2]);
        assert!(surface.target(FrameIndex(3)).is_none());
    }

    #[test]
    fn resize_changes_views() {
        let mut surface = Harness::builder().build().parts.surface;
        let before = surface.target(FrameIndex(0));
        surface.resize(640, 480).unwrap();
        assert_ne!(surface.target(FrameIndex(0)), before);
        assert_eq!(surface.generation(), 1);
    }

    #[test]
    fn scripted_index_holds_until_present() {
        let mut surface = Harness::builder().script([1, 0]).build().parts.surface;
        assert_eq!(surface.current_index().unwrap(), FrameIndex(1));
        assert_eq!(surface.current_index().unwrap(), FrameIndex(1));
        surface.present(FrameIndex(1)).unwrap();
        assert_eq!(surface.current_index().unwrap(), FrameIndex(0));
    }

    #[test]
    fn queue_refuses_open_recording() {
        let Harness { log, parts } = Harness::builder().build();
        let BackendParts {
            mut recording,
            mut queue,
            ..
        } = parts;

        recording.reset().unwrap();
        let err = queue.execute(&recording).unwrap_err();
        assert!(matches!(err, FrameError::Submission(_)));
        assert_eq!(log.count(|e| matches!(e, Event::Execute { .. })), 0);
    }

    #[test]
    fn fence_wait_blocks_until_signal_lands() {
        let Harness { log, parts } = Harness::builder()
            .gpu_latency(Duration::from_millis(10))
            .build();
        let BackendParts {
            mut recording,
            mut queue,
            fence,
            ..
        } = parts;

        recording.reset().unwrap();
        recording.close().unwrap();
        queue.execute(&recording).unwrap();
        queue.signal(&fence, SignalValue(1)).unwrap();

        assert!(fence.wait(1, None).unwrap());
        assert_eq!(fence.completed_value().unwrap(), 1);

        let executed = log.first(|e| matches!(e, Event::GpuExecuted { .. })).unwrap();
        let woke = log.first(|e| matches!(e, Event::WaitReturned { .. })).unwrap();
        assert!(executed < woke);
    }

    #[test]
    fn fence_wait_times_out() {
        let fence = Harness::builder().build().parts.fence;
        assert!(!fence.wait(1, Some(Duration::from_millis(5))).unwrap());
    }
}
