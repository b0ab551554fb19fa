//! Data model shared by every frame pipeline component.

use std::fmt;

use glam::Vec4;

/// Index of a back buffer inside the presentation surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FrameIndex(pub u32);

impl FrameIndex {
    /// The index as a `usize` for arena lookups.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FrameIndex {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Logical state of a back buffer, as last declared to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferState {
    /// Ready to be shown on screen.
    #[default]
    Presentable,
    /// Writable by clear commands.
    RenderTarget,
}

impl BufferState {
    /// The other state.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Presentable => Self::RenderTarget,
            Self::RenderTarget => Self::Presentable,
        }
    }
}

/// A resource state transition recorded as a barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    /// State before the barrier.
    pub before: BufferState,
    /// State after the barrier.
    pub after: BufferState,
}

impl Transition {
    /// Presentable -> RenderTarget.
    pub const TO_RENDER_TARGET: Self = Self {
        before: BufferState::Presentable,
        after: BufferState::RenderTarget,
    };

    /// RenderTarget -> Presentable.
    pub const TO_PRESENTABLE: Self = Self {
        before: BufferState::RenderTarget,
        after: BufferState::Presentable,
    };
}

/// Normalized RGBA clear color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    /// The color the window is filled with unless configured otherwise.
    pub const DEFAULT: Self = Self {
        r: 0.0,
        g: 0.2,
        b: 0.6,
        a: 1.0,
    };

    /// Create a color, clamping every channel to `0.0..=1.0`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Channels in RGBA order.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Vec4> for ClearColor {
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<ClearColor> for Vec4 {
    fn from(c: ClearColor) -> Self {
        Self::from_array(c.to_array())
    }
}

/// A fence value requested by the CPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SignalValue(pub u64);

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proof that a closed recording was enqueued on the queue.
///
/// Handed to the fence synchronizer, which ties the next signal value to this
/// work. Not `Clone`: each submission is signaled once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a submission ticket must be handed to the fence synchronizer"]
pub struct SubmissionTicket {
    pub(crate) submission: u64,
    pub(crate) frame_index: FrameIndex,
}

impl SubmissionTicket {
    /// Sequence number of the submission, starting at 1.
    pub const fn submission(&self) -> u64 {
        self.submission
    }

    /// Back buffer written by the submitted work.
    pub const fn frame_index(&self) -> FrameIndex {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_clear_color() {
        let c = ClearColor::default();
        assert_relative_eq!(c.r, 0.0);
        assert_relative_eq!(c.g, 0.2);
        assert_relative_eq!(c.b, 0.6);
        assert_relative_eq!(c.a, 1.0);
    }

    #[test]
    fn clear_color_clamps_channels() {
        let c = ClearColor::new(-1.0, 0.5, 2.0, 1.0);
        assert_eq!(c.to_array(), [0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn clear_color_from_vec4() {
        let c = ClearColor::from(Vec4::new(0.25, 0.5, 0.75, 1.0));
        let v: Vec4 = c.into();
        assert_relative_eq!(v.x, 0.25);
        assert_relative_eq!(v.z, 0.75);
    }

    #[test]
    fn buffer_state_opposite() {
        assert_eq!(BufferState::Presentable.opposite(), BufferState::RenderTarget);
        assert_eq!(BufferState::RenderTarget.opposite(), BufferState::Presentable);
        assert_eq!(BufferState::default(), BufferState::Presentable);
    }
}
