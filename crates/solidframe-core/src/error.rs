//! Error types for the frame pipeline.

use thiserror::Error;

use crate::types::{BufferState, FrameIndex};

/// Errors raised while setting up or driving the frame pipeline.
#[derive(Error, Debug)]
pub enum FrameError {
    /// Device, queue, surface, allocator or fence creation failed.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A command recording could not be reset, recorded or closed.
    ///
    /// Under correct sequencing this never happens: it means a recording was
    /// reused while the GPU could still read it.
    #[error("Recording failed: {0}")]
    Recording(String),

    /// The queue rejected a submission.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The presentation surface was lost, occluded or went out of date.
    #[error("Presentation failed: {0}")]
    Presentation(String),

    /// Querying or waiting on the fence failed.
    #[error("Synchronization failed: {0}")]
    Synchronization(String),

    /// A frame index outside the back-buffer arena.
    #[error("Back buffer {index} out of range ({count} buffers)")]
    BufferOutOfRange {
        /// Requested index.
        index: FrameIndex,
        /// Number of back buffers.
        count: usize,
    },

    /// A back buffer was used in the wrong state.
    #[error("Back buffer {index} is {actual:?}, expected {expected:?}")]
    InvalidBufferState {
        /// Back buffer index.
        index: FrameIndex,
        /// State the buffer is actually in.
        actual: BufferState,
        /// State the operation requires.
        expected: BufferState,
    },
}

impl FrameError {
    /// Whether this error belongs to startup rather than the steady-state loop.
    pub const fn is_initialization(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }
}

/// Result type alias using [`FrameError`].
pub type Result<T> = std::result::Result<T, FrameError>;
