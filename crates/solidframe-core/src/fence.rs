//! CPU/GPU fence synchronization.

use std::time::Duration;

use tracing::trace;

use crate::backend::{CommandQueue, TimelineFence};
use crate::error::{FrameError, Result};
use crate::types::{SignalValue, SubmissionTicket};

/// Owns the timeline fence and the monotonic counter signaled through it.
///
/// The counter only moves by one per [`signal_after`](Self::signal_after).
/// The completed value is read from the GPU and never exceeds the last
/// requested value.
pub struct FenceSynchronizer<F> {
    fence: F,
    requested: SignalValue,
    /// Submission covered by `requested`.
    signaled_submission: u64,
    blocked_waits: u64,
}

impl<F: TimelineFence> FenceSynchronizer<F> {
    /// Wrap a fence whose counter starts at zero.
    pub fn new(fence: F) -> Self {
        Self {
            fence,
            requested: SignalValue(0),
            signaled_submission: 0,
            blocked_waits: 0,
        }
    }

    /// The wrapped fence.
    pub fn fence(&self) -> &F {
        &self.fence
    }

    /// Last value requested with [`signal_after`](Self::signal_after).
    pub fn last_signaled(&self) -> SignalValue {
        self.requested
    }

    /// Number of waits that had to arm the wait handle.
    pub fn blocked_waits(&self) -> u64 {
        self.blocked_waits
    }

    /// Highest value the GPU has reached.
    pub fn completed_value(&self) -> Result<SignalValue> {
        let completed = SignalValue(self.fence.completed_value()?);
        if completed > self.requested {
            return Err(FrameError::Synchronization(format!(
                "fence reports {completed} completed but only {} was requested",
                self.requested
            )));
        }
        Ok(completed)
    }

    /// Schedule a GPU signal of the next counter value after the ticket's work.
    ///
    /// The counter advances only if the signal was enqueued.
    pub fn signal_after<Q>(&mut self, queue: &mut Q, ticket: SubmissionTicket) -> Result<SignalValue>
    where
        Q: CommandQueue<Fence = F>,
    {
        let next = SignalValue(self.requested.0 + 1);
        queue.signal(&self.fence, next)?;

        self.requested = next;
        self.signaled_submission = ticket.submission();
        trace!(
            "Signal {} scheduled after submission {} (buffer {})",
            next,
            ticket.submission(),
            ticket.frame_index()
        );
        Ok(next)
    }

    /// Block until the GPU reaches `value`. Returns at once if it already has.
    pub fn wait_until(&mut self, value: SignalValue) -> Result<()> {
        if self.wait(value, None)? {
            Ok(())
        } else {
            Err(FrameError::Synchronization(format!(
                "unbounded wait for {value} returned early"
            )))
        }
    }

    /// Like [`wait_until`](Self::wait_until) but gives up after `timeout`.
    ///
    /// Returns whether `value` was reached.
    pub fn wait_until_timeout(&mut self, value: SignalValue, timeout: Duration) -> Result<bool> {
        self.wait(value, Some(timeout))
    }

    /// Whether submission `submission` is known to have finished on the GPU.
    pub fn is_confirmed(&self, submission: u64) -> Result<bool> {
        if self.signaled_submission < submission {
            return Ok(false);
        }
        Ok(self.completed_value()? >= self.requested)
    }

    fn wait(&mut self, value: SignalValue, timeout: Option<Duration>) -> Result<bool> {
        if value > self.requested {
            return Err(FrameError::Synchronization(format!(
                "waiting for {value} which was never signaled (last {})",
                self.requested
            )));
        }

        if self.completed_value()? >= value {
            trace!("Fence already at {value}");
            return Ok(true);
        }

        self.blocked_waits += 1;
        let reached = self.fence.wait(value.0, timeout)?;
        trace!("Fence wait for {value} finished (reached: {reached})");
        Ok(reached)
    }
}
