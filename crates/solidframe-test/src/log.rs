//! Shared record of everything the fake backend was asked to do.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use solidframe_core::{ClearColor, Transition, WindowMessage};

use crate::backend::FakeTarget;

/// One observable backend call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// The surface reported the next back buffer.
    Acquire { index: u32 },
    /// The recording's allocator and command list were reset.
    Reset,
    /// A state transition barrier was recorded.
    Barrier {
        target: FakeTarget,
        transition: Transition,
    },
    /// A clear was recorded.
    Clear { target: FakeTarget, color: ClearColor },
    /// The recording was closed.
    Close,
    /// A closed recording was enqueued.
    Execute {
        submission: u64,
        target: Option<FakeTarget>,
    },
    /// A back buffer was presented.
    Present { index: u32 },
    /// A fence signal was enqueued.
    Signal { value: u64 },
    /// A CPU wait handle was armed.
    WaitArmed { value: u64 },
    /// A blocking CPU wait returned.
    WaitReturned { value: u64, reached: bool },
    /// The GPU thread finished a submission.
    GpuExecuted { submission: u64 },
    /// The GPU thread advanced a fence.
    GpuSignaled { value: u64 },
    /// The surface was resized.
    Resize { width: u32, height: u32 },
    /// A window message was handed to the frame loop.
    Message(WindowMessage),
}

impl Event {
    /// Whether the event is produced by the fake GPU thread or a wait on it.
    ///
    /// Their position relative to controlling-thread calls depends on timing.
    pub fn is_timing_dependent(&self) -> bool {
        matches!(
            self,
            Self::GpuExecuted { .. }
                | Self::GpuSignaled { .. }
                | Self::WaitArmed { .. }
                | Self::WaitReturned { .. }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquire { index } => write!(f, "acquire {index}"),
            Self::Reset => write!(f, "reset"),
            Self::Barrier { target, transition } => write!(
                f,
                "barrier {} {:?} -> {:?}",
                target.buffer, transition.before, transition.after
            ),
            Self::Clear { target, .. } => write!(f, "clear {}", target.buffer),
            Self::Close => write!(f, "close"),
            Self::Execute { submission, .. } => write!(f, "execute #{submission}"),
            Self::Present { index } => write!(f, "present {index}"),
            Self::Signal { value } => write!(f, "signal {value}"),
            Self::WaitArmed { value } => write!(f, "wait {value}"),
            Self::WaitReturned { value, reached } => write!(f, "woke {value} ({reached})"),
            Self::GpuExecuted { submission } => write!(f, "gpu executed #{submission}"),
            Self::GpuSignaled { value } => write!(f, "gpu signaled {value}"),
            Self::Resize { width, height } => write!(f, "resize {width}x{height}"),
            Self::Message(message) => write!(f, "message {message:?}"),
        }
    }
}

/// A logged event with its global sequence number and timestamp.
#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub seq: u64,
    pub at: Instant,
    pub event: Event,
}

/// Append-only event log shared by every fake and the GPU thread.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamping it with the next sequence number.
    pub fn record(&self, event: Event) {
        let mut entries = self.entries.lock();
        let seq = entries.len() as u64;
        entries.push(Entry {
            seq,
            at: Instant::now(),
            event,
        });
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().clone()
    }

    /// Snapshot of every event so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.entries.lock().iter().map(|e| e.event).collect()
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.entries.lock().iter().filter(|e| pred(&e.event)).count()
    }

    /// Sequence number of the first event matching `pred`.
    pub fn first(&self, pred: impl Fn(&Event) -> bool) -> Option<u64> {
        self.entries
            .lock()
            .iter()
            .find(|e| pred(&e.event))
            .map(|e| e.seq)
    }

    /// Sequence numbers of every event matching `pred`.
    pub fn positions(&self, pred: impl Fn(&Event) -> bool) -> Vec<u64> {
        self.entries
            .lock()
            .iter()
            .filter(|e| pred(&e.event))
            .map(|e| e.seq)
            .collect()
    }

    /// Values passed to every enqueued fence signal.
    pub fn signals(&self) -> Vec<u64> {
        self.collect(|event| match event {
            Event::Signal { value } => Some(*value),
            _ => None,
        })
    }

    /// Indices passed to every present.
    pub fn presents(&self) -> Vec<u32> {
        self.collect(|event| match event {
            Event::Present { index } => Some(*index),
            _ => None,
        })
    }

    /// Targets of every enqueued recording.
    pub fn executed_targets(&self) -> Vec<Option<FakeTarget>> {
        self.collect(|event| match event {
            Event::Execute { target, .. } => Some(*target),
            _ => None,
        })
    }

    /// Controlling-thread events, one per line.
    ///
    /// Events whose placement depends on GPU thread timing are left out, so
    /// the result is deterministic.
    pub fn trace(&self) -> String {
        self.entries
            .lock()
            .iter()
            .filter(|e| !e.event.is_timing_dependent())
            .map(|e| e.event.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn collect<T>(&self, f: impl Fn(&Event) -> Option<T>) -> Vec<T> {
        self.entries.lock().iter().filter_map(|e| f(&e.event)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_follow_record_order() {
        let log = EventLog::new();
        log.record(Event::Reset);
        log.record(Event::Close);
        log.record(Event::Signal { value: 1 });

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
        assert!(entries.windows(2).all(|w| w[0].at <= w[1].at));
        assert_eq!(log.signals(), vec![1]);
        assert_eq!(log.first(|e| *e == Event::Close), Some(1));
    }

    #[test]
    fn clones_share_entries() {
        let log = EventLog::new();
        let other = log.clone();
        other.record(Event::Present { index: 1 });
        assert_eq!(log.presents(), vec![1]);
    }

    #[test]
    fn trace_skips_gpu_thread_events() {
        let log = EventLog::new();
        log.record(Event::Signal { value: 1 });
        log.record(Event::GpuSignaled { value: 1 });
        log.record(Event::WaitArmed { value: 1 });
        log.record(Event::Present { index: 0 });
        assert_eq!(log.trace(), "signal 1\npresent 0");
    }
}
