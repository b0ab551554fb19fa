//! Scripted window message source.

use std::collections::VecDeque;
use std::time::Duration;

use solidframe_core::{EventSource, WindowMessage};

use crate::log::{Event, EventLog};

/// One poll's outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// No message pending; the loop renders a frame.
    Idle,
    /// A message is pending.
    Message(WindowMessage),
}

/// Replays a fixed list of poll results, then reports a close.
pub struct ScriptedEvents {
    steps: VecDeque<Step>,
    log: Option<EventLog>,
    polls: usize,
    blocking_polls: usize,
}

impl ScriptedEvents {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            log: None,
            polls: 0,
            blocking_polls: 0,
        }
    }

    /// `frames` idle polls followed by a close.
    pub fn frames(frames: usize) -> Self {
        Self::new(std::iter::repeat(Step::Idle).take(frames))
    }

    /// Record every delivered message into `log`.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Number of times the loop polled.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Number of those polls that were allowed to block.
    pub fn blocking_polls(&self) -> usize {
        self.blocking_polls
    }
}

impl EventSource for ScriptedEvents {
    fn poll(&mut self) -> Option<WindowMessage> {
        self.polls += 1;
        let message = match self.steps.pop_front() {
            Some(Step::Idle) => None,
            Some(Step::Message(message)) => Some(message),
            None => Some(WindowMessage::CloseRequested),
        };

        if let (Some(message), Some(log)) = (message, &self.log) {
            log.record(Event::Message(message));
        }
        message
    }

    fn poll_timeout(&mut self, _timeout: Duration) -> Option<WindowMessage> {
        self.blocking_polls += 1;
        self.poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_when_exhausted() {
        let mut events = ScriptedEvents::frames(2);
        assert_eq!(events.poll(), None);
        assert_eq!(events.poll(), None);
        assert_eq!(events.poll(), Some(WindowMessage::CloseRequested));
        assert_eq!(events.poll(), Some(WindowMessage::CloseRequested));
        assert_eq!(events.polls(), 4);
        assert_eq!(events.blocking_polls(), 0);
    }

    #[test]
    fn blocking_polls_count_as_polls() {
        let mut events = ScriptedEvents::frames(1);
        assert_eq!(events.poll_timeout(Duration::from_millis(1)), None);
        assert_eq!(events.poll(), Some(WindowMessage::CloseRequested));
        assert_eq!(events.polls(), 2);
        assert_eq!(events.blocking_polls(), 1);
    }

    #[test]
    fn delivered_messages_are_logged() {
        let log = EventLog::new();
        let mut events = ScriptedEvents::new([
            Step::Message(WindowMessage::Other),
            Step::Idle,
        ])
        .with_log(log.clone());

        events.poll();
        events.poll();
        assert_eq!(log.events(), vec![Event::Message(WindowMessage::Other)]);
    }
}
