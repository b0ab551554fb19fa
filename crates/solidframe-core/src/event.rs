//! Cooperative interleaving of window messages and rendering.

use std::time::Duration;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::error::Result;
use crate::renderer::Renderer;

/// A window message relevant to the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowMessage {
    /// The user closed the window.
    CloseRequested,
    /// The drawable area changed size.
    Resized { width: u32, height: u32 },
    /// Anything else; dispatched and otherwise ignored.
    Other,
}

/// How long a paused loop waits for a message before checking again.
pub const PAUSED_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Non-blocking source of window messages.
pub trait EventSource {
    /// Take the next pending message, or `None` if the queue is empty.
    fn poll(&mut self) -> Option<WindowMessage>;

    /// Like [`poll`](Self::poll), but may block up to `timeout` for a message.
    fn poll_timeout(&mut self, timeout: Duration) -> Option<WindowMessage> {
        let _ = timeout;
        self.poll()
    }
}

/// How the loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames rendered before close.
    pub frames_rendered: u64,
    /// Process exit code for a normal close.
    pub exit_code: i32,
}

/// Drive `renderer` until `events` reports a close.
///
/// Pending messages are always handled first; a frame is rendered only in
/// iterations where none is pending. While rendering is paused the loop blocks
/// on the event source instead of spinning. Any frame error ends the loop.
pub fn run<B, E>(renderer: &mut Renderer<B>, events: &mut E) -> Result<RunSummary>
where
    B: Backend,
    E: EventSource,
{
    let mut frames_rendered = 0;

    loop {
        let message = if renderer.is_paused() {
            events.poll_timeout(PAUSED_POLL_INTERVAL)
        } else {
            events.poll()
        };

        match message {
            Some(WindowMessage::CloseRequested) => {
                info!("Close requested");
                break;
            }
            Some(WindowMessage::Resized { width, height }) => {
                renderer.resize(width, height)?;
            }
            Some(WindowMessage::Other) => {}
            None => {
                if let Some(report) = renderer.render_frame()? {
                    frames_rendered += 1;
                    debug!(
                        "Frame {} done: buffer {}, signal {}",
                        frames_rendered, report.frame_index, report.signal
                    );
                }
            }
        }
    }

    renderer.shutdown()?;

    Ok(RunSummary {
        frames_rendered,
        exit_code: 0,
    })
}
