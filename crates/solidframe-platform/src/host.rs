//! The window and its message pump.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use solidframe_core::{EventSource, WindowMessage};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::{PlatformConfig, PlatformError, Result};

/// How long a single pump may block while waiting for the window to appear.
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(16);

/// Attempts to get the window created before giving up.
const STARTUP_PUMP_ATTEMPTS: u32 = 250;

/// Map a winit window event onto the frame loop's message set.
pub fn translate_event(event: &WindowEvent) -> WindowMessage {
    match event {
        WindowEvent::CloseRequested | WindowEvent::Destroyed => WindowMessage::CloseRequested,
        WindowEvent::Resized(size) => WindowMessage::Resized {
            width: size.width,
            height: size.height,
        },
        _ => WindowMessage::Other,
    }
}

/// Receives winit callbacks during a pump and queues the translated messages.
struct HostHandler {
    config: PlatformConfig,
    window: Option<Arc<Window>>,
    pending: VecDeque<WindowMessage>,
    failure: Option<PlatformError>,
}

impl ApplicationHandler for HostHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attributes) {
            Ok(window) => {
                info!(
                    "Window created: \"{}\" {}x{}",
                    self.config.title, self.config.width, self.config.height
                );
                self.window = Some(Arc::new(window));
            }
            Err(e) => {
                error!("Failed to create window: {e}");
                self.failure = Some(PlatformError::WindowCreation(e.to_string()));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let message = translate_event(&event);
        if message == WindowMessage::CloseRequested {
            event_loop.exit();
        }
        if message != WindowMessage::Other {
            debug!("Window message: {:?}", message);
        }
        self.pending.push_back(message);
    }
}

/// Owns the event loop and the single application window.
///
/// Each empty [`poll`](EventSource::poll) pumps the platform queue once with a
/// zero timeout; [`poll_timeout`](EventSource::poll_timeout) lets the platform
/// sleep until a message arrives or the timeout passes.
pub struct WindowHost {
    event_loop: EventLoop<()>,
    handler: HostHandler,
    closed: bool,
}

impl WindowHost {
    /// Create the event loop and pump it until the window exists.
    pub fn new(config: PlatformConfig) -> Result<Self> {
        let mut event_loop =
            EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut handler = HostHandler {
            config,
            window: None,
            pending: VecDeque::new(),
            failure: None,
        };

        for _ in 0..STARTUP_PUMP_ATTEMPTS {
            let status = event_loop.pump_app_events(Some(STARTUP_PUMP_TIMEOUT), &mut handler);
            if let Some(failure) = handler.failure.take() {
                return Err(failure);
            }
            if handler.window.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                return Err(PlatformError::EventLoop(format!(
                    "event loop exited with code {code} before the window was created"
                )));
            }
        }

        if handler.window.is_none() {
            return Err(PlatformError::WindowCreation(
                "window was not created".to_string(),
            ));
        }

        Ok(Self {
            event_loop,
            handler,
            closed: false,
        })
    }

    /// The application window.
    pub fn window(&self) -> Result<&Arc<Window>> {
        self.handler
            .window
            .as_ref()
            .ok_or_else(|| PlatformError::WindowCreation("window was not created".to_string()))
    }

    /// Current drawable size in physical pixels.
    pub fn inner_size(&self) -> Result<(u32, u32)> {
        let size = self.window()?.inner_size();
        Ok((size.width, size.height))
    }
}

impl WindowHost {
    fn pump(&mut self, timeout: Duration) -> Option<WindowMessage> {
        if self.handler.pending.is_empty() && !self.closed {
            // Poll control flow would return without honoring the timeout
            self.event_loop.set_control_flow(control_flow_for(timeout));
            let status = self
                .event_loop
                .pump_app_events(Some(timeout), &mut self.handler);
            if let PumpStatus::Exit(code) = status {
                debug!("Event loop exited with code {code}");
                self.closed = true;
                self.handler.pending.push_back(WindowMessage::CloseRequested);
            }
        }

        self.handler.pending.pop_front()
    }
}

fn control_flow_for(timeout: Duration) -> ControlFlow {
    if timeout.is_zero() {
        ControlFlow::Poll
    } else {
        ControlFlow::Wait
    }
}

impl EventSource for WindowHost {
    fn poll(&mut self) -> Option<WindowMessage> {
        self.pump(Duration::ZERO)
    }

    fn poll_timeout(&mut self, timeout: Duration) -> Option<WindowMessage> {
        self.pump(timeout)
    }
}
