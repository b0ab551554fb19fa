//! A fake GPU: a worker thread that drains a command queue in order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::log::{Event, EventLog};

/// Completed value of one fake timeline fence.
#[derive(Default)]
pub struct FenceCell {
    completed: Mutex<u64>,
    reached: Condvar,
}

impl FenceCell {
    /// Highest value signaled so far.
    pub fn completed(&self) -> u64 {
        *self.completed.lock()
    }

    /// Block until the value reaches `value` or `deadline` passes.
    ///
    /// Returns whether `value` was reached.
    pub fn wait_for(&self, value: u64, deadline: Option<Instant>) -> bool {
        let mut completed = self.completed.lock();
        while *completed < value {
            match deadline {
                Some(deadline) => {
                    if self.reached.wait_until(&mut completed, deadline).timed_out() {
                        return *completed >= value;
                    }
                }
                None => self.reached.wait(&mut completed),
            }
        }
        true
    }

    fn advance(&self, value: u64) {
        let mut completed = self.completed.lock();
        if value > *completed {
            *completed = value;
        }
        self.reached.notify_all();
    }
}

/// Holds the GPU thread before its next command while closed.
#[derive(Default)]
struct Gate {
    held: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn set(&self, held: bool) {
        *self.held.lock() = held;
        if !held {
            self.opened.notify_all();
        }
    }

    fn pass(&self) {
        let mut held = self.held.lock();
        while *held {
            self.opened.wait(&mut held);
        }
    }
}

enum GpuCommand {
    Execute { submission: u64 },
    Signal { fence: Arc<FenceCell>, value: u64 },
    Shutdown,
}

/// Handle to the fake GPU thread.
///
/// Commands run strictly in enqueue order. Each execution takes `latency`.
/// While held, queued commands wait until [`FakeGpu::release`].
pub struct FakeGpu {
    command_tx: Sender<GpuCommand>,
    gate: Arc<Gate>,
    thread: Option<JoinHandle<()>>,
}

impl FakeGpu {
    /// Spawn the GPU thread.
    pub fn spawn(log: EventLog, latency: Duration) -> Self {
        let (command_tx, command_rx) = channel::unbounded::<GpuCommand>();
        let gate = Arc::new(Gate::default());

        let worker_gate = gate.clone();
        let thread = thread::Builder::new()
            .name("fake-gpu".to_string())
            .spawn(move || Self::worker_loop(&log, latency, &worker_gate, &command_rx))
            .expect("Failed to spawn fake GPU thread");

        Self {
            command_tx,
            gate,
            thread: Some(thread),
        }
    }

    fn worker_loop(
        log: &EventLog,
        latency: Duration,
        gate: &Gate,
        command_rx: &Receiver<GpuCommand>,
    ) {
        loop {
            let command = command_rx.recv();
            gate.pass();
            match command {
                Ok(GpuCommand::Execute { submission }) => {
                    if !latency.is_zero() {
                        thread::sleep(latency);
                    }
                    log.record(Event::GpuExecuted { submission });
                    trace!("Fake GPU executed submission {submission}");
                }
                Ok(GpuCommand::Signal { fence, value }) => {
                    log.record(Event::GpuSignaled { value });
                    fence.advance(value);
                }
                Ok(GpuCommand::Shutdown) | Err(_) => return,
            }
        }
    }

    /// Enqueue an execution. Returns immediately.
    pub fn execute(&self, submission: u64) -> bool {
        self.command_tx
            .send(GpuCommand::Execute { submission })
            .is_ok()
    }

    /// Enqueue a fence signal behind all earlier commands. Returns immediately.
    pub fn signal(&self, fence: Arc<FenceCell>, value: u64) -> bool {
        self.command_tx
            .send(GpuCommand::Signal { fence, value })
            .is_ok()
    }

    /// Stop executing queued commands until [`FakeGpu::release`].
    pub fn hold(&self) {
        self.gate.set(true);
    }

    /// Let the GPU thread continue with queued commands.
    pub fn release(&self) {
        self.gate.set(false);
    }

    /// Finish queued work and join the thread.
    pub fn shutdown(&mut self) {
        self.release();
        let _ = self.command_tx.send(GpuCommand::Shutdown);

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for FakeGpu {
    fn drop(&mut self) {
        self.shutdown();
    }
}
