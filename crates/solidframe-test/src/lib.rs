//! Test harness for the Solidframe frame pipeline.
//!
//! Provides an in-memory backend whose every call lands in a shared,
//! time-stamped [`EventLog`]. The fake GPU runs on its own thread so fence
//! waits really block until queued work has "executed".

pub mod backend;
pub mod events;
pub mod gpu;
pub mod log;

pub use backend::{
    FakeBackend, FakeFence, FakeQueue, FakeRecording, FakeSurface, FakeTarget, Harness,
    HarnessBuilder,
};
pub use events::{ScriptedEvents, Step};
pub use gpu::FakeGpu;
pub use log::{Entry, Event, EventLog};
