//! Application runner for Solidframe.
//!
//! Handles the boilerplate around the frame pipeline:
//! - Logging setup
//! - Window creation
//! - Vulkan device, surface and swapchain initialization
//! - The message/render loop and orderly shutdown
//!
//! # Example
//!
//! ```no_run
//! use solidframe_app::{run_app, AppConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     run_app(AppConfig::new("Solidframe"))?;
//!     Ok(())
//! }
//! ```

mod config;
mod runner;

pub use config::AppConfig;
pub use runner::{init_logging, run_app};

pub use solidframe_core::{ClearColor, RunSummary};
