//! Solidframe viewer.
//!
//! Opens a 1280x720 window and clears it to a constant blue every frame.
//! Set `RUST_LOG=debug` to trace individual frames.

use std::process::ExitCode;

use solidframe_app::{run_app, AppConfig};

fn main() -> anyhow::Result<ExitCode> {
    let summary = run_app(AppConfig::new("Solidframe Viewer"))?;
    Ok(ExitCode::from(u8::try_from(summary.exit_code).unwrap_or(1)))
}
