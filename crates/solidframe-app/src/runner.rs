//! Application runner.

use anyhow::Context;
use raw_window_handle::HasDisplayHandle;
use solidframe_core::constants::BACK_BUFFER_COUNT;
use solidframe_core::{Renderer, RunSummary};
use solidframe_gpu::{GpuContext, GpuContextBuilder, SurfaceContext, SwapchainConfig, VulkanBackend};
use solidframe_platform::WindowHost;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Install the global `tracing` subscriber.
///
/// Defaults to `info`. `RUST_LOG` overrides it.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber installed by an embedding application wins
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Everything alive while the window is open.
///
/// Fields drop in declaration order: the renderer's Vulkan objects before the
/// surface, the surface before the device, and the window last.
struct Session {
    renderer: Renderer<VulkanBackend>,
    _surface: SurfaceContext,
    gpu: GpuContext,
    host: WindowHost,
}

impl Session {
    fn create(config: &AppConfig) -> anyhow::Result<Self> {
        let host = WindowHost::new(config.platform_config()).context("creating window")?;

        let display = host
            .window()?
            .display_handle()
            .context("querying display handle")?
            .as_raw();

        let gpu = GpuContextBuilder::new()
            .app_name(&config.title)
            .display(display)
            .validation(config.validation)
            .build()
            .context("initializing Vulkan")?;

        let surface = unsafe { SurfaceContext::from_window(&gpu, host.window()?.as_ref()) }
            .context("creating window surface")?;

        let (width, height) = host.inner_size()?;
        let swapchain_config = SwapchainConfig {
            width,
            height,
            vsync: config.vsync,
            buffer_count: BACK_BUFFER_COUNT,
        };

        let parts = unsafe { VulkanBackend::create_parts(&gpu, &surface, swapchain_config) }
            .context("creating frame resources")?;
        let renderer = Renderer::new(parts, config.clear_color)?;

        Ok(Self {
            renderer,
            _surface: surface,
            gpu,
            host,
        })
    }

    fn run(&mut self) -> anyhow::Result<RunSummary> {
        let summary = solidframe_core::run(&mut self.renderer, &mut self.host)?;
        info!(
            "Closed after {} frames on {}",
            summary.frames_rendered,
            self.gpu.capabilities().device_name
        );
        Ok(summary)
    }
}

/// Open the window, clear and present frames until it is closed.
///
/// Initializes logging first. Any initialization or frame failure is returned
/// as an error; a normal close returns exit code 0.
pub fn run_app(config: AppConfig) -> anyhow::Result<RunSummary> {
    init_logging();

    info!("{} starting...", config.title);

    let mut session = match Session::create(&config) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to initialize: {e:#}");
            return Err(e);
        }
    };

    let summary = session.run();
    if let Err(e) = &summary {
        error!("Frame loop failed: {e:#}");
    }
    summary
}
