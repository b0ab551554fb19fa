//! Frame statistics reported at shutdown.

use std::time::Instant;

use tracing::info;

/// Running frame-rate and synchronization counters.
#[derive(Clone, Debug)]
pub struct FrameStats {
    frames: u64,
    blocked_waits: u64,
    min_fps: f64,
    max_fps: f64,
    fps_sum: f64,
    fps_samples: u64,
    last_frame: Option<Instant>,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames: 0,
            blocked_waits: 0,
            min_fps: f64::MAX,
            max_fps: 0.0,
            fps_sum: 0.0,
            fps_samples: 0,
            last_frame: None,
        }
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished frame. `blocked` tells whether its fence wait armed the wait handle.
    pub fn record_frame(&mut self, now: Instant, blocked: bool) {
        self.frames += 1;
        if blocked {
            self.blocked_waits += 1;
        }

        if let Some(last) = self.last_frame {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let fps = 1.0 / dt;
                self.min_fps = self.min_fps.min(fps);
                self.max_fps = self.max_fps.max(fps);
                self.fps_sum += fps;
                self.fps_samples += 1;
            }
        }
        self.last_frame = Some(now);
    }

    /// Frames rendered.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames whose fence wait actually blocked.
    pub fn blocked_waits(&self) -> u64 {
        self.blocked_waits
    }

    /// Average FPS over all measured frame intervals.
    pub fn average_fps(&self) -> Option<f64> {
        (self.fps_samples > 0).then(|| self.fps_sum / self.fps_samples as f64)
    }

    /// Log the summary.
    pub fn log_summary(&self) {
        if self.frames == 0 {
            info!("No frames rendered");
            return;
        }

        info!("Frame statistics:");
        info!("  Total frames: {}", self.frames);
        info!("  Blocking fence waits: {}", self.blocked_waits);
        if let Some(avg) = self.average_fps() {
            info!("  Min FPS: {:.1}", self.min_fps);
            info!("  Max FPS: {:.1}", self.max_fps);
            info!("  Avg FPS: {:.1}", avg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::time::Duration;

    #[test]
    fn first_frame_has_no_rate() {
        let mut stats = FrameStats::new();
        stats.record_frame(Instant::now(), false);
        assert_eq!(stats.frames(), 1);
        assert!(stats.average_fps().is_none());
    }

    #[test]
    fn average_over_intervals() {
        let mut stats = FrameStats::new();
        let start = Instant::now();
        stats.record_frame(start, true);
        stats.record_frame(start + Duration::from_millis(10), true);
        stats.record_frame(start + Duration::from_millis(30), false);

        assert_eq!(stats.frames(), 3);
        assert_eq!(stats.blocked_waits(), 2);
        // 100 fps then 50 fps
        assert_relative_eq!(stats.average_fps().unwrap(), 75.0, epsilon = 1e-6);
    }
}
