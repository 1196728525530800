use web_time::Instant;

/// Per-frame timing: delta-time source with a smoothed FPS readout.
///
/// The render loop calls [`tick`](Self::tick) once per frame and feeds
/// the returned delta into the camera's movement processing.
pub struct FrameClock {
    last_frame: Instant,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Start the clock at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            smoothed_fps: 60.0, // Start with reasonable default
            smoothing: 0.05,
        }
    }

    /// Seconds since the previous tick. Updates the FPS average.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if delta > 0.0 {
            let instant_fps = 1.0 / delta;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
        delta
    }

    /// Get the current FPS (smoothed)
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_returns_non_negative_delta() {
        let mut clock = FrameClock::new();
        for _ in 0..5 {
            let delta = clock.tick();
            assert!(delta >= 0.0);
            assert!(clock.fps().is_finite());
            assert!(clock.fps() > 0.0);
        }
    }

    #[test]
    fn delta_grows_with_elapsed_time() {
        let mut clock = FrameClock::new();
        let _ = clock.tick();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let delta = clock.tick();
        assert!(delta >= 0.004);
    }
}
