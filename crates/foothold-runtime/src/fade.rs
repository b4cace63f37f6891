/// Seconds after a scan before markers start fading.
pub const FADE_DELAY: f64 = 3.0;
/// Seconds from fully opaque to invisible.
pub const FADE_DURATION: f64 = 3.0;
/// Alpha is recomputed at most this often (20 Hz).
pub const ALPHA_UPDATE_INTERVAL: f64 = 0.05;

/// Marker opacity over time since the last scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeClock {
    last_scan: f64,
    last_update: f64,
    pushed: Option<f32>,
}

impl Default for FadeClock {
    fn default() -> Self {
        Self {
            last_scan: f64::NEG_INFINITY,
            last_update: f64::NEG_INFINITY,
            pushed: None,
        }
    }
}

impl FadeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers just got placed at `now`.
    pub fn restart(&mut self, now: f64) {
        self.last_scan = now;
        self.last_update = f64::NEG_INFINITY;
        self.pushed = None;
    }

    pub fn alpha_at(&self, now: f64) -> f32 {
        let t = ((now - (self.last_scan + FADE_DELAY)) / FADE_DURATION).clamp(0.0, 1.0);
        (1.0 - t) as f32
    }

    /// The new alpha when it is due for an update and differs from the last
    /// one handed out.
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        if now - self.last_update < ALPHA_UPDATE_INTERVAL {
            return None;
        }
        self.last_update = now;
        let alpha = self.alpha_at(now);
        if self.pushed == Some(alpha) {
            return None;
        }
        self.pushed = Some(alpha);
        Some(alpha)
    }

    pub fn last_alpha(&self) -> Option<f32> {
        self.pushed
    }
}
