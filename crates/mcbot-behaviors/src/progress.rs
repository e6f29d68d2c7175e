/// Detects movement that has stopped making progress towards a goal.
///
/// Progress is measured as the best (smallest) distance seen so far. A stall is reported once the
/// navigator is no longer moving and the distance has not improved for `window` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallDetector {
    window: f64,
    best_distance: f64,
    last_progress_at: f64,
}

const MIN_PROGRESS: f64 = 0.1;

impl StallDetector {
    pub fn new(window_seconds: f32) -> Self {
        Self {
            window: window_seconds.max(0.0) as f64,
            best_distance: f64::INFINITY,
            last_progress_at: 0.0,
        }
    }

    pub fn reset(&mut self, now: f64, distance: f64) {
        self.best_distance = distance;
        self.last_progress_at = now;
    }

    /// Record one observation. Returns true when the movement counts as stalled.
    pub fn observe(&mut self, now: f64, distance: f64, moving: bool) -> bool {
        if distance < self.best_distance - MIN_PROGRESS {
            self.reset(now, distance);
            return false;
        }
        !moving && now - self.last_progress_at >= self.window
    }
}

/// Whether an attempt counter has reached its ceiling. A ceiling of 0 means unlimited.
pub fn attempts_exhausted(attempts: u32, max_attempts: u32) -> bool {
    max_attempts > 0 && attempts >= max_attempts
}
