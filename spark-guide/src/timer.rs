use std::time::{Duration, Instant};

/// Measures how long one frame took.
#[derive(Debug, Copy, Clone)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Seconds, rounded to two decimals.
    pub fn elapsed_secs(&self) -> f64 {
        spark_dodge::round_hundredths(self.elapsed().as_secs_f64())
    }
}
