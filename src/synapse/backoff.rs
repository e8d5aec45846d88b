//! Exponential backoff policy for retried requests.
//!
//! # Defaults
//!
//! - Initial interval: 500ms
//! - Multiplier: 1.5
//! - Randomization: +/- 50% around the current interval
//! - Max interval: 60 seconds
//! - Max elapsed time: 10 seconds (measured from the first attempt)

use std::time::Duration;
use tokio::time::Instant;

/// Stop retrying once this much time has passed since the first attempt
pub const MAX_ELAPSED_TIME: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub initial_interval: Duration,
    pub multiplier: f64,
    /// 0.5 means the delay is drawn from [0.5 * interval, 1.5 * interval]
    pub randomization_factor: f64,
    pub max_interval: Duration,
    pub max_elapsed_time: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            randomization_factor: 0.5,
            max_interval: Duration::from_secs(60),
            max_elapsed_time: MAX_ELAPSED_TIME,
        }
    }
}

/// Stateful backoff sequence; create one per logical request.
#[derive(Debug)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current_interval: Duration,
    started_at: Instant,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            current_interval: config.initial_interval,
            config,
            started_at: Instant::now(),
        }
    }

    /// Delay before the next attempt, or `None` when retrying should stop.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        let delay = randomize(self.current_interval, self.config.randomization_factor);
        if self.started_at.elapsed() + delay > self.config.max_elapsed_time {
            return None;
        }

        let grown = self.current_interval.as_secs_f64() * self.config.multiplier;
        self.current_interval =
            Duration::from_secs_f64(grown.min(self.config.max_interval.as_secs_f64()));

        Some(delay)
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

fn randomize(interval: Duration, factor: f64) -> Duration {
    if factor <= 0.0 {
        return interval;
    }
    let base = interval.as_secs_f64();
    let delta = base * factor;
    // Uniform in [base - delta, base + delta]
    let jittered = base - delta + rand::random::<f64>() * (2.0 * delta);
    Duration::from_secs_f64(jittered.max(0.0))
}
