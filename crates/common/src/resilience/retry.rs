//! Backoff and jitter for retried operations
//!
//! Callers own their retry loop; this module only answers "how long should
//! attempt N wait". Part uploads use it between requeued attempts and the
//! HTTP client between transport-level retries.

use std::time::Duration;

use rand::Rng;

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay at all
    None,
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: initial_delay * base^attempt, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Doubling backoff from `initial_delay` up to `max_delay`.
    pub fn exponential(initial_delay: Duration, max_delay: Duration) -> Self {
        Self::Exponential { initial_delay, base: 2.0, max_delay }
    }

    /// Calculate the delay for a zero-based retry number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::None => Duration::ZERO,
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(self, delay: Duration) -> Duration {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if millis == 0 {
            return delay;
        }
        let mut rng = rand::thread_rng();
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rng.gen_range(0..=millis)),
            Jitter::Equal => {
                let half = millis / 2;
                Duration::from_millis(half + rng.gen_range(0..=millis - half))
            }
        }
    }
}

/// Strategy plus jitter, the unit callers configure
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    pub strategy: BackoffStrategy,
    pub jitter: Jitter,
}

impl Backoff {
    pub fn new(strategy: BackoffStrategy, jitter: Jitter) -> Self {
        Self { strategy, jitter }
    }

    /// Backoff that never sleeps; handy in tests.
    pub fn none() -> Self {
        Self::new(BackoffStrategy::None, Jitter::None)
    }

    /// Delay before retry number `attempt` (0 = first retry).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.strategy.calculate_delay(attempt))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            BackoffStrategy::exponential(Duration::from_millis(250), Duration::from_secs(10)),
            Jitter::Equal,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_doubles_and_caps() {
        let strategy =
            BackoffStrategy::exponential(Duration::from_millis(100), Duration::from_millis(1000));
        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(strategy.calculate_delay(3), Duration::from_millis(800));
        assert_eq!(strategy.calculate_delay(4), Duration::from_millis(1000));
        assert_eq!(strategy.calculate_delay(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_fixed_and_none() {
        let fixed = BackoffStrategy::Fixed(Duration::from_secs(2));
        assert_eq!(fixed.calculate_delay(7), Duration::from_secs(2));
        assert_eq!(BackoffStrategy::None.calculate_delay(3), Duration::ZERO);
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(400);
        for _ in 0..100 {
            let full = Jitter::Full.apply(base);
            assert!(full <= base);

            let equal = Jitter::Equal.apply(base);
            assert!(equal >= Duration::from_millis(200) && equal <= base);
        }
        assert_eq!(Jitter::None.apply(base), base);
        assert_eq!(Jitter::Full.apply(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_backoff_none_never_sleeps() {
        let backoff = Backoff::none();
        assert_eq!(backoff.delay_for(0), Duration::ZERO);
        assert_eq!(backoff.delay_for(10), Duration::ZERO);
    }
}
