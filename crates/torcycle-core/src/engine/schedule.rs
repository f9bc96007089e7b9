//! Delay between rotations
//!
//! Bounded runs wait exactly `interval` seconds. Unbounded runs draw a whole
//! number of seconds uniformly from `[max(floor, interval - jitter), interval + jitter]`
//! so rotations are not perfectly periodic.

use crate::config::{RotatorConfig, SessionParams};
use rand::Rng;
use std::time::Duration;

/// How many rotations to run and how long to wait after each one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSchedule {
    interval_secs: u64,
    count: Option<u64>,
    jitter_secs: u64,
    floor_secs: u64,
}

impl RotationSchedule {
    pub fn new(params: SessionParams, config: &RotatorConfig) -> Self {
        Self {
            interval_secs: params.interval,
            count: (!params.is_unbounded()).then_some(params.count),
            jitter_secs: config.jitter.as_secs(),
            floor_secs: config.min_unbounded_delay.as_secs(),
        }
    }

    /// Number of rotations, `None` when unbounded
    pub fn total(&self) -> Option<u64> {
        self.count
    }

    /// Inclusive delay window in seconds for unbounded mode
    pub fn jitter_bounds(&self) -> (u64, u64) {
        let low = self
            .interval_secs
            .saturating_sub(self.jitter_secs)
            .max(self.floor_secs);
        let high = self.interval_secs.saturating_add(self.jitter_secs).max(low);
        (low, high)
    }

    /// Delay to wait after a rotation
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match self.count {
            Some(_) => Duration::from_secs(self.interval_secs),
            None => {
                let (low, high) = self.jitter_bounds();
                Duration::from_secs(rng.gen_range(low..=high))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn schedule(interval: u64, count: u64) -> RotationSchedule {
        RotationSchedule::new(SessionParams { interval, count }, &RotatorConfig::default())
    }

    #[test]
    fn bounded_delay_is_exact_interval() {
        let schedule = schedule(30, 4);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(schedule.total(), Some(4));
        for _ in 0..50 {
            assert_eq!(schedule.next_delay(&mut rng), Duration::from_secs(30));
        }
    }

    #[test]
    fn bounded_zero_interval_does_not_wait() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(schedule(0, 2).next_delay(&mut rng), Duration::ZERO);
    }

    #[test]
    fn jitter_bounds_follow_interval() {
        assert_eq!(schedule(30, 0).jitter_bounds(), (25, 35));
        assert_eq!(schedule(10, 0).jitter_bounds(), (5, 15));
    }

    #[test]
    fn jitter_bounds_clamp_small_intervals_to_floor() {
        assert_eq!(schedule(0, 0).jitter_bounds(), (5, 5));
        assert_eq!(schedule(3, 0).jitter_bounds(), (5, 8));
        assert_eq!(schedule(7, 0).jitter_bounds(), (5, 12));
    }

    #[test]
    fn unbounded_delays_stay_within_window() {
        let mut rng = StdRng::seed_from_u64(42);
        for interval in [0, 1, 5, 9, 10, 30, 600] {
            let schedule = schedule(interval, 0);
            assert_eq!(schedule.total(), None);
            let (low, high) = schedule.jitter_bounds();
            for _ in 0..500 {
                let secs = schedule.next_delay(&mut rng).as_secs();
                assert!(
                    (low..=high).contains(&secs),
                    "interval {} produced {}s outside [{}, {}]",
                    interval,
                    secs,
                    low,
                    high
                );
            }
        }
    }

    #[test]
    fn unbounded_delays_are_not_constant() {
        let schedule = schedule(30, 0);
        let mut rng = StdRng::seed_from_u64(3);
        let first = schedule.next_delay(&mut rng);
        assert!((0..100).any(|_| schedule.next_delay(&mut rng) != first));
    }
}
