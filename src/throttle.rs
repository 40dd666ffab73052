use std::time::{Duration, Instant};

/// Collapses bursts of requests into at most one delivery per interval.
///
/// Each `trigger` replaces the pending value, so a burst delivers only its
/// latest value. The caller polls with the current time.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    pub fn trigger(&mut self, value: T) {
        self.pending = Some(value);
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if the interval since the last delivery has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_none() {
            return None;
        }
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_fired = Some(now);
        self.pending.take()
    }

    /// How long until a pending value may be delivered.
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref()?;
        let wait = match self.last_fired {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        };
        Some(wait)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_pending() {
        let mut throttle: Throttle<u16> = Throttle::new(Duration::from_millis(100));
        let now = Instant::now();
        assert_eq!(throttle.poll(now), None);
        assert_eq!(throttle.time_until_ready(now), None);
    }

    #[test]
    fn test_first_trigger_fires_immediately() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        let now = Instant::now();
        throttle.trigger(80u16);
        assert_eq!(throttle.time_until_ready(now), Some(Duration::ZERO));
        assert_eq!(throttle.poll(now), Some(80));
        assert!(!throttle.is_pending());
    }

    #[test]
    fn test_burst_collapses_to_latest_value() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();
        throttle.trigger(80u16);
        assert_eq!(throttle.poll(start), Some(80));

        for width in 81..=120u16 {
            throttle.trigger(width);
        }
        assert_eq!(throttle.poll(start + Duration::from_millis(40)), None);
        assert_eq!(
            throttle.time_until_ready(start + Duration::from_millis(40)),
            Some(Duration::from_millis(60))
        );
        assert_eq!(throttle.poll(start + Duration::from_millis(100)), Some(120));
        assert_eq!(throttle.poll(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_at_most_one_delivery_per_interval() {
        let mut throttle = Throttle::new(Duration::from_millis(50));
        let start = Instant::now();
        let mut deliveries = 0;
        for ms in 0..500u64 {
            throttle.trigger(ms);
            if throttle.poll(start + Duration::from_millis(ms)).is_some() {
                deliveries += 1;
            }
        }
        assert_eq!(deliveries, 10);
    }
}
