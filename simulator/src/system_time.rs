//! Wall-clock time for the simulator.

use flapclock_common::clock_text::TimeSource;
use time::{Duration, OffsetDateTime, Time, UtcOffset};

/// Local time, optionally skewed forward to preview upcoming minutes.
pub struct SystemClock {
    utc_offset: UtcOffset,
    skew: Duration,
}

impl SystemClock {
    /// Resolves the local offset once; it cannot be queried safely after
    /// other threads exist. Falls back to UTC.
    pub fn new() -> Self {
        let utc_offset = UtcOffset::current_local_offset().unwrap_or_else(|err| {
            log::warn!("local UTC offset unavailable ({err}), showing UTC");
            UtcOffset::UTC
        });
        Self {
            utc_offset,
            skew: Duration::ZERO,
        }
    }

    pub fn advance_minutes(
        &mut self,
        minutes: i64,
    ) {
        self.skew += Duration::minutes(minutes);
    }

    /// Drop any skew so `now` follows the system clock again.
    pub fn reset_skew(&mut self) { self.skew = Duration::ZERO; }
}

impl Default for SystemClock {
    fn default() -> Self { Self::new() }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Time { (OffsetDateTime::now_utc().to_offset(self.utc_offset) + self.skew).time() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_skew_returns_to_system_time() {
        let mut clock = SystemClock::new();
        clock.advance_minutes(3);
        assert_eq!(clock.skew, Duration::minutes(3));

        clock.reset_skew();
        assert_eq!(clock.skew, Duration::ZERO);
    }
}
