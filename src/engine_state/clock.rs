//! # Game Clock
//!
//! In-game hours advance by one every `hour_duration` of real time and wrap
//! around at 24.

use web_time::{Duration, Instant};

/// Tracks the hour of the in-game day.
#[derive(Debug)]
pub struct GameClock {
    hour: u32,
    hour_duration: Duration,
    last_change: Option<Instant>,
}

impl GameClock {
    /// Creates a clock starting at `hour`.
    pub fn new(hour: u32, hour_duration: Duration) -> Self {
        GameClock {
            hour: hour % 24,
            hour_duration,
            last_change: None,
        }
    }

    /// The current hour, `0..24`.
    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Jumps to `hour`; the running hour timer is kept.
    pub fn set_hour(&mut self, hour: u32) {
        self.hour = hour % 24;
    }

    /// Moves the clock forward to `now`.
    ///
    /// The first call only starts the timer.
    ///
    /// # Returns
    /// The new hour if it changed.
    pub fn advance(&mut self, now: Instant) -> Option<u32> {
        let Some(last_change) = self.last_change else {
            self.last_change = Some(now);
            return None;
        };
        if now.duration_since(last_change) < self.hour_duration {
            return None;
        }
        self.hour = (self.hour + 1) % 24;
        self.last_change = Some(now);
        Some(self.hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_advance_and_wrap() {
        let start = Instant::now();
        let hour = Duration::from_millis(10);
        let mut clock = GameClock::new(23, hour);

        assert_eq!(clock.advance(start), None);
        assert_eq!(clock.advance(start + Duration::from_millis(5)), None);
        assert_eq!(clock.advance(start + hour), Some(0));
        assert_eq!(clock.advance(start + hour + Duration::from_millis(9)), None);
        assert_eq!(clock.advance(start + hour * 2), Some(1));
    }

    #[test]
    fn test_set_hour_keeps_the_timer() {
        let start = Instant::now();
        let mut clock = GameClock::new(8, Duration::from_millis(10));
        clock.advance(start);
        clock.set_hour(30);
        assert_eq!(clock.hour(), 6);
        assert_eq!(clock.advance(start + Duration::from_millis(8)), None);
        assert_eq!(clock.advance(start + Duration::from_millis(10)), Some(7));
    }
}
