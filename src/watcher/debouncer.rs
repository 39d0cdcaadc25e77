//! Coalescing of bursts of file events into one change signal.
//!
//! A single save usually produces several notifications (create of the temp
//! file, rename over the target, attribute changes). The debouncer collapses
//! them into one signal once the file has been quiet for the configured time.

use std::time::{Duration, Instant};

/// Single-slot debouncer for one watched file.
#[derive(Debug)]
pub struct Debouncer {
    /// Time of the most recent unreported event.
    pending: Option<Instant>,
    /// How long the file must be quiet before the change is reported.
    duration: Duration,
}

impl Debouncer {
    pub fn new(duration: Duration) -> Self {
        Self {
            pending: None,
            duration,
        }
    }

    /// Record an event. Restarts the quiet period.
    pub fn record(&mut self) {
        self.pending = Some(Instant::now());
    }

    /// Returns `true` once per burst, after the quiet period has elapsed.
    pub fn take_ready(&mut self) -> bool {
        match self.pending {
            Some(last) if last.elapsed() >= self.duration => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until a pending change becomes ready, `None` if nothing is pending.
    pub fn time_until_ready(&self) -> Option<Duration> {
        self.pending
            .map(|last| self.duration.saturating_sub(last.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_debouncer_basic() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        assert!(!debouncer.take_ready());
        assert!(debouncer.time_until_ready().is_none());

        debouncer.record();
        assert!(!debouncer.take_ready());
        assert!(debouncer.time_until_ready().is_some());

        sleep(Duration::from_millis(60));

        assert!(debouncer.take_ready());
        assert!(debouncer.time_until_ready().is_none());
        assert!(!debouncer.take_ready());
    }

    #[test]
    fn test_burst_collapses_to_one_signal() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        debouncer.record();
        sleep(Duration::from_millis(30));
        debouncer.record();
        sleep(Duration::from_millis(30));

        // 60ms since the first event but only 30ms since the last
        assert!(!debouncer.take_ready());

        sleep(Duration::from_millis(30));
        assert!(debouncer.take_ready());
        assert!(!debouncer.take_ready());
    }

    #[test]
    fn test_zero_duration_is_immediate() {
        let mut debouncer = Debouncer::new(Duration::ZERO);
        debouncer.record();
        assert_eq!(debouncer.time_until_ready(), Some(Duration::ZERO));
        assert!(debouncer.take_ready());
    }
}
