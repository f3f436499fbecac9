use std::time::{Duration, Instant};

/// Progress callback: completion percent (0-100) and, once enough wall-clock
/// time has passed to extrapolate, an estimated number of seconds remaining.
pub type ProgressFn = Box<dyn FnMut(u8, Option<u64>) + Send>;

/// Remaining-time estimates are suppressed until this much time has elapsed;
/// extrapolating from the first moments of a run produces garbage.
const ESTIMATE_MIN_ELAPSED: Duration = Duration::from_secs(5);

/// Invokes the callback at most once per distinct percent value as the byte
/// offset advances. The estimate is recomputed from scratch on every bucket
/// change, not smoothed.
pub struct ProgressReporter {
    callback: ProgressFn,
    total: u64,
    started: Instant,
    last_percent: Option<u8>,
}

impl ProgressReporter {
    pub fn new(total: u64, callback: ProgressFn) -> Self {
        Self {
            callback,
            total,
            started: Instant::now(),
            last_percent: None,
        }
    }

    pub fn tick(&mut self, offset: u64) {
        let percent = percent_of(offset, self.total);
        if let Some(last) = self.last_percent
            && percent <= last
        {
            return;
        }
        self.last_percent = Some(percent);
        let remaining = estimate_remaining(self.started.elapsed(), percent);
        (self.callback)(percent, remaining);
    }
}

fn percent_of(offset: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = (offset as f64 * 100.0 / total as f64).round();
    percent.min(100.0) as u8
}

/// Extrapolates total run time from elapsed time and completion percent,
/// returning the remainder. `None` until the minimum elapsed threshold is
/// reached: "unknown", not zero.
pub(crate) fn estimate_remaining(elapsed: Duration, percent: u8) -> Option<u64> {
    if percent == 0 || elapsed < ESTIMATE_MIN_ELAPSED {
        return None;
    }
    let elapsed_secs = elapsed.as_secs_f64();
    let total = elapsed_secs / (f64::from(percent) / 100.0);
    Some((total - elapsed_secs).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting_reporter(total: u64) -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::new(
            total,
            Box::new(move |percent, _remaining| sink.lock().unwrap().push(percent)),
        );
        (reporter, seen)
    }

    #[test]
    fn fires_once_per_percent_bucket() {
        let (mut reporter, seen) = collecting_reporter(200);
        reporter.tick(1);
        reporter.tick(2);
        reporter.tick(2);
        reporter.tick(100);
        reporter.tick(200);
        assert_eq!(*seen.lock().unwrap(), vec![1, 50, 100]);
    }

    #[test]
    fn percent_is_monotonic_and_capped() {
        let (mut reporter, seen) = collecting_reporter(10);
        for offset in [1, 3, 3, 7, 10, 10, 10] {
            reporter.tick(offset);
        }
        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(seen.iter().all(|&percent| percent <= 100));
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn no_estimate_before_threshold() {
        assert_eq!(estimate_remaining(Duration::from_secs(4), 50), None);
        assert_eq!(estimate_remaining(Duration::from_secs(0), 50), None);
    }

    #[test]
    fn no_estimate_at_zero_percent() {
        assert_eq!(estimate_remaining(Duration::from_secs(10), 0), None);
    }

    #[test]
    fn estimate_extrapolates_from_elapsed() {
        // 10s for 25% extrapolates to 40s total, 30s remaining.
        assert_eq!(estimate_remaining(Duration::from_secs(10), 25), Some(30));
        // 6s for 50% extrapolates to 12s total, 6s remaining.
        assert_eq!(estimate_remaining(Duration::from_secs(6), 50), Some(6));
        // Complete run has nothing remaining.
        assert_eq!(estimate_remaining(Duration::from_secs(20), 100), Some(0));
    }
}
