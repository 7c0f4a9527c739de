use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_MAX_SAMPLES: usize = 100;

struct SpeedSample {
    bytes: u64,
    at: Instant,
}

/// Transfer speed, both recent (sliding window) and since the first sample.
///
/// Owned by a single transfer loop, so no interior locking.
pub struct SpeedCalculator {
    samples: VecDeque<SpeedSample>,
    window: Duration,
    max_samples: usize,
    started: Option<Instant>,
    total_bytes: u64,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_SAMPLES)
    }
}

impl SpeedCalculator {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
            max_samples: max_samples.max(2),
            started: None,
            total_bytes: 0,
        }
    }

    /// Records `bytes` transferred now.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(bytes, Instant::now());
    }

    pub fn record_at(&mut self, bytes: u64, at: Instant) {
        match self.started {
            None => self.started = Some(at),
            Some(_) => self.total_bytes += bytes,
        }
        self.samples.push_back(SpeedSample { bytes, at });

        // The newest sample at or before the cutoff stays as the anchor, so a
        // gap longer than the window still leaves two samples.
        if let Some(cutoff) = at.checked_sub(self.window) {
            while self.samples.get(1).is_some_and(|s| s.at <= cutoff) {
                self.samples.pop_front();
            }
        }
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
        }
    }

    /// Recent bytes/second across the window; 0.0 with fewer than two samples.
    ///
    /// The oldest kept sample only anchors the time origin.
    pub fn bytes_per_second(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.at.duration_since(first.at);
        if self.samples.len() < 2 || elapsed.is_zero() {
            return 0.0;
        }
        let bytes: u64 = self.samples.iter().skip(1).map(|s| s.bytes).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Bytes/second from the first sample to the latest one.
    pub fn average_bytes_per_second(&self) -> f64 {
        let (Some(started), Some(last)) = (self.started, self.samples.back()) else {
            return 0.0;
        };
        let elapsed = last.at.duration_since(started);
        if elapsed.is_zero() {
            return 0.0;
        }
        self.total_bytes as f64 / elapsed.as_secs_f64()
    }

    /// Estimated time to send `remaining` bytes, `None` while speed is unknown.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let speed = self.bytes_per_second();
        (speed > 0.0).then(|| Duration::from_secs_f64(remaining as f64 / speed))
    }
}
