// ABOUTME: Traffic meter accumulating channel byte counts into throughput estimates
// Counters are shared with the transport; sampling runs on the controller's cadence

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// Byte counters for the current window, recorded from any task
#[derive(Debug, Default)]
pub struct TrafficCounters {
    sent: AtomicU64,
    received: AtomicU64,
}

impl TrafficCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, direction: Direction, bytes: usize) {
        let counter = match direction {
            Direction::Upload => &self.sent,
            Direction::Download => &self.received,
        };
        counter.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn bytes_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn bytes_received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.received.store(0, Ordering::Relaxed);
    }
}

/// Throughput in bytes per second
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrafficRates {
    pub upload: f64,
    pub download: f64,
}

impl TrafficRates {
    pub fn is_zero(&self) -> bool {
        self.upload == 0.0 && self.download == 0.0
    }
}

pub struct TrafficMeter {
    counters: Arc<TrafficCounters>,
    window_start: Instant,
    window: Duration,
    rates: TrafficRates,
}

impl TrafficMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            counters: TrafficCounters::new(),
            window_start: Instant::now(),
            window,
            rates: TrafficRates::default(),
        }
    }

    /// Handle given to the transport so it can record both directions
    pub fn counters(&self) -> Arc<TrafficCounters> {
        self.counters.clone()
    }

    pub fn record(&self, direction: Direction, bytes: usize) {
        self.counters.record(direction, bytes);
    }

    pub fn sample(&mut self) -> TrafficRates {
        self.sample_at(Instant::now())
    }

    /// Compute rates for the window ending at `now`. The window restarts once
    /// it has run for at least the configured duration.
    pub fn sample_at(&mut self, now: Instant) -> TrafficRates {
        let elapsed = now.saturating_duration_since(self.window_start).as_secs_f64();
        self.rates = if elapsed > 0.0 {
            TrafficRates {
                upload: self.counters.bytes_sent() as f64 / elapsed,
                download: self.counters.bytes_received() as f64 / elapsed,
            }
        } else {
            TrafficRates::default()
        };

        if elapsed >= self.window.as_secs_f64() {
            self.counters.reset();
            self.window_start = now;
        }
        self.rates
    }

    pub fn rates(&self) -> TrafficRates {
        self.rates
    }

    /// Zero the readings and start a fresh window
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.counters.reset();
        self.window_start = now;
        self.rates = TrafficRates::default();
    }
}

/// Human readable rate, e.g. `1.5 KB/s`
pub fn format_rate(bytes_per_sec: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];
    let mut value = bytes_per_sec.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_are_bytes_over_elapsed_window() {
        let start = Instant::now();
        let mut meter = TrafficMeter::new(Duration::from_secs(3));
        meter.reset_at(start);

        meter.record(Direction::Upload, 100);
        meter.record(Direction::Download, 1000);
        let rates = meter.sample_at(start + Duration::from_millis(500));
        assert_eq!(rates.upload, 200.0);
        assert_eq!(rates.download, 2000.0);

        meter.record(Direction::Download, 1000);
        let rates = meter.sample_at(start + Duration::from_secs(1));
        assert_eq!(rates.download, 2000.0);
    }

    #[test]
    fn test_window_resets_after_three_seconds() {
        let start = Instant::now();
        let mut meter = TrafficMeter::new(Duration::from_secs(3));
        meter.reset_at(start);

        meter.record(Direction::Download, 3000);
        let rates = meter.sample_at(start + Duration::from_secs(3));
        assert_eq!(rates.download, 1000.0);
        assert_eq!(meter.counters().bytes_received(), 0);

        meter.record(Direction::Download, 500);
        let rates = meter.sample_at(start + Duration::from_millis(3500));
        assert_eq!(rates.download, 1000.0);
    }

    #[test]
    fn test_window_is_kept_before_three_seconds() {
        let start = Instant::now();
        let mut meter = TrafficMeter::new(Duration::from_secs(3));
        meter.reset_at(start);

        meter.record(Direction::Upload, 10);
        meter.sample_at(start + Duration::from_millis(2900));
        assert_eq!(meter.counters().bytes_sent(), 10);
    }

    #[test]
    fn test_zero_elapsed_yields_zero() {
        let start = Instant::now();
        let mut meter = TrafficMeter::new(Duration::from_secs(3));
        meter.reset_at(start);
        meter.record(Direction::Upload, 10);
        assert!(meter.sample_at(start).is_zero());
    }

    #[test]
    fn test_reset_zeroes_readings() {
        let start = Instant::now();
        let mut meter = TrafficMeter::new(Duration::from_secs(3));
        meter.reset_at(start);
        meter.record(Direction::Download, 4096);
        meter.sample_at(start + Duration::from_secs(1));
        assert!(!meter.rates().is_zero());

        meter.reset();
        assert!(meter.rates().is_zero());
        assert_eq!(meter.counters().bytes_received(), 0);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(0.0), "0 B/s");
        assert_eq!(format_rate(512.0), "512 B/s");
        assert_eq!(format_rate(1536.0), "1.5 KB/s");
        assert_eq!(format_rate(3.0 * 1024.0 * 1024.0), "3.0 MB/s");
    }
}
