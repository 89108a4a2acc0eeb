// ABOUTME: Keepalive monitor tracking ping/pong round trips on the terminal channel
// The periodic tick itself is a session timer; this keeps the liveness bookkeeping

use std::time::{Duration, Instant};
use tracing::debug;

pub struct KeepaliveMonitor {
    interval: Duration,
    last_ping: Option<Instant>,
    latency: Option<Duration>,
    pings_sent: u64,
}

impl KeepaliveMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_ping: None,
            latency: None,
            pings_sent: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ping_sent(&mut self, now: Instant) {
        self.last_ping = Some(now);
        self.pings_sent += 1;
    }

    /// Record a pong; returns the round trip when a ping was outstanding
    pub fn pong_received(&mut self, now: Instant) -> Option<Duration> {
        let sent = self.last_ping.take()?;
        let rtt = now.saturating_duration_since(sent);
        debug!("Keepalive round trip: {:?}", rtt);
        self.latency = Some(rtt);
        Some(rtt)
    }

    /// Most recent measured round trip
    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// True while a ping is waiting for its pong
    pub fn awaiting_pong(&self) -> bool {
        self.last_ping.is_some()
    }

    pub fn pings_sent(&self) -> u64 {
        self.pings_sent
    }

    pub fn reset(&mut self) {
        self.last_ping = None;
        self.latency = None;
        self.pings_sent = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_measured() {
        let mut monitor = KeepaliveMonitor::new(Duration::from_secs(30));
        let start = Instant::now();
        monitor.ping_sent(start);
        assert!(monitor.awaiting_pong());

        let rtt = monitor.pong_received(start + Duration::from_millis(42));
        assert_eq!(rtt, Some(Duration::from_millis(42)));
        assert_eq!(monitor.latency(), Some(Duration::from_millis(42)));
        assert!(!monitor.awaiting_pong());
    }

    #[test]
    fn test_unsolicited_pong_is_ignored() {
        let mut monitor = KeepaliveMonitor::new(Duration::from_secs(30));
        assert_eq!(monitor.pong_received(Instant::now()), None);
        assert_eq!(monitor.latency(), None);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut monitor = KeepaliveMonitor::new(Duration::from_secs(30));
        let start = Instant::now();
        monitor.ping_sent(start);
        monitor.pong_received(start + Duration::from_millis(5));
        monitor.ping_sent(start + Duration::from_secs(30));
        monitor.reset();
        assert_eq!(monitor.latency(), None);
        assert_eq!(monitor.pings_sent(), 0);
        assert!(!monitor.awaiting_pong());
    }
}
