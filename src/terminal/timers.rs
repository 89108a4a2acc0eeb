// ABOUTME: Epoch-tagged timers for a session generation
// Each timer posts SessionEvent::Timer into the controller queue; teardown aborts them all

use crate::terminal::events::{EventSender, SessionEpoch, SessionEvent, TimerKind};
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};
use tracing::trace;

pub struct SessionTimers {
    epoch: SessionEpoch,
    events: EventSender,
    handles: HashMap<TimerKind, JoinHandle<()>>,
}

impl SessionTimers {
    pub fn new(epoch: SessionEpoch, events: EventSender) -> Self {
        Self {
            epoch,
            events,
            handles: HashMap::new(),
        }
    }

    /// Fire `kind` every `period`, first tick one period from now.
    /// Replaces a running timer of the same kind.
    pub fn every(&mut self, kind: TimerKind, period: Duration) {
        let epoch = self.epoch;
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(SessionEvent::Timer { epoch, timer: kind }).is_err() {
                    break;
                }
            }
        });
        self.replace(kind, handle);
    }

    /// Fire `kind` once after `delay`. Re-arming restarts the delay.
    pub fn after(&mut self, kind: TimerKind, delay: Duration) {
        let epoch = self.epoch;
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let _ = events.send(SessionEvent::Timer { epoch, timer: kind });
        });
        self.replace(kind, handle);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(handle) = self.handles.remove(&kind) {
            trace!("Cancelling {:?} timer for session {}", kind, self.epoch);
            handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.handles
            .get(&kind)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    fn replace(&mut self, kind: TimerKind, handle: JoinHandle<()>) {
        if let Some(previous) = self.handles.insert(kind, handle) {
            previous.abort();
        }
    }
}

impl Drop for SessionTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_after_fires_once_with_epoch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let epoch = SessionEpoch::default().next();
        let mut timers = SessionTimers::new(epoch, tx);
        timers.after(TimerKind::ResizeSettle, Duration::from_millis(5));

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            SessionEvent::Timer {
                epoch,
                timer: TimerKind::ResizeSettle
            }
        );
    }

    #[tokio::test]
    async fn test_rearming_debounces() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = SessionTimers::new(SessionEpoch::default(), tx);
        for _ in 0..5 {
            timers.after(TimerKind::ResizeDebounce, Duration::from_millis(20));
        }

        assert!(rx.recv().await.is_some());
        let extra = tokio::time::timeout(Duration::from_millis(60), rx.recv()).await;
        assert!(extra.is_err(), "only the last arming should fire");
    }

    #[tokio::test]
    async fn test_cancel_all_stops_intervals() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = SessionTimers::new(SessionEpoch::default(), tx);
        timers.every(TimerKind::TrafficSample, Duration::from_millis(5));
        assert!(rx.recv().await.is_some());

        timers.cancel_all();
        assert!(!timers.is_active(TimerKind::TrafficSample));
        tokio::time::sleep(Duration::from_millis(10)).await;
        while rx.try_recv().is_ok() {}
        let late = tokio::time::timeout(Duration::from_millis(30), rx.recv()).await;
        assert!(late.is_err());
    }
}
