//! TimelineTracker - stamps execution windows onto a message

use contracts::{now_epoch_secs, Message, TimestampRecord};
use tracing::trace;

/// Stateless timestamp marker
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineTracker;

impl TimelineTracker {
    pub fn new() -> Self {
        Self
    }

    /// Mark when a stage receives a request.
    ///
    /// Keeps an earlier receipt time if one is already recorded.
    pub fn mark_received<'a>(&self, message: &'a mut Message, stage: &str) -> &'a TimestampRecord {
        let ts = message.timestamp_mut(stage);
        if ts.received_at.is_none() {
            ts.received_at = Some(now_epoch_secs());
        }
        trace!(stage, received_at = ?ts.received_at, "Stage received");
        ts
    }

    /// Mark when a stage starts processing.
    ///
    /// Backfills the receipt time when the stage was never marked received.
    pub fn mark_started<'a>(&self, message: &'a mut Message, stage: &str) -> &'a TimestampRecord {
        let ts = message.timestamp_mut(stage);
        let now = now_epoch_secs();
        if ts.received_at.is_none() {
            ts.received_at = Some(now);
        }
        ts.started_at = Some(now);
        trace!(stage, started_at = now, "Stage started");
        ts
    }

    /// Mark when a stage completes; duration stays undefined without a start
    pub fn mark_completed<'a>(
        &self,
        message: &'a mut Message,
        stage: &str,
    ) -> &'a TimestampRecord {
        let ts = message.timestamp_mut(stage);
        let now = now_epoch_secs();
        ts.completed_at = Some(now);
        trace!(stage, completed_at = now, "Stage completed");
        ts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_monotonic() {
        let tracker = TimelineTracker::new();
        let mut msg = Message::new("prompt");

        tracker.mark_received(&mut msg, "a");
        tracker.mark_started(&mut msg, "a");
        tracker.mark_completed(&mut msg, "a");

        let ts = msg.timestamp("a").unwrap();
        let received = ts.received_at.unwrap();
        let started = ts.started_at.unwrap();
        let completed = ts.completed_at.unwrap();
        assert!(received <= started);
        assert!(started <= completed);

        let duration = ts.duration_ms().unwrap();
        assert!(duration >= 0.0);
        assert_eq!(duration, (completed - started) * 1000.0);
    }

    #[test]
    fn test_started_backfills_received() {
        let tracker = TimelineTracker::new();
        let mut msg = Message::new("prompt");

        let ts = tracker.mark_started(&mut msg, "b");
        assert_eq!(ts.received_at, ts.started_at);
    }

    #[test]
    fn test_received_is_not_overwritten() {
        let tracker = TimelineTracker::new();
        let mut msg = Message::new("prompt");
        msg.timestamp_mut("c").received_at = Some(1.0);

        tracker.mark_received(&mut msg, "c");
        tracker.mark_started(&mut msg, "c");

        assert_eq!(msg.timestamp("c").unwrap().received_at, Some(1.0));
    }

    #[test]
    fn test_completed_without_start_has_no_duration() {
        let tracker = TimelineTracker::new();
        let mut msg = Message::new("prompt");

        tracker.mark_completed(&mut msg, "d");

        let ts = msg.timestamp("d").unwrap();
        assert!(ts.completed_at.is_some());
        assert_eq!(ts.duration_ms(), None);
    }

    #[test]
    fn test_restamp_does_not_duplicate() {
        let tracker = TimelineTracker::new();
        let mut msg = Message::new("prompt");

        tracker.mark_started(&mut msg, "e");
        tracker.mark_started(&mut msg, "e");

        assert_eq!(msg.timestamps.len(), 1);
        assert_eq!(msg.timestamp("e").unwrap().stage_name, "e");
    }
}
