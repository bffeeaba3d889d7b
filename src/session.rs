//! Replay sessions: one fully loaded log plus derived metadata.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::Serialize;
use tracing::debug;

use crate::id::generate_id;
use crate::ingest::{self, IngestError};
use crate::model::EventRecord;

/// An immutable, time-indexed view of one event log.
///
/// Events are kept in log order, which is assumed to be chronological.
/// Only the convenience cursor changes after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySession {
    id: String,
    source_path: PathBuf,
    created_at: Timestamp,
    events: Vec<EventRecord>,
    current_index: usize,
    start_time: i64,
    end_time: i64,
}

impl ReplaySession {
    /// Wraps already-ingested events. An empty log is not an error.
    pub fn new(source_path: impl Into<PathBuf>, events: Vec<EventRecord>) -> Self {
        let (start_time, end_time) = match (events.first(), events.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => (0, 0),
        };

        let session = Self {
            id: generate_id(),
            source_path: source_path.into(),
            created_at: Timestamp::now(),
            events,
            current_index: 0,
            start_time,
            end_time,
        };
        debug!(
            id = %session.id,
            events = session.events.len(),
            start = start_time,
            end = end_time,
            "replay session created"
        );
        session
    }

    /// Reads the log at `path` and builds a session from it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let events = ingest::read_log(path)?;
        Ok(Self::new(path, events))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The file the events were read from. Never reopened.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Moves the convenience cursor. Rejects anything past the end sentinel.
    pub fn set_current_index(&mut self, index: usize) -> bool {
        if index > self.events.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Every event with `start <= timestamp <= end`, in log order.
    pub fn events_by_time_range(&self, start: i64, end: i64) -> Vec<&EventRecord> {
        self.events
            .iter()
            .filter(|e| (start..=end).contains(&e.timestamp))
            .collect()
    }

    /// The event at `index`, or `None` outside `[0, len)`.
    pub fn get_event(&self, index: usize) -> Option<&EventRecord> {
        self.events.get(index)
    }

    /// `end_time - start_time`.
    ///
    /// Not clamped: an out-of-order log can produce a negative duration, and
    /// a span wider than `i64` wraps.
    pub fn duration(&self) -> i64 {
        self.end_time.wrapping_sub(self.start_time)
    }

    /// Whether timestamps never decrease along the log.
    pub fn is_chronological(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use proptest::prelude::*;
    use tempfile::TempDir;

    fn session_of(stamps: &[i64]) -> ReplaySession {
        let events = stamps.iter().copied().map(EventRecord::at).collect();
        ReplaySession::new("test.log", events)
    }

    #[test]
    fn three_event_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("three.log");
        fs::write(
            &path,
            "{\"data\":{\"timestamp\":100}}\n\
             {\"data\":{\"timestamp\":200}}\n\
             {\"data\":{\"timestamp\":300}}\n",
        )
        .unwrap();

        let session = ReplaySession::load(&path).unwrap();

        assert_eq!(session.source_path(), path.as_path());
        assert_eq!(session.start_time(), 100);
        assert_eq!(session.end_time(), 300);
        assert_eq!(session.duration(), 200);

        let stamps: Vec<i64> = session
            .events_by_time_range(150, 300)
            .iter()
            .map(|e| e.timestamp)
            .collect();
        assert_eq!(stamps, vec![200, 300]);
        assert!(session.get_event(5).is_none());
    }

    #[test]
    fn blank_then_malformed_builds_no_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.log");
        fs::write(&path, "\n{\"data\":\n").unwrap();

        let err = ReplaySession::load(&path).unwrap_err();

        assert!(matches!(err, IngestError::Decode { line: 2, ref text, .. } if text == "{\"data\":"));
    }

    #[test]
    fn empty_session_is_zeroed() {
        let session = session_of(&[]);

        assert!(session.is_empty());
        assert_eq!(session.start_time(), 0);
        assert_eq!(session.end_time(), 0);
        assert_eq!(session.duration(), 0);
        assert!(session.events_by_time_range(i64::MIN, i64::MAX).is_empty());
        assert!(session.get_event(0).is_none());
    }

    #[test]
    fn single_event_has_zero_duration() {
        let session = session_of(&[42]);

        assert_eq!(session.start_time(), 42);
        assert_eq!(session.end_time(), 42);
        assert_eq!(session.duration(), 0);
    }

    #[test]
    fn out_of_order_log_reports_negative_duration() {
        let session = session_of(&[500, 100]);

        assert_eq!(session.duration(), -400);
        assert!(!session.is_chronological());
    }

    #[test]
    fn extreme_timestamps_wrap_instead_of_panicking() {
        let session = session_of(&[i64::MIN, i64::MAX]);

        assert_eq!(session.duration(), i64::MAX.wrapping_sub(i64::MIN));
        assert_eq!(session.duration(), -1);
        assert_eq!(session.events_by_time_range(i64::MIN, i64::MAX).len(), 2);
    }

    #[test]
    fn range_is_closed_on_both_ends() {
        let session = session_of(&[10, 20, 30]);

        assert_eq!(session.events_by_time_range(10, 30).len(), 3);
        assert_eq!(session.events_by_time_range(20, 20).len(), 1);
        assert!(session.events_by_time_range(21, 29).is_empty());
        assert!(session.events_by_time_range(30, 10).is_empty());
    }

    #[test]
    fn get_event_returns_stored_record() {
        let session = session_of(&[1, 2, 3]);

        assert_eq!(session.get_event(1), Some(&EventRecord::at(2)));
        assert!(session.get_event(3).is_none());
        assert!(session.get_event(usize::MAX).is_none());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let a = session_of(&[1]);
        let b = session_of(&[1]);

        assert!(!a.id().is_empty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn cursor_accepts_end_sentinel_only() {
        let mut session = session_of(&[1, 2]);

        assert!(session.set_current_index(2));
        assert_eq!(session.current_index(), 2);
        assert!(!session.set_current_index(3));
        assert_eq!(session.current_index(), 2);
    }

    proptest! {
        #[test]
        fn bounds_follow_first_and_last(stamps in prop::collection::vec(-1_000_000i64..1_000_000, 1..50)) {
            let session = session_of(&stamps);

            prop_assert_eq!(session.start_time(), stamps[0]);
            prop_assert_eq!(session.end_time(), stamps[stamps.len() - 1]);
            prop_assert_eq!(session.duration(), session.end_time() - session.start_time());
        }

        #[test]
        fn range_is_ordered_subsequence(
            stamps in prop::collection::vec(0i64..1_000, 0..50),
            a in 0i64..1_000,
            b in 0i64..1_000,
        ) {
            let session = session_of(&stamps);
            let found = session.events_by_time_range(a, b);

            let expected: Vec<i64> = stamps.iter().copied().filter(|t| a <= *t && *t <= b).collect();
            let got: Vec<i64> = found.iter().map(|e| e.timestamp).collect();
            prop_assert_eq!(got, expected);
            if a > b {
                prop_assert!(found.is_empty());
            }
        }

        #[test]
        fn get_event_matches_storage(stamps in prop::collection::vec(any::<i64>(), 0..20), i in 0usize..40) {
            let session = session_of(&stamps);

            match stamps.get(i) {
                Some(t) => prop_assert_eq!(session.get_event(i).map(|e| e.timestamp), Some(*t)),
                None => prop_assert!(session.get_event(i).is_none()),
            }
        }
    }
}
