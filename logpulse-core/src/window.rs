use crate::event::LogEvent;
use chrono::{DateTime, Duration, Utc};

/// Upper bound for window sizes: 14 days.
pub const MAX_WINDOW_MINUTES: u32 = 60 * 24 * 14;

/// Events falling in `[anchor - minutes, anchor]`.
///
/// The anchor is the latest timestamp among *all* events handed in, not the
/// wall clock, so historical datasets stay queryable.
#[derive(Debug, Clone, Default)]
pub struct Window {
    pub anchor: Option<DateTime<Utc>>,
    pub start: Option<DateTime<Utc>>,
    pub events: Vec<LogEvent>,
}

impl Window {
    /// Select the window from the full, unfiltered event set.
    pub fn select(events: Vec<LogEvent>, minutes: u32) -> Self {
        let Some(anchor) = anchor_of(&events) else {
            return Self::default();
        };
        let start = anchor - Duration::minutes(i64::from(minutes));
        let events = events
            .into_iter()
            .filter(|e| start <= e.timestamp && e.timestamp <= anchor)
            .collect();

        Self {
            anchor: Some(anchor),
            start: Some(start),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Latest timestamp in the set.
pub fn anchor_of(events: &[LogEvent]) -> Option<DateTime<Utc>> {
    events.iter().map(|e| e.timestamp).max()
}
