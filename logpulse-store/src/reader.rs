use crate::LogStore;
use chrono::{DateTime, Utc};
use logpulse_core::error::Result;
use logpulse_core::event::LogEvent;
use logpulse_core::normalize::{normalize, parse_line};
use logpulse_core::window::{Window, anchor_of};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Reads the store and turns it into normalized events.
///
/// Nothing is cached: every call rescans the whole store.
#[derive(Clone)]
pub struct EventReader {
    store: Arc<dyn LogStore>,
}

/// First few store lines, raw and normalized, for debugging shape detection.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub raw: Vec<Map<String, Value>>,
    pub parsed: Vec<LogEvent>,
}

impl EventReader {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LogStore> {
        &self.store
    }

    /// Every record that normalizes; the rest are dropped silently.
    pub fn load_events(&self) -> Result<Vec<LogEvent>> {
        let lines = self.store.read_lines()?;
        let total = lines.len();
        let events: Vec<LogEvent> = lines
            .iter()
            .filter_map(|line| parse_line(line))
            .filter_map(|raw| normalize(&raw))
            .collect();

        tracing::debug!(lines = total, events = events.len(), "reader: store scanned");
        Ok(events)
    }

    /// Latest timestamp across the whole store.
    pub fn latest_timestamp(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(anchor_of(&self.load_events()?))
    }

    /// Events within `minutes` of the latest stored timestamp.
    pub fn window(&self, minutes: u32) -> Result<Window> {
        Ok(Window::select(self.load_events()?, minutes))
    }

    /// Inspect the first `n` non-blank lines.
    pub fn sample(&self, n: usize) -> Result<Sample> {
        let mut sample = Sample::default();
        for line in self.store.read_lines()?.iter().take(n) {
            let Some(raw) = parse_line(line) else {
                continue;
            };
            if let Some(event) = normalize(&raw) {
                sample.parsed.push(event);
            }
            sample.raw.push(raw);
        }
        Ok(sample)
    }
}
