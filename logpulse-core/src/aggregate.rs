//! Derived analytics over a set of normalized events.
//!
//! Every function here is pure: the caller supplies the (usually windowed)
//! events and gets a freshly computed value back.

use crate::event::LogEvent;
use crate::stats::{mean, percentile, rate_percent, sort_ascending};
use chrono::{Local, Timelike};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Summary over the request-like events of a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_requests: usize,
    pub error_count: usize,
    pub error_rate: f64,
    pub avg_response_time: f64,
    pub p50_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub requests_by_status: BTreeMap<String, usize>,
    pub requests_by_method: BTreeMap<String, usize>,
    pub unique_users: usize,
    pub authenticated_requests: usize,
}

/// Per-path request statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStat {
    pub path: String,
    pub count: usize,
    pub errors: usize,
    pub avg_response_time: f64,
    pub p95_response_time: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Count,
    P95,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortKey {
    /// Case-insensitive; anything unrecognised sorts by count.
    pub fn from_param(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("p95") {
            SortKey::P95
        } else {
            SortKey::Count
        }
    }
}

impl SortOrder {
    /// Case-insensitive; anything but `asc` is descending.
    pub fn from_param(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

fn requests(events: &[LogEvent]) -> impl Iterator<Item = &LogEvent> {
    events.iter().filter(|e| e.is_request())
}

fn sorted_durations<'a>(events: impl IntoIterator<Item = &'a LogEvent>) -> Vec<f64> {
    let mut durations: Vec<f64> = events.into_iter().filter_map(|e| e.duration_ms).collect();
    sort_ascending(&mut durations);
    durations
}

pub fn compute_metrics(events: &[LogEvent]) -> Metrics {
    let reqs: Vec<&LogEvent> = requests(events).collect();
    let total = reqs.len();
    let error_count = reqs.iter().filter(|e| e.is_failed_status()).count();

    let durations = sorted_durations(reqs.iter().copied());

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_method: BTreeMap<String, usize> = BTreeMap::new();
    for e in &reqs {
        if let Some(status) = e.status_code {
            *by_status.entry(status.to_string()).or_default() += 1;
        }
        if let Some(method) = &e.method {
            *by_method.entry(method.clone()).or_default() += 1;
        }
    }

    let unique_users = reqs
        .iter()
        .filter_map(|e| e.user_id)
        .collect::<HashSet<_>>()
        .len();
    let authenticated_requests = reqs
        .iter()
        .filter(|e| e.is_authenticated == Some(true))
        .count();

    Metrics {
        total_requests: total,
        error_count,
        error_rate: rate_percent(error_count, total),
        avg_response_time: mean(&durations),
        p50_response_time: percentile(&durations, 0.50),
        p95_response_time: percentile(&durations, 0.95),
        p99_response_time: percentile(&durations, 0.99),
        requests_by_status: by_status,
        requests_by_method: by_method,
        unique_users,
        authenticated_requests,
    }
}

/// Group request-like events by exact path, rank and truncate.
///
/// Ties keep the order in which paths were first seen.
pub fn compute_endpoints(
    events: &[LogEvent],
    limit: usize,
    sort_by: SortKey,
    order: SortOrder,
) -> Vec<EndpointStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&LogEvent>)> = Vec::new();

    for e in requests(events) {
        let Some(path) = e.path.as_deref() else {
            continue;
        };
        match index.get(path) {
            Some(&i) => groups[i].1.push(e),
            None => {
                index.insert(path, groups.len());
                groups.push((path, vec![e]));
            }
        }
    }

    let mut stats: Vec<EndpointStat> = groups
        .into_iter()
        .map(|(path, items)| {
            let count = items.len();
            let errors = items.iter().filter(|e| e.is_failed_status()).count();
            let durations = sorted_durations(items.iter().copied());
            EndpointStat {
                path: path.to_string(),
                count,
                errors,
                avg_response_time: mean(&durations),
                p95_response_time: percentile(&durations, 0.95),
                error_rate: rate_percent(errors, count),
            }
        })
        .collect();

    let key = |a: &EndpointStat, b: &EndpointStat| -> Ordering {
        match sort_by {
            SortKey::Count => a.count.cmp(&b.count),
            SortKey::P95 => a.p95_response_time.total_cmp(&b.p95_response_time),
        }
    };
    // `sort_by` is stable in both directions.
    match order {
        SortOrder::Asc => stats.sort_by(key),
        SortOrder::Desc => stats.sort_by(|a, b| key(b, a)),
    }

    stats.truncate(limit);
    stats
}

/// Most recent error-classified events, newest first.
pub fn compute_errors(events: &[LogEvent], limit: usize) -> Vec<LogEvent> {
    let mut errors: Vec<LogEvent> = events.iter().filter(|e| e.is_error()).cloned().collect();
    errors.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    errors.truncate(limit);
    errors
}

/// Request counts per local-time hour of day, all 24 buckets present.
///
/// Buckets use the serving process's local time zone, unlike every other
/// computation which stays in UTC.
pub fn hourly_distribution(events: &[LogEvent]) -> BTreeMap<String, usize> {
    let mut counts = [0usize; 24];
    for e in requests(events) {
        let hour = e.timestamp.with_timezone(&Local).hour() as usize;
        counts[hour] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, &n)| (format!("{hour:02}"), n))
        .collect()
}
