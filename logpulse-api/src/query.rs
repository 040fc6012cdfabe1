//! Query-string parameters, their defaults and the ranges they are clamped to.

use logpulse_core::window::MAX_WINDOW_MINUTES;
use logpulse_core::{SortKey, SortOrder};
use serde::Deserialize;

/// Default, lower and upper bound of one integer parameter.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub default: i64,
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    const fn new(default: i64, min: i64, max: i64) -> Self {
        Self { default, min, max }
    }

    /// Missing ⇒ default; out of range ⇒ nearest bound.
    pub fn apply(&self, value: Option<i64>) -> i64 {
        value.unwrap_or(self.default).clamp(self.min, self.max)
    }
}

const MAX_WINDOW: i64 = MAX_WINDOW_MINUTES as i64;

pub const METRICS_MINUTES: Bounds = Bounds::new(60, 1, MAX_WINDOW);
pub const TRAFFIC_MINUTES: Bounds = Bounds::new(1440, 1, MAX_WINDOW);
pub const ENDPOINT_LIMIT: Bounds = Bounds::new(10, 1, 200);
pub const ERROR_LIMIT: Bounds = Bounds::new(20, 1, 200);
pub const SAMPLE_SIZE: Bounds = Bounds::new(5, 1, 50);

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub minutes: Option<i64>,
}

impl WindowQuery {
    pub fn minutes(&self, bounds: Bounds) -> u32 {
        // Bounds never exceed `MAX_WINDOW_MINUTES`, so this always fits.
        u32::try_from(bounds.apply(self.minutes)).unwrap_or(MAX_WINDOW_MINUTES)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointsQuery {
    pub minutes: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl EndpointsQuery {
    pub fn minutes(&self) -> u32 {
        WindowQuery {
            minutes: self.minutes,
        }
        .minutes(METRICS_MINUTES)
    }

    pub fn limit(&self) -> usize {
        ENDPOINT_LIMIT.apply(self.limit) as usize
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_by.as_deref().map(SortKey::from_param).unwrap_or_default()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.order.as_deref().map(SortOrder::from_param).unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SampleQuery {
    pub n: Option<i64>,
}
