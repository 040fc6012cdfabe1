use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Self-metrics for the service, all gated behind `enabled`.
///
/// When disabled no registry is created and every `record_*` call returns
/// immediately.
pub struct MetricsCollector {
    enabled: bool,
    registry: Option<Registry>,
    pub uploads_total: Option<IntCounterVec>,
    pub records_written_total: Option<IntCounter>,
    pub queries_total: Option<IntCounterVec>,
    pub store_scan_seconds: Option<HistogramVec>,
    pub http_requests_total: Option<IntCounterVec>,
}

impl MetricsCollector {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self::disabled());
        }

        let registry = Registry::new();

        let uploads_total = IntCounterVec::new(
            Opts::new("uploads_total", "Accepted uploads by detected shape").namespace("logpulse"),
            &["mode"],
        )?;
        let records_written_total = IntCounter::with_opts(
            Opts::new("records_written_total", "Records written to the store").namespace("logpulse"),
        )?;
        let queries_total = IntCounterVec::new(
            Opts::new("queries_total", "Analytics queries served").namespace("logpulse"),
            &["endpoint"],
        )?;
        let store_scan_seconds = HistogramVec::new(
            HistogramOpts::new("store_scan_seconds", "Full store scan + aggregation time")
                .namespace("logpulse")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["endpoint"],
        )?;
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests handled").namespace("logpulse"),
            &["method", "status"],
        )?;

        registry.register(Box::new(uploads_total.clone()))?;
        registry.register(Box::new(records_written_total.clone()))?;
        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(store_scan_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            uploads_total: Some(uploads_total),
            records_written_total: Some(records_written_total),
            queries_total: Some(queries_total),
            store_scan_seconds: Some(store_scan_seconds),
            http_requests_total: Some(http_requests_total),
        })
    }

    /// No-op collector.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            registry: None,
            uploads_total: None,
            records_written_total: None,
            queries_total: None,
            store_scan_seconds: None,
            http_requests_total: None,
        }
    }

    /// Record a successful upload.
    #[inline]
    pub fn record_upload(&self, mode: &str, written: usize) {
        if !self.enabled {
            return;
        }
        if let Some(ref counter) = self.uploads_total {
            counter.with_label_values(&[mode]).inc();
        }
        if let Some(ref counter) = self.records_written_total {
            counter.inc_by(written as u64);
        }
    }

    /// Record one analytics query and how long its scan took.
    #[inline]
    pub fn record_query(&self, endpoint: &str, scan_secs: f64) {
        if !self.enabled {
            return;
        }
        if let Some(ref counter) = self.queries_total {
            counter.with_label_values(&[endpoint]).inc();
        }
        if let Some(ref hist) = self.store_scan_seconds {
            hist.with_label_values(&[endpoint]).observe(scan_secs);
        }
    }

    /// Record any HTTP request (no-op when disabled).
    #[inline]
    pub fn record_http(&self, method: &str, status: u16) {
        if !self.enabled {
            return;
        }
        if let Some(ref counter) = self.http_requests_total {
            let mut buf = itoa::Buffer::new();
            let status_str = buf.format(status);
            counter.with_label_values(&[method, status_str]).inc();
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        if let Some(ref registry) = self.registry {
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            let mut buffer = Vec::new();
            encoder.encode(&metric_families, &mut buffer).unwrap_or(());
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
