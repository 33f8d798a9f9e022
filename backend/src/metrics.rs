use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Global metrics instance, built on first use. `None` if registration failed.
static METRICS: Lazy<Option<Arc<Metrics>>> = Lazy::new(|| match Metrics::new() {
    Ok(metrics) => Some(Arc::new(metrics)),
    Err(e) => {
        log::error!("Failed to initialize metrics: {}", e);
        None
    }
});

/// Update cycle metrics
pub struct UpdateMetrics {
    /// Cycle duration histogram (in seconds)
    pub cycle_duration: HistogramVec,
    /// Cycles by outcome: success, skipped, no_updates, failed
    pub cycles_total: IntCounterVec,
}

/// Rating provider metrics
pub struct ProviderMetrics {
    /// Stats fetches by status: ok, unavailable
    pub fetches_total: IntCounterVec,
}

/// Scheduler metrics
pub struct SchedulerMetrics {
    /// Scheduler status gauge (1 = running, 0 = stopped)
    pub scheduler_status: IntGauge,
    /// Ticks dropped because a cycle was already in flight
    pub ticks_dropped: IntCounter,
}

/// All application metrics
pub struct Metrics {
    registry: Registry,
    pub update: UpdateMetrics,
    pub provider: ProviderMetrics,
    pub scheduler: SchedulerMetrics,
}

impl Metrics {
    /// Build all metrics and register them with a dedicated registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycle_duration = HistogramVec::new(
            HistogramOpts::new("cycle_duration_seconds", "Update cycle duration in seconds")
                .namespace("leaderboard")
                .subsystem("update")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(cycle_duration.clone()))?;

        let cycles_total = IntCounterVec::new(
            Opts::new("cycles_total", "Total number of update cycles")
                .namespace("leaderboard")
                .subsystem("update"),
            &["outcome"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let fetches_total = IntCounterVec::new(
            Opts::new("fetches_total", "Total number of rating provider fetches")
                .namespace("leaderboard")
                .subsystem("provider"),
            &["status"],
        )?;
        registry.register(Box::new(fetches_total.clone()))?;

        let scheduler_status = IntGauge::with_opts(
            Opts::new("status", "Scheduler status (1 = running, 0 = stopped)")
                .namespace("leaderboard")
                .subsystem("scheduler"),
        )?;
        registry.register(Box::new(scheduler_status.clone()))?;

        let ticks_dropped = IntCounter::with_opts(
            Opts::new("ticks_dropped_total", "Ticks dropped while a cycle was in flight")
                .namespace("leaderboard")
                .subsystem("scheduler"),
        )?;
        registry.register(Box::new(ticks_dropped.clone()))?;

        Ok(Metrics {
            registry,
            update: UpdateMetrics {
                cycle_duration,
                cycles_total,
            },
            provider: ProviderMetrics { fetches_total },
            scheduler: SchedulerMetrics {
                scheduler_status,
                ticks_dropped,
            },
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the global metrics instance (if initialization succeeded)
    pub fn global() -> Option<Arc<Metrics>> {
        METRICS.clone()
    }

    /// Text exposition of everything registered
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Helper function to record one finished update cycle
pub fn record_update_cycle(metrics: &Metrics, outcome: &str, duration: Duration) {
    metrics
        .update
        .cycle_duration
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());

    metrics.update.cycles_total.with_label_values(&[outcome]).inc();
}

/// Helper function to record a rating provider fetch
pub fn record_provider_fetch(metrics: &Metrics, status: &str) {
    metrics.provider.fetches_total.with_label_values(&[status]).inc();
}

pub fn set_scheduler_running(metrics: &Metrics, running: bool) {
    metrics.scheduler.scheduler_status.set(i64::from(running));
}

pub fn record_dropped_tick(metrics: &Metrics) {
    metrics.scheduler.ticks_dropped.inc();
}

/// GET /metrics
pub async fn metrics_endpoint() -> HttpResponse {
    let Some(metrics) = Metrics::global() else {
        return HttpResponse::ServiceUnavailable().body("metrics unavailable");
    };

    match metrics.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().body("failed to encode metrics")
        }
    }
}
