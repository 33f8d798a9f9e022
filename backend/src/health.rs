use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::leaderboard::scheduler::SchedulerMonitor;
use crate::leaderboard::store::RecordStore;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub version: &'static str,
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().timestamp(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct ServiceHealthStatus {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_time_ms: Option<u64>,
}

impl ServiceHealthStatus {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: None,
            response_time_ms: None,
        }
    }

    fn unhealthy(message: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: Some(message),
            response_time_ms: None,
        }
    }

    fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self
    }

    fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// The store is healthy when its current snapshot parses.
async fn check_store(store: &RecordStore) -> ServiceHealthStatus {
    let start = Instant::now();

    match timeout(Duration::from_secs(5), store.snapshot()).await {
        Ok(Ok(records)) => {
            let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            ServiceHealthStatus::healthy()
                .with_message(format!("{} players", records.len()))
                .with_response_time(elapsed)
        }
        Ok(Err(e)) => ServiceHealthStatus::unhealthy(e.to_string()),
        Err(_) => ServiceHealthStatus::unhealthy("Store read timeout".to_string()),
    }
}

fn check_scheduler(monitor: &SchedulerMonitor, enabled: bool) -> ServiceHealthStatus {
    if !enabled {
        return ServiceHealthStatus::healthy().with_message("Scheduler disabled".to_string());
    }

    if monitor.is_running() {
        ServiceHealthStatus::healthy()
    } else {
        ServiceHealthStatus::unhealthy("Scheduler is not running".to_string())
    }
}

/// What the detailed health check inspects.
#[derive(Clone)]
pub struct HealthTargets {
    pub store: Arc<RecordStore>,
    pub scheduler: SchedulerMonitor,
    pub scheduler_enabled: bool,
}

#[derive(Serialize)]
struct ServicesHealth {
    store: ServiceHealthStatus,
    scheduler: ServiceHealthStatus,
}

#[derive(Serialize)]
struct DetailedHealthResponse {
    status: String,
    timestamp: i64,
    version: &'static str,
    services: ServicesHealth,
}

#[get("/health/detailed")]
pub async fn detailed_health_check(targets: web::Data<HealthTargets>) -> impl Responder {
    let store_status = check_store(&targets.store).await;
    let scheduler_status = check_scheduler(&targets.scheduler, targets.scheduler_enabled);

    let overall_status = if store_status.is_healthy() && scheduler_status.is_healthy() {
        "ok"
    } else {
        "degraded"
    };

    let response = DetailedHealthResponse {
        status: overall_status.to_string(),
        timestamp: Utc::now().timestamp(),
        version: env!("CARGO_PKG_VERSION"),
        services: ServicesHealth {
            store: store_status,
            scheduler: scheduler_status,
        },
    };

    if overall_status == "ok" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
