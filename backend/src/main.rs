use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use backend::config::Config;
use backend::health::HealthTargets;
use backend::leaderboard::{
    LeaderboardController, LeaderboardScheduler, RecordStore, RosterService, TimeWindowGate, UpdateOrchestrator,
};
use backend::third_party::{ChessComService, SlackService};
use log::error;
use tracing_subscriber::EnvFilter;

fn io_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // RUST_LOG wins; plain `log` records are bridged into the subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(io_error(e));
        }
    };

    let store = Arc::new(RecordStore::new(&config.store.path));
    if !store.path().exists() {
        log::warn!(
            "Players file {} does not exist yet - cycles will fail until it is created",
            store.path().display()
        );
    }

    let chess = match ChessComService::new_with_config(&config.chess) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to build Chess.com client: {}", e);
            return Err(io_error(e));
        }
    };
    let slack = match SlackService::new_with_config(&config.slack) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to build Slack client: {}", e);
            return Err(io_error(e));
        }
    };
    if !slack.has_token() {
        log::warn!("Slack bot token missing - /slack commands will answer with a configuration error");
    }

    let orchestrator = Arc::new(UpdateOrchestrator::new(
        store.clone(),
        chess.clone(),
        TimeWindowGate::from_config(&config.scheduler),
        config.scheduler.rate_limit_delay(),
    ));
    let roster = Arc::new(RosterService::new(
        store.clone(),
        chess,
        slack.clone(),
        slack,
        config.scheduler.timezone,
    ));

    let mut scheduler = LeaderboardScheduler::start(&config.scheduler, orchestrator.clone());
    let monitor = scheduler.monitor();

    let health_targets = web::Data::new(HealthTargets {
        store: store.clone(),
        scheduler: monitor.clone(),
        scheduler_enabled: config.scheduler.enabled,
    });
    let controller = LeaderboardController::new(orchestrator, roster, monitor);
    let static_dir = config.server.static_dir.clone();

    log::info!("Starting server on {}:{}", config.server.host, config.server.port);

    let server = HttpServer::new(move || {
        let controller = controller.clone();
        App::new()
            .wrap(backend::middleware::Logger)
            .wrap(backend::middleware::cors_middleware())
            .app_data(web::JsonConfig::default().limit(1024 * 1024))
            .app_data(health_targets.clone())
            .service(backend::health::health_check)
            .service(backend::health::detailed_health_check)
            .route("/metrics", web::get().to(backend::metrics::metrics_endpoint))
            .configure(move |cfg| LeaderboardController::configure_routes(cfg, controller))
            // Leaderboard page and its assets; registered last so API routes win
            .service(actix_files::Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await;

    log::info!("HTTP server stopped, shutting down scheduler");
    scheduler.stop().await;

    server
}
