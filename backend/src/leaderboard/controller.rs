use actix_web::{web, HttpResponse};
use serde_json::Value;
use shared::{PlayerRecord, SlashCommandForm};
use std::sync::Arc;

use super::roster::RosterService;
use super::scheduler::SchedulerMonitor;
use super::store::RecordStore;
use super::usecase::{outcome_of, UpdateOrchestrator};
use crate::error::ApiError;

const ADD_ACK: &str = "⏳ Adding your account... you will get a confirmation in a few seconds.";
const REMOVE_ACK: &str = "⏳ Removing your account... you will get a confirmation in a few seconds.";
const MISSING_USER_ID: &str = "❌ Error: missing user_id.";

/// HTTP entry points around the update engine.
#[derive(Clone)]
pub struct LeaderboardController {
    orchestrator: Arc<UpdateOrchestrator>,
    roster: Arc<RosterService>,
    store: Arc<RecordStore>,
    scheduler: SchedulerMonitor,
}

impl LeaderboardController {
    pub fn new(
        orchestrator: Arc<UpdateOrchestrator>,
        roster: Arc<RosterService>,
        scheduler: SchedulerMonitor,
    ) -> Self {
        let store = orchestrator.store().clone();
        Self {
            orchestrator,
            roster,
            store,
            scheduler,
        }
    }

    pub fn configure_routes(cfg: &mut web::ServiceConfig, controller: LeaderboardController) {
        cfg.app_data(web::Data::new(controller))
            .service(
                web::scope("/api")
                    .route("/refresh", web::post().to(Self::refresh))
                    .route("/players", web::get().to(Self::list_players))
                    .route("/players", web::post().to(Self::replace_players))
                    .route("/scheduler/status", web::get().to(Self::scheduler_status)),
            )
            .service(
                web::scope("/slack")
                    .route("/chessadd", web::post().to(Self::slack_add))
                    .route("/chessdelete", web::post().to(Self::slack_delete)),
            )
            .route("/data/players.json", web::get().to(Self::list_players));
    }

    /// Runs one cycle synchronously. Anything but a completed cycle is a 500.
    async fn refresh(ctrl: web::Data<LeaderboardController>) -> HttpResponse {
        log::info!("Manual refresh triggered via /api/refresh");
        let result = ctrl.orchestrator.run().await;
        let outcome = outcome_of(&result);

        if outcome.success {
            HttpResponse::Ok().json(outcome)
        } else {
            HttpResponse::InternalServerError().json(outcome)
        }
    }

    async fn list_players(ctrl: web::Data<LeaderboardController>) -> Result<HttpResponse, ApiError> {
        let records = ctrl.store.snapshot().await?;
        Ok(HttpResponse::Ok().json(records))
    }

    async fn replace_players(
        ctrl: web::Data<LeaderboardController>,
        body: web::Json<Value>,
    ) -> Result<HttpResponse, ApiError> {
        let payload = body.into_inner();
        if !payload.is_array() {
            return Err(ApiError::bad_request("Payload must be a list of players."));
        }

        let records: Vec<PlayerRecord> = serde_json::from_value(payload)?;
        let count = ctrl.roster.replace_all(records).await?;

        Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "players.json updated",
            "count": count
        })))
    }

    async fn scheduler_status(ctrl: web::Data<LeaderboardController>) -> HttpResponse {
        HttpResponse::Ok().json(ctrl.scheduler.status())
    }

    /// Acknowledges right away; the result reaches the user through `response_url`.
    async fn slack_add(
        ctrl: web::Data<LeaderboardController>,
        form: web::Form<SlashCommandForm>,
    ) -> HttpResponse {
        let form = form.into_inner();
        let user_id = Some(form.user_id.trim().to_string()).filter(|id| !id.is_empty());

        ctrl.roster
            .dispatch_add(form.text.trim().to_string(), user_id, form.response_url);

        HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(ADD_ACK)
    }

    async fn slack_delete(
        ctrl: web::Data<LeaderboardController>,
        form: web::Form<SlashCommandForm>,
    ) -> HttpResponse {
        let form = form.into_inner();
        let user_id = form.user_id.trim().to_string();
        if user_id.is_empty() {
            return HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(MISSING_USER_ID);
        }

        ctrl.roster.dispatch_remove(user_id, form.response_url);

        HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(REMOVE_ACK)
    }
}
