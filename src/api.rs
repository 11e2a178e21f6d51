//! HTTP surface: request types, error mapping, router, handlers.
//!
//! Every handler authenticates through the session gate, delegates to the
//! orchestrator or the store, and returns JSON. Errors become
//! `{"error": msg}` bodies with the status the taxonomy dictates.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::error;

use crate::clock;
use crate::errors::AppError;
use crate::models::*;
use crate::orchestrator::Orchestrator;
use crate::session;

/// Cap on weekly focus areas.
const MAX_ENFOQUES: usize = 3;

pub struct AppState {
    pub orchestrator: Orchestrator,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

fn default_lang() -> String {
    "en".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMissionsRequest {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Deserialize)]
pub struct GenerateTasksRequest {
    #[serde(default = "default_lang")]
    pub lang: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlanRequest {
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub focus_goals: Vec<String>,
    #[serde(default)]
    pub context: serde_json::Value,
    pub week_start: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTaskRequest {
    pub task_id: i64,
    #[serde(default = "default_lang")]
    pub lang: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetNorthStarRequest {
    #[serde(default)]
    pub goal_text: String,
    pub source_board_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct SetEnfoquesRequest {
    #[serde(default)]
    pub enfoques: Vec<String>,
}

// ── Error mapping ─────────────────────────────────────────────────────

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Validation(_)
            | AppError::NoNorthStar
            | AppError::NoEnfoques
            | AppError::ImmutableTask => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::GenerationParse(reason) => {
                error!(%reason, "completion response was unusable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Completion service returned an unusable response".to_string(),
                )
            }
            AppError::UpstreamConfig(_) => {
                error!(error = %self, "completion service misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Upstream(source) => {
                error!(error = %source, "completion service call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Completion service unavailable".to_string(),
                )
            }
            AppError::Database(source) => {
                error!(error = %source, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Other(source) => {
                error!(error = %source, "unexpected failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/generate-missions", post(generate_missions))
        .route("/generate-tasks", post(generate_tasks))
        .route("/weekly-plan", post(weekly_plan))
        .route("/swap-task", post(swap_task))
        .route("/north-star", get(get_north_star).post(set_north_star))
        .route("/enfoques", get(get_enfoques).post(set_enfoques))
        .route("/tasks/{id}/toggle", post(toggle_task))
        .route("/streak", get(get_streak))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn generate_missions(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<GenerateMissionsRequest>,
) -> Result<Json<MissionsResponse>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let resp = state
        .orchestrator
        .ensure_today_tasks(&user, &req.lang, req.force_regenerate)
        .await?;
    Ok(Json(resp))
}

async fn generate_tasks(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<GenerateTasksRequest>,
) -> Result<Json<TasksResponse>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let resp = state.orchestrator.tasks_from_boards(&user, &req.lang).await?;
    Ok(Json(resp))
}

async fn weekly_plan(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<WeeklyPlanRequest>,
) -> Result<Json<WeeklyPlanResponse>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    if req.focus_goals.is_empty() {
        return Err(AppError::validation("focusGoals is required"));
    }
    if req.focus_goals.len() > MAX_ENFOQUES {
        return Err(AppError::validation("Maximum 3 enfoques"));
    }

    let week_start = req
        .week_start
        .map(clock::week_start)
        .unwrap_or_else(|| clock::week_start(state.orchestrator.today()));

    let user_id = user.id;
    let goals = req.focus_goals.clone();
    let context = req.context.clone();
    state
        .orchestrator
        .db()
        .call(move |db| {
            db.upsert_weekly_plan(user_id, week_start, &goals, &context)?;
            let north_star_id = db.active_north_star(user_id)?.map(|n| n.id);
            db.replace_enfoques(user_id, week_start, &goals, north_star_id)?;
            Ok(())
        })
        .await
        .map_err(AppError::Database)?;

    let missions = state
        .orchestrator
        .ensure_today_tasks(&user, &req.lang, true)
        .await?;

    let core_count = missions
        .missions
        .iter()
        .filter(|m| m.task_type == Some(TaskType::NonNegotiable))
        .count();
    let bonus_count = missions.missions.len() - core_count;
    Ok(Json(WeeklyPlanResponse {
        tasks: missions.missions,
        core_count,
        bonus_count,
        generated: missions.generated,
    }))
}

async fn swap_task(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<SwapTaskRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let task = state
        .orchestrator
        .swap_task(&user, req.task_id, &req.lang)
        .await?;
    Ok(Json(serde_json::json!({"task": task})))
}

async fn get_north_star(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let user_id = user.id;
    let north_star = state
        .orchestrator
        .db()
        .call(move |db| db.active_north_star(user_id))
        .await
        .map_err(AppError::Database)?;
    Ok(Json(serde_json::json!({"northStar": north_star})))
}

async fn set_north_star(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<SetNorthStarRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    if req.goal_text.trim().is_empty() {
        return Err(AppError::validation("goalText is required"));
    }
    let user_id = user.id;
    let goal_text = req.goal_text.trim().to_string();
    let board = req.source_board_id;
    let north_star = state
        .orchestrator
        .db()
        .call(move |db| db.set_north_star(user_id, &goal_text, board))
        .await
        .map_err(AppError::Database)?;
    Ok(Json(serde_json::json!({"northStar": north_star})))
}

async fn get_enfoques(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let user_id = user.id;
    let week = clock::week_start(state.orchestrator.today());
    let enfoques = state
        .orchestrator
        .db()
        .call(move |db| db.enfoques_for_week(user_id, week))
        .await
        .map_err(AppError::Database)?;
    Ok(Json(serde_json::json!({"enfoques": enfoques})))
}

async fn set_enfoques(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<SetEnfoquesRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let names: Vec<String> = req
        .enfoques
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return Err(AppError::validation("At least one enfoque is required"));
    }
    if names.len() > MAX_ENFOQUES {
        return Err(AppError::validation("Maximum 3 enfoques"));
    }
    let user_id = user.id;
    let week = clock::week_start(state.orchestrator.today());
    let enfoques = state
        .orchestrator
        .db()
        .call(move |db| {
            let north_star_id = db.active_north_star(user_id)?.map(|n| n.id);
            db.replace_enfoques(user_id, week, &names, north_star_id)
        })
        .await
        .map_err(AppError::Database)?;
    Ok(Json(serde_json::json!({"enfoques": enfoques})))
}

async fn toggle_task(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let (task, streak) = state.orchestrator.toggle_completion(&user, id).await?;
    Ok(Json(serde_json::json!({"task": task, "streak": streak})))
}

async fn get_streak(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = session::authenticate(state.orchestrator.db(), &headers).await?;
    let streak = state.orchestrator.current_streak(user.id).await?;
    Ok(Json(serde_json::json!({"streak": streak})))
}
