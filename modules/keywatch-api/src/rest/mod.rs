pub mod monitor;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use keywatch_common::{AiSettings, StoreError};

use crate::auth::require_admin;
use crate::AppState;

// --- Request bodies ---

#[derive(Deserialize)]
pub struct KeywordBody {
    keyword: String,
}

#[derive(Deserialize)]
pub struct RecipientBody {
    chat_id: i64,
}

#[derive(Deserialize)]
pub struct VkGroupBody {
    group: String,
}

#[derive(Deserialize)]
pub struct ChannelBody {
    channel: String,
}

#[derive(Deserialize)]
pub struct TelegramTokenBody {
    bot_token: String,
}

#[derive(Deserialize)]
pub struct VkTokenBody {
    access_token: String,
}

#[derive(Deserialize)]
pub struct MonitoringBody {
    check_interval: u64,
    max_posts_per_check: u32,
}

// --- Helpers ---

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn store_error(err: StoreError) -> Response {
    match err {
        StoreError::Invalid(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        other => {
            error!(error = %other, "Config store failure");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to save configuration")
        }
    }
}

/// 201 when added, 409 when already present.
fn added<T: serde::Serialize>(result: Result<bool, StoreError>, what: &str, value: T) -> Response {
    match result {
        Ok(true) => {
            info!(what, "Added to configuration");
            (StatusCode::CREATED, Json(value)).into_response()
        }
        Ok(false) => error_response(StatusCode::CONFLICT, format!("{what} already exists")),
        Err(e) => store_error(e),
    }
}

/// 204 when removed, 404 when absent.
fn removed(result: Result<bool, StoreError>, what: &str) -> Response {
    match result {
        Ok(true) => {
            info!(what, "Removed from configuration");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("{what} not found")),
        Err(e) => store_error(e),
    }
}

// --- Router ---

/// All `/api/*` routes, behind Basic auth.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/config", get(api_config))
        .route("/api/keywords", get(api_keywords).post(api_add_keyword))
        .route("/api/keywords/{keyword}", delete(api_remove_keyword))
        .route("/api/recipients", get(api_recipients).post(api_add_recipient))
        .route("/api/recipients/{id}", delete(api_remove_recipient))
        .route("/api/vk/groups", get(api_vk_groups).post(api_add_vk_group))
        .route("/api/vk/groups/{group}", delete(api_remove_vk_group))
        .route("/api/telegram/channels", get(api_telegram_channels).post(api_add_telegram_channel))
        .route("/api/telegram/channels/{channel}", delete(api_remove_telegram_channel))
        .route("/api/monitoring", put(api_update_monitoring))
        .route("/api/ai", put(api_update_ai))
        .route("/api/telegram", put(api_update_telegram))
        .route("/api/vk", put(api_update_vk))
        .route("/api/monitor/start", axum::routing::post(monitor::api_monitor_start))
        .route("/api/monitor/stop", axum::routing::post(monitor::api_monitor_stop))
        .route("/api/monitor/status", get(monitor::api_monitor_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}

// --- Handlers ---

pub async fn api_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot().redacted())
}

pub async fn api_keywords(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.keywords())
}

pub async fn api_add_keyword(
    State(state): State<Arc<AppState>>,
    Json(body): Json<KeywordBody>,
) -> Response {
    let keyword = body.keyword.trim().to_string();
    added(state.store.add_keyword(&keyword), "keyword", json!({ "keyword": keyword }))
}

pub async fn api_remove_keyword(
    State(state): State<Arc<AppState>>,
    Path(keyword): Path<String>,
) -> Response {
    removed(state.store.remove_keyword(&keyword), "keyword")
}

pub async fn api_recipients(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.recipients())
}

pub async fn api_add_recipient(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecipientBody>,
) -> Response {
    added(state.store.add_recipient(body.chat_id), "recipient", json!({ "chat_id": body.chat_id }))
}

pub async fn api_remove_recipient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    removed(state.store.remove_recipient(id), "recipient")
}

pub async fn api_vk_groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.vk_groups())
}

pub async fn api_add_vk_group(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VkGroupBody>,
) -> Response {
    let group = body.group.trim().to_string();
    added(state.store.add_vk_group(&group), "VK group", json!({ "group": group }))
}

pub async fn api_remove_vk_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Response {
    removed(state.store.remove_vk_group(&group), "VK group")
}

pub async fn api_telegram_channels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.telegram_channels())
}

pub async fn api_add_telegram_channel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChannelBody>,
) -> Response {
    let channel = body.channel.trim().to_string();
    added(
        state.store.add_telegram_channel(&channel),
        "Telegram channel",
        json!({ "channel": channel }),
    )
}

pub async fn api_remove_telegram_channel(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> Response {
    removed(state.store.remove_telegram_channel(&channel), "Telegram channel")
}

pub async fn api_update_monitoring(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MonitoringBody>,
) -> Response {
    match state
        .store
        .update_monitoring(body.check_interval, body.max_posts_per_check)
    {
        Ok(_) => Json(state.store.snapshot().monitoring).into_response(),
        Err(e) => store_error(e),
    }
}

/// Replace the `ai` section. Takes effect the next time the monitor starts.
pub async fn api_update_ai(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AiSettings>,
) -> Response {
    match state.store.update_ai(body) {
        Ok(_) => Json(state.store.snapshot().redacted().ai).into_response(),
        Err(e) => store_error(e),
    }
}

/// Replace the bot token. Takes effect the next time the monitor starts.
pub async fn api_update_telegram(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TelegramTokenBody>,
) -> Response {
    match state.store.update_telegram_token(&body.bot_token) {
        Ok(changed) => {
            info!(changed, "Telegram bot token updated");
            Json(state.store.snapshot().redacted().telegram).into_response()
        }
        Err(e) => store_error(e),
    }
}

/// Replace the VK access token. Takes effect the next time the monitor starts.
pub async fn api_update_vk(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VkTokenBody>,
) -> Response {
    match state.store.update_vk_token(&body.access_token) {
        Ok(changed) => {
            info!(changed, "VK access token updated");
            Json(state.store.snapshot().redacted().vk).into_response()
        }
        Err(e) => store_error(e),
    }
}
