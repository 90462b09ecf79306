use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::AppState;

pub async fn api_monitor_start(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let started = state.monitor.start();
    Json(json!({ "started": started, "state": state.monitor.state() }))
}

pub async fn api_monitor_stop(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stopping = state.monitor.stop();
    Json(json!({ "stopping": stopping, "state": state.monitor.state() }))
}

pub async fn api_monitor_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.monitor.status())
}
