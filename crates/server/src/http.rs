//! HTTP surface (§6): session lifecycle REST endpoints, health/readiness,
//! and the `/ws/voice/{session_id}` upgrade route.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use voice_agent_agent::orchestrator::SessionInput;
use voice_agent_core::SessionId;

use crate::state::AppState;
use crate::store::new_session_record;
use crate::websocket::voice_ws_handler;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/session/create", post(create_session))
        .route("/session/:id", get(get_session))
        .route("/session/:id/close", post(close_session))
        .route("/ws/voice/:session_id", get(voice_ws_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .with_state(state)
}

/// No CORS origin allowlist is part of this system's configuration surface
/// (§6 names no browser-facing dashboard); permissive CORS is acceptable for
/// a voice transport consumed by first-party clients only.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}

#[derive(Debug, Serialize)]
struct CreateSessionResponse {
    session_id: String,
}

async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let id = SessionId::new();
    let record = new_session_record();
    let ttl = Duration::from_secs(state.settings.session.store_ttl_secs());
    state
        .store
        .put_session(id, &record, ttl)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to persist new session");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(CreateSessionResponse {
        session_id: id.to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    state: String,
    turn_count: u32,
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let id: SessionId = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
    let record = state
        .store
        .get_session(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to read session");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;
    let turn_count = state
        .store
        .get_conversation(id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to read conversation");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map(|c| c.turn_count)
        .unwrap_or(0);

    Ok(Json(SessionView {
        session_id: id.to_string(),
        state: format!("{:?}", record.state),
        turn_count,
    }))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let id: SessionId = id.parse().map_err(|_| StatusCode::BAD_REQUEST)?;

    if let Some(inbox) = state.registry.get(id) {
        let _ = inbox.send(SessionInput::Close).await;
    }
    state.store.delete_session(id).await.map_err(|e| {
        tracing::error!(error = %e, "failed to delete session");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(StatusCode::NO_CONTENT)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.store.active_sessions().await.unwrap_or_default();
    Json(serde_json::json!({
        "status": "ready",
        "active_sessions": active.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_config::Settings;

    #[tokio::test]
    async fn router_builds_with_default_settings() {
        let state = AppState::build(Settings::default()).await.unwrap();
        let _ = create_router(state);
    }
}
