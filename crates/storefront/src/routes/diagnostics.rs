//! Connectivity check, unknown API paths and SPA hosting.

use std::path::Path;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EnvCheck {
    pub stripe_enabled: bool,
    pub smtp_host: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub env_check: EnvCheck,
}

/// Lets the SPA check that it can reach the API.
///
/// GET /api/test
pub async fn api_test(State(state): State<AppState>) -> Json<TestResponse> {
    let settings = state.settings().snapshot().await;

    Json(TestResponse {
        status: "success",
        message: "Backend is connected and running!",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        env_check: EnvCheck {
            stripe_enabled: settings.stripe_secret_key().is_some(),
            smtp_host: state
                .config()
                .smtp
                .host
                .clone()
                .unwrap_or_else(|| "using_db_config".to_owned()),
        },
    })
}

/// Fallback for `/api/*` paths no route matched.
pub async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "API route not found" })),
    )
}

async fn frontend_missing() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Frontend build not found")
}

/// Serve the built SPA. Unknown paths get `index.html` so client-side
/// routing works on reload.
pub fn spa_router(static_dir: &Path) -> Router<AppState> {
    let index = static_dir.join("index.html");
    if !index.is_file() {
        tracing::warn!(dir = %static_dir.display(), "No frontend build found, static hosting disabled");
        return Router::new().fallback(frontend_missing);
    }

    Router::new().fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
}
