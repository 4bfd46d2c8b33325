//! Health, usage, and overview endpoints.

use crate::{
    errors::GatewayResult,
    models::{context::RequestContext, response::ApiResponse},
    state::AppState,
};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

/// `GET /health`
///
/// Liveness only — always 200, no I/O, no authentication.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// `GET /account/usage` — current usage snapshot for the caller's
/// project, reconciled when the backend counters look stale.
pub async fn usage(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> GatewayResult<impl IntoResponse> {
    let usage = state.usage.compute_usage(&ctx).await?;
    Ok(Json(ApiResponse::ok(usage)))
}

#[derive(Debug, Serialize)]
struct Overview {
    backend_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<crate::models::usage::AccountUsage>,
}

/// `GET /overview` — backend reachability plus the usage snapshot.
///
/// Never fails outright on an unreachable backend; reachability is the
/// answer, not an error.
pub async fn overview(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> GatewayResult<impl IntoResponse> {
    let overview = match state.usage.compute_usage(&ctx).await {
        Ok(usage) => Overview {
            backend_reachable: true,
            usage: Some(usage),
        },
        Err(err) => {
            tracing::warn!(error = %err, "overview probe failed");
            Overview {
                backend_reachable: false,
                usage: None,
            }
        }
    };
    Ok(Json(ApiResponse::ok(overview)))
}
