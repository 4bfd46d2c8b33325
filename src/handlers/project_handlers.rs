//! Tenant lifecycle endpoints. All of these require the `admin` role.

use crate::{
    auth::authorize,
    errors::{GatewayError, GatewayResult},
    models::{context::RequestContext, response::ApiResponse},
    services::backend::ACCOUNT_QUOTA_BYTES,
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

const ADMIN_ROLES: &[&str] = &["admin"];

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuotaRequest {
    /// Byte ceiling for the project's account; `null` removes the quota.
    pub quota_bytes: Option<u64>,
}

/// `GET /projects`
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> GatewayResult<impl IntoResponse> {
    authorize(ADMIN_ROLES, &ctx)?;
    let projects = state.identity.list_projects(&ctx).await?;
    Ok(Json(ApiResponse::ok(projects)))
}

/// `POST /projects/create`
pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateProjectRequest>,
) -> GatewayResult<impl IntoResponse> {
    authorize(ADMIN_ROLES, &ctx)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(GatewayError::Invalid("project name is required".into()));
    }
    let project = state
        .identity
        .create_project(&ctx, name, request.description.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            project,
            format!("project `{name}` created"),
        )),
    ))
}

/// `DELETE /projects/{id}`
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> GatewayResult<impl IntoResponse> {
    authorize(ADMIN_ROLES, &ctx)?;
    state.identity.delete_project(&ctx, &id).await?;
    Ok(Json(ApiResponse::ok_with_message(
        json!({ "project": id }),
        "project deleted",
    )))
}

/// `POST /projects/{id}/quota` — set or clear the account byte quota.
pub async fn set_quota(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(request): Json<QuotaRequest>,
) -> GatewayResult<impl IntoResponse> {
    authorize(ADMIN_ROLES, &ctx)?;
    // An empty header value removes the metadata entry on the backend.
    let value = request
        .quota_bytes
        .map(|bytes| bytes.to_string())
        .unwrap_or_default();
    let response = state
        .backend
        .post_account_metadata(&ctx, &id, ACCOUNT_QUOTA_BYTES, &value)
        .await?;
    if !response.status().is_success() {
        return Err(crate::services::backend::map_status(
            response.status(),
            &format!("account for project `{id}`"),
        ));
    }
    Ok(Json(ApiResponse::ok_with_message(
        json!({ "project": id, "quota_bytes": request.quota_bytes }),
        "quota updated",
    )))
}
