//! Container-level endpoints: listing, creation, cascading delete, and
//! archive download.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::{container::ContainerDescriptor, context::RequestContext, response::ApiResponse},
    state::AppState,
};
use axum::{
    Extension, Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct CreateContainerRequest {
    pub container: String,
}

/// `GET /containers` — all containers with their reported stats.
pub async fn list_containers(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> GatewayResult<impl IntoResponse> {
    let entries = state.backend.list_containers(&ctx).await?;
    let containers: Vec<ContainerDescriptor> = entries
        .into_iter()
        .map(|entry| ContainerDescriptor {
            name: entry.name,
            object_count: entry.count,
            bytes_used: entry.bytes,
            last_modified: entry.last_modified,
        })
        .collect();
    Ok(Json(ApiResponse::ok(containers)))
}

/// `POST /containers/create` — 201, or 409 when the name is taken.
pub async fn create_container(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateContainerRequest>,
) -> GatewayResult<impl IntoResponse> {
    let name = request.container.trim();
    if name.is_empty() {
        return Err(GatewayError::Invalid("container name is required".into()));
    }

    state.orchestrator.create_container(&ctx, name).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            json!({ "container": name }),
            format!("container `{name}` created"),
        )),
    ))
}

/// `DELETE /containers/{name}` — cascading delete; reports how many
/// objects went with the container.
pub async fn delete_container(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> GatewayResult<impl IntoResponse> {
    let deleted = state.orchestrator.delete_container(&ctx, &name).await?;
    Ok(Json(ApiResponse::ok_with_message(
        json!({ "container": name, "deleted_objects": deleted }),
        format!("container `{name}` deleted"),
    )))
}

/// `GET /containers/{name}/download` — zip archive of every object.
pub async fn download_container(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(name): Path<String>,
) -> GatewayResult<Response> {
    let archive = state.orchestrator.download_archive(&ctx, &name).await?;

    let disposition = format!("attachment; filename=\"{name}.zip\"");
    let mut response = Response::new(Body::from(archive));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    Ok(response)
}
