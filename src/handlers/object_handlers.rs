//! Object-level endpoints: listing with uploader metadata, bulk upload
//! with overwrite negotiation, single-object download/delete, and move.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::{context::RequestContext, response::ApiResponse},
    services::{backend::map_status, orchestrator::UploadFile},
    state::AppState,
};
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Overwrite existing objects instead of reporting a conflict.
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub src_container: String,
    pub src_object: String,
    pub dest_container: String,
    /// Defaults to the source object name.
    pub dest_object: Option<String>,
}

/// `GET /objects/{container}` — descriptors with uploader metadata.
pub async fn list_objects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(container): Path<String>,
) -> GatewayResult<impl IntoResponse> {
    let objects = state
        .orchestrator
        .list_objects_with_metadata(&ctx, &container)
        .await?;
    Ok(Json(ApiResponse::ok(objects)))
}

/// `POST /objects/{container}/upload?replace=bool` — multipart batch
/// upload; the response is a per-file outcome list and the batch never
/// fails because one file conflicted.
pub async fn upload_objects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(container): Path<String>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> GatewayResult<impl IntoResponse> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::Invalid(format!("malformed multipart body: {err}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            // Non-file form fields are ignored.
            continue;
        };
        let content_type = field.content_type().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|err| GatewayError::Invalid(format!("reading `{file_name}`: {err}")))?;
        files.push(UploadFile {
            name: file_name,
            content_type,
            data,
        });
    }

    if files.is_empty() {
        return Err(GatewayError::Invalid("no files in upload".into()));
    }

    let outcomes = state
        .orchestrator
        .bulk_upload(&ctx, &container, files, query.replace)
        .await?;
    Ok(Json(ApiResponse::ok(outcomes)))
}

/// `GET /objects/{container}/{*object}` — stream one object body through.
pub async fn download_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((container, object)): Path<(String, String)>,
) -> GatewayResult<Response> {
    let backend_response = state.backend.get_object(&ctx, &container, &object).await?;
    if !backend_response.status().is_success() {
        return Err(map_status(
            backend_response.status(),
            &format!("object `{object}` in `{container}`"),
        ));
    }

    let content_type = backend_response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let content_length = backend_response.headers().get(header::CONTENT_LENGTH).cloned();

    let mut response = Response::new(Body::from_stream(backend_response.bytes_stream()));
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = content_length {
        response.headers_mut().insert(header::CONTENT_LENGTH, length);
    }
    Ok(response)
}

/// `DELETE /objects/{container}/{*object}` — 200 or 404.
pub async fn delete_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path((container, object)): Path<(String, String)>,
) -> GatewayResult<impl IntoResponse> {
    state.orchestrator.delete_object(&ctx, &container, &object).await?;
    Ok(Json(ApiResponse::ok_with_message(
        serde_json::json!({ "container": container, "object": object }),
        "object deleted",
    )))
}

/// `POST /objects/move` — copy-then-delete; echoes `from`/`to`.
pub async fn move_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<MoveRequest>,
) -> GatewayResult<impl IntoResponse> {
    let result = state
        .orchestrator
        .move_object(
            &ctx,
            &request.src_container,
            &request.src_object,
            &request.dest_container,
            request.dest_object.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}
