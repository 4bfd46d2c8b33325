//! Login endpoint.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::response::ApiResponse,
    services::identity::Project,
    state::AppState,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub project: String,
    /// Defaults to the configured user domain when absent.
    pub domain: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: LoginUser,
    pub project: LoginProject,
    pub roles: Vec<String>,
    pub available_projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct LoginProject {
    pub id: String,
    pub name: String,
}

/// `POST /auth/login` — password login, 201 with the issued token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> GatewayResult<impl IntoResponse> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(GatewayError::Invalid("username and password are required".into()));
    }

    let outcome = state
        .identity
        .login(
            &request.username,
            &request.password,
            &request.project,
            request.domain.as_deref(),
        )
        .await?;

    let mut roles: Vec<String> = outcome.context.roles.iter().cloned().collect();
    roles.sort();

    let data = LoginData {
        token: outcome.token,
        user: LoginUser {
            id: outcome.context.user_id,
            username: outcome.context.username,
            domain: outcome.context.user_domain,
        },
        project: LoginProject {
            id: outcome.context.project_id,
            name: outcome.context.project_name,
        },
        roles,
        available_projects: outcome.available_projects,
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data))))
}
