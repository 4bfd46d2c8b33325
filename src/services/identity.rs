//! Identity service client: password login, token introspection, and
//! project lifecycle.
//!
//! The resolver half of this module turns a bearer token into a
//! [`RequestContext`] by calling the identity service's token-introspection
//! endpoint, presenting the token both as the caller's credential and as
//! the subject under inspection. It never guesses validity: any transport
//! error or non-2xx answer is `Unauthenticated`.

use crate::{
    config::AppConfig,
    errors::{GatewayError, GatewayResult},
    models::context::RequestContext,
    services::backend::map_status,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Header carrying the issued token on login responses.
pub const SUBJECT_TOKEN_HEADER: &str = "x-subject-token";
/// Header carrying the caller's credential on identity calls.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    user: TokenUser,
    #[serde(default)]
    project: Option<TokenProject>,
    #[serde(default)]
    roles: Vec<TokenRole>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    name: String,
    #[serde(default)]
    domain: Option<TokenDomain>,
}

#[derive(Debug, Deserialize)]
struct TokenDomain {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TokenProject {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TokenRole {
    name: String,
}

/// A project as reported by the identity service.
#[derive(Clone, Debug, Deserialize, serde::Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ProjectList {
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct ProjectEnvelope {
    project: Project,
}

/// Outcome of a successful password login.
#[derive(Debug)]
pub struct LoginOutcome {
    /// The freshly-issued bearer token.
    pub token: String,
    /// Context resolved from the issued token's body.
    pub context: RequestContext,
    /// Projects the user may scope a token to.
    pub available_projects: Vec<Project>,
}

/// Client for the identity service.
#[derive(Clone)]
pub struct IdentityService {
    http: Client,
    identity_url: Url,
    user_domain: String,
}

impl IdentityService {
    pub fn new(http: Client, config: &AppConfig) -> GatewayResult<Self> {
        let identity_url = Url::parse(&config.identity_url)
            .map_err(|err| GatewayError::Internal(format!("invalid identity URL: {err}")))?;
        Ok(Self {
            http,
            identity_url,
            user_domain: config.user_domain.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.identity_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Internal("identity URL cannot be a base".into()))?
            .extend(segments);
        Ok(url)
    }

    /// Validate a bearer token and produce the per-request context.
    ///
    /// Fails with `Unauthenticated` when the identity service rejects the
    /// token or cannot be reached, and `Unscoped` when the token is valid
    /// but carries no project.
    pub async fn resolve_context(&self, token: &str) -> GatewayResult<RequestContext> {
        let url = self.endpoint(&["v3", "auth", "tokens"])?;
        let response = self
            .http
            .request(Method::GET, url)
            .header(AUTH_TOKEN_HEADER, token)
            .header(SUBJECT_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|err| GatewayError::Unauthenticated(err.to_string()))?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "token introspection rejected");
            return Err(GatewayError::Unauthenticated(format!(
                "introspection answered {}",
                response.status()
            )));
        }

        let envelope: TokenEnvelope = response
            .json()
            .await
            .map_err(|err| GatewayError::Unauthenticated(format!("malformed token body: {err}")))?;

        Self::context_from_token(token, envelope.token)
    }

    fn context_from_token(token: &str, body: TokenBody) -> GatewayResult<RequestContext> {
        let project = body.project.ok_or(GatewayError::Unscoped)?;
        if project.id.is_empty() {
            return Err(GatewayError::Unscoped);
        }

        let roles: HashSet<String> = body
            .roles
            .into_iter()
            .map(|role| role.name.to_lowercase())
            .collect();

        Ok(RequestContext {
            subject_token: token.to_string(),
            user_id: body.user.id,
            username: body.user.name,
            user_domain: body
                .user
                .domain
                .map(|domain| domain.name)
                .unwrap_or_default(),
            project_id: project.id,
            project_name: project.name,
            roles,
            token_expiry: body.expires_at,
        })
    }

    /// Password login scoped to a project. Returns the issued token, the
    /// context derived from its body, and the projects the user can see.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        project: &str,
        domain: Option<&str>,
    ) -> GatewayResult<LoginOutcome> {
        let domain = domain.unwrap_or(&self.user_domain);
        let payload = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": username,
                            "domain": { "name": domain },
                            "password": password,
                        }
                    }
                },
                "scope": {
                    "project": {
                        "name": project,
                        "domain": { "name": domain },
                    }
                }
            }
        });

        let url = self.endpoint(&["v3", "auth", "tokens"])?;
        let response = self.http.post(url).json(&payload).send().await?;

        match response.status() {
            status if status.is_success() => {
                let token = response
                    .headers()
                    .get(SUBJECT_TOKEN_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_owned)
                    .ok_or_else(|| {
                        GatewayError::Internal("login response carried no subject token".into())
                    })?;
                let envelope: TokenEnvelope = response.json().await.map_err(|err| {
                    GatewayError::Internal(format!("malformed login body: {err}"))
                })?;
                let context = Self::context_from_token(&token, envelope.token)?;
                let available_projects = self.available_projects(&token).await.unwrap_or_default();
                Ok(LoginOutcome {
                    token,
                    context,
                    available_projects,
                })
            }
            StatusCode::UNAUTHORIZED => {
                Err(GatewayError::Unauthenticated("bad credentials".into()))
            }
            status => Err(map_status(status, "identity service")),
        }
    }

    /// Projects the holder of `token` may scope to. Best-effort; callers
    /// treat failure as an empty list.
    async fn available_projects(&self, token: &str) -> GatewayResult<Vec<Project>> {
        let url = self.endpoint(&["v3", "auth", "projects"])?;
        let response = self
            .http
            .get(url)
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let list: ProjectList = response
                    .json()
                    .await
                    .map_err(|err| GatewayError::Internal(err.to_string()))?;
                Ok(list.projects)
            }
            status => Err(map_status(status, "project listing")),
        }
    }

    /// All projects visible to the caller (privileged).
    pub async fn list_projects(&self, ctx: &RequestContext) -> GatewayResult<Vec<Project>> {
        let url = self.endpoint(&["v3", "projects"])?;
        let response = self
            .http
            .get(url)
            .header(AUTH_TOKEN_HEADER, &ctx.subject_token)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let list: ProjectList = response
                    .json()
                    .await
                    .map_err(|err| GatewayError::Internal(err.to_string()))?;
                Ok(list.projects)
            }
            status => Err(map_status(status, "project listing")),
        }
    }

    /// Create a project (privileged).
    pub async fn create_project(
        &self,
        ctx: &RequestContext,
        name: &str,
        description: Option<&str>,
    ) -> GatewayResult<Project> {
        let url = self.endpoint(&["v3", "projects"])?;
        let payload = json!({
            "project": {
                "name": name,
                "description": description,
                "enabled": true,
            }
        });
        let response = self
            .http
            .post(url)
            .header(AUTH_TOKEN_HEADER, &ctx.subject_token)
            .json(&payload)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => {
                let envelope: ProjectEnvelope = response
                    .json()
                    .await
                    .map_err(|err| GatewayError::Internal(err.to_string()))?;
                Ok(envelope.project)
            }
            StatusCode::CONFLICT => {
                Err(GatewayError::AlreadyExists(format!("project `{name}`")))
            }
            status => Err(map_status(status, &format!("project `{name}`"))),
        }
    }

    /// Delete a project by id (privileged).
    pub async fn delete_project(&self, ctx: &RequestContext, id: &str) -> GatewayResult<()> {
        let url = self.endpoint(&["v3", "projects", id])?;
        let response = self
            .http
            .delete(url)
            .header(AUTH_TOKEN_HEADER, &ctx.subject_token)
            .send()
            .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(map_status(status, &format!("project `{id}`"))),
        }
    }
}
