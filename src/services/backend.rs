//! Thin transport wrapper for the storage backend.
//!
//! Issues authenticated HTTP calls (GET/HEAD/PUT/DELETE/COPY) against the
//! Swift-style backend and surfaces status codes and headers unmodified.
//! Interpretation of statuses belongs to the callers; the only mapping done
//! here is transport failures (timeouts, refused connections) into the
//! gateway taxonomy.

use crate::{
    config::AppConfig,
    errors::{GatewayError, GatewayResult},
    models::context::RequestContext,
};
use bytes::Bytes;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use url::Url;

/// Header carrying the caller's token on every backend call.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Account metadata headers reported by the backend.
pub const ACCOUNT_BYTES_USED: &str = "x-account-bytes-used";
pub const ACCOUNT_CONTAINER_COUNT: &str = "x-account-container-count";
pub const ACCOUNT_OBJECT_COUNT: &str = "x-account-object-count";
pub const ACCOUNT_QUOTA_BYTES: &str = "x-account-meta-quota-bytes";

/// Container metadata headers.
pub const CONTAINER_OBJECT_COUNT: &str = "x-container-object-count";
pub const CONTAINER_BYTES_USED: &str = "x-container-bytes-used";

/// Object metadata attached by the gateway at upload time.
pub const OBJECT_UPLOADED_BY: &str = "x-object-meta-uploaded-by";
pub const OBJECT_UPLOADED_AT: &str = "x-object-meta-uploaded-at";

/// Raw container entry from an account listing (`?format=json`).
#[derive(Clone, Debug, Deserialize)]
pub struct ContainerEntry {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub bytes: u64,
    pub last_modified: Option<String>,
}

/// Raw object entry from a container listing (`?format=json`).
#[derive(Clone, Debug, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub bytes: u64,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

/// Authenticated HTTP transport to the storage backend.
///
/// Cheap to clone; the underlying `reqwest::Client` is an Arc over its
/// connection pool. Every call carries the per-request token and the
/// configured deadline.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    storage_url: Url,
}

impl BackendClient {
    pub fn new(http: Client, config: &AppConfig) -> GatewayResult<Self> {
        let storage_url = Url::parse(&config.storage_url)
            .map_err(|err| GatewayError::Internal(format!("invalid storage URL: {err}")))?;
        Ok(Self { http, storage_url })
    }

    /// Root resource for a tenant account: `/v1/AUTH_{project_id}`.
    fn account_url(&self, project_id: &str) -> GatewayResult<Url> {
        let mut url = self.storage_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Internal("storage URL cannot be a base".into()))?
            .push("v1")
            .push(&format!("AUTH_{project_id}"));
        Ok(url)
    }

    fn container_url(&self, project_id: &str, container: &str) -> GatewayResult<Url> {
        let mut url = self.account_url(project_id)?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Internal("storage URL cannot be a base".into()))?
            .push(container);
        Ok(url)
    }

    /// Object names may contain `/`; each path component is pushed as its
    /// own segment so separators survive while other characters are
    /// percent-encoded.
    fn object_url(&self, project_id: &str, container: &str, object: &str) -> GatewayResult<Url> {
        let mut url = self.container_url(project_id, container)?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::Internal("storage URL cannot be a base".into()))?
            .extend(object.split('/'));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, ctx: &RequestContext) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &ctx.subject_token)
    }

    /// Lightweight metadata probe of the tenant account.
    pub async fn head_account(&self, ctx: &RequestContext) -> GatewayResult<Response> {
        let url = self.account_url(&ctx.project_id)?;
        Ok(self.request(Method::HEAD, url, ctx).send().await?)
    }

    /// List all containers in the tenant account.
    pub async fn list_containers(&self, ctx: &RequestContext) -> GatewayResult<Vec<ContainerEntry>> {
        let mut url = self.account_url(&ctx.project_id)?;
        url.query_pairs_mut().append_pair("format", "json");
        let response = self.request(Method::GET, url, ctx).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status => Err(map_status(status, "account")),
        }
    }

    /// Metadata probe of one container.
    pub async fn head_container(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Response> {
        let url = self.container_url(&ctx.project_id, container)?;
        Ok(self.request(Method::HEAD, url, ctx).send().await?)
    }

    pub async fn put_container(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Response> {
        let url = self.container_url(&ctx.project_id, container)?;
        Ok(self.request(Method::PUT, url, ctx).send().await?)
    }

    pub async fn delete_container(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Response> {
        let url = self.container_url(&ctx.project_id, container)?;
        Ok(self.request(Method::DELETE, url, ctx).send().await?)
    }

    /// List all objects in a container.
    pub async fn list_objects(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Vec<ObjectEntry>> {
        let mut url = self.container_url(&ctx.project_id, container)?;
        url.query_pairs_mut().append_pair("format", "json");
        let response = self.request(Method::GET, url, ctx).send().await?;
        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status => Err(map_status(status, &format!("container `{container}`"))),
        }
    }

    pub async fn get_object(
        &self,
        ctx: &RequestContext,
        container: &str,
        object: &str,
    ) -> GatewayResult<Response> {
        let url = self.object_url(&ctx.project_id, container, object)?;
        Ok(self.request(Method::GET, url, ctx).send().await?)
    }

    pub async fn head_object(
        &self,
        ctx: &RequestContext,
        container: &str,
        object: &str,
    ) -> GatewayResult<Response> {
        let url = self.object_url(&ctx.project_id, container, object)?;
        Ok(self.request(Method::HEAD, url, ctx).send().await?)
    }

    /// Upload an object body, attaching uploader identity and timestamp as
    /// object metadata.
    pub async fn put_object(
        &self,
        ctx: &RequestContext,
        container: &str,
        object: &str,
        content_type: Option<&str>,
        body: Bytes,
    ) -> GatewayResult<Response> {
        let url = self.object_url(&ctx.project_id, container, object)?;
        let mut request = self
            .request(Method::PUT, url, ctx)
            .header(OBJECT_UPLOADED_BY, &ctx.username)
            .header(OBJECT_UPLOADED_AT, chrono::Utc::now().to_rfc3339())
            .body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        Ok(request.send().await?)
    }

    pub async fn delete_object(
        &self,
        ctx: &RequestContext,
        container: &str,
        object: &str,
    ) -> GatewayResult<Response> {
        let url = self.object_url(&ctx.project_id, container, object)?;
        Ok(self.request(Method::DELETE, url, ctx).send().await?)
    }

    /// Server-side copy. The destination is expressed as a header, per the
    /// backend's COPY verb.
    pub async fn copy_object(
        &self,
        ctx: &RequestContext,
        src_container: &str,
        src_object: &str,
        dest_container: &str,
        dest_object: &str,
    ) -> GatewayResult<Response> {
        let url = self.object_url(&ctx.project_id, src_container, src_object)?;
        let copy = Method::from_bytes(b"COPY")
            .map_err(|err| GatewayError::Internal(format!("COPY method: {err}")))?;
        Ok(self
            .request(copy, url, ctx)
            .header("destination", format!("/{dest_container}/{dest_object}"))
            .send()
            .await?)
    }

    /// Set account metadata (used for quota updates).
    pub async fn post_account_metadata(
        &self,
        ctx: &RequestContext,
        project_id: &str,
        header: &str,
        value: &str,
    ) -> GatewayResult<Response> {
        let url = self.account_url(project_id)?;
        Ok(self
            .request(Method::POST, url, ctx)
            .header(header, value)
            .send()
            .await?)
    }
}

/// Map a non-success backend status into the gateway taxonomy.
///
/// 409 is deliberately absent: create/delete conflicts mean different
/// things per operation and are mapped by the orchestrator.
pub fn map_status(status: StatusCode, resource: &str) -> GatewayError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::PermissionDenied(format!("backend refused access to {resource}"))
        }
        StatusCode::NOT_FOUND => GatewayError::NotFound(resource.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::BackendTimeout,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
            GatewayError::BackendUnavailable(format!("backend answered {status} for {resource}"))
        }
        status => GatewayError::Internal(format!("unexpected backend status {status} for {resource}")),
    }
}

/// Parse a numeric metadata header, treating absence or garbage as zero.
/// The backend's counters are eventually consistent and occasionally
/// missing on fresh accounts.
pub fn header_u64(response: &Response, name: &str) -> u64 {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Read a metadata header as a string, if present and valid UTF-8.
pub fn header_str(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
