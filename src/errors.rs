//! Gateway error taxonomy and its HTTP rendering.
//!
//! Every failure a handler can surface is one of these variants. Backend
//! status codes are mapped into the taxonomy at the service layer rather
//! than collapsed to a generic 500, so callers can distinguish a conflict
//! from an outage.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing, invalid, or expired bearer token.
    #[error("authentication required")]
    Unauthenticated(String),

    /// Token is valid but carries no project scope.
    #[error("token is not scoped to a project")]
    Unscoped,

    /// Role check failed, or the backend answered 403.
    #[error("permission denied")]
    PermissionDenied(String),

    /// Container, object, or project absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Creation conflict.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The backend still considers the container non-empty after a
    /// cascading delete; the caller may retry.
    #[error("container `{0}` is not empty")]
    ContainerNotEmpty(String),

    /// Copy succeeded but the source delete failed, leaving a duplicate.
    /// The caller should retry the delete, not the copy.
    #[error("move of `{from}` to `{to}` left the source behind")]
    PartialMove {
        from: String,
        to: String,
        detail: String,
    },

    /// Outbound call exceeded its deadline.
    #[error("storage backend timed out")]
    BackendTimeout,

    /// Transport-level failure talking to the backend or identity service.
    #[error("storage backend unavailable")]
    BackendUnavailable(String),

    /// Malformed request body or parameters.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Anything that should never happen.
    #[error("internal error")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthenticated(_) | GatewayError::Unscoped => StatusCode::UNAUTHORIZED,
            GatewayError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::AlreadyExists(_) | GatewayError::ContainerNotEmpty(_) => {
                StatusCode::CONFLICT
            }
            GatewayError::PartialMove { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Invalid(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Underlying backend detail, when the variant carries one.
    ///
    /// Only appended to responses in debug builds; release builds return
    /// the stable message alone.
    fn detail(&self) -> Option<&str> {
        match self {
            GatewayError::Unauthenticated(detail)
            | GatewayError::PermissionDenied(detail)
            | GatewayError::BackendUnavailable(detail)
            | GatewayError::Internal(detail)
            | GatewayError::PartialMove { detail, .. } => {
                (!detail.is_empty()).then_some(detail.as_str())
            }
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        #[allow(unused_mut)]
        let mut message = self.to_string();
        #[cfg(debug_assertions)]
        if let Some(detail) = self.detail() {
            message = format!("{message}: {detail}");
        }

        let body = Json(json!({
            "success": false,
            "message": message,
        }));
        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::BackendTimeout
        } else {
            GatewayError::BackendUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(
            GatewayError::Unauthenticated(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GatewayError::Unscoped.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GatewayError::ContainerNotEmpty("logs".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::BackendTimeout.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
