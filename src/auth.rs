//! Request authentication and role authorization.
//!
//! The middleware gates every protected route: it pulls the bearer token
//! off the request, resolves it through the identity service, and stores
//! the resulting [`RequestContext`] in the request extensions. A request
//! that fails here never reaches a handler, so no backend call beyond the
//! introspection itself is ever issued for a bad token.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::context::RequestContext,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Header accepted as an alternative to `Authorization: Bearer`.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Resolve the caller's token into a request context, or short-circuit
/// with 401.
pub async fn require_context(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = bearer_token(&request)
        .ok_or_else(|| GatewayError::Unauthenticated("no bearer token presented".into()))?;

    let context = state.identity.resolve_context(&token).await?;
    debug!(user = %context.username, project = %context.project_id, "request authenticated");
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    let headers = request.headers();
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }
    headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
}

/// Pure role gate: passes when no roles are required, or when the
/// context's role set intersects the required set. Role names are
/// compared lower-cased; contexts are normalized at construction.
pub fn authorize(required_roles: &[&str], context: &RequestContext) -> GatewayResult<()> {
    if required_roles.is_empty() {
        return Ok(());
    }
    if required_roles
        .iter()
        .any(|role| context.roles.contains(*role))
    {
        Ok(())
    } else {
        Err(GatewayError::PermissionDenied(format!(
            "requires one of: {}",
            required_roles.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    fn context_with_roles(roles: &[&str]) -> RequestContext {
        RequestContext {
            subject_token: "tok".into(),
            user_id: "u-1".into(),
            username: "alice".into(),
            user_domain: "Default".into(),
            project_id: "p-1".into(),
            project_name: "demo".into(),
            roles: roles.iter().map(|role| role.to_string()).collect::<HashSet<_>>(),
            token_expiry: Utc::now() + chrono::Duration::hours(1),
        }
    }

    #[test]
    fn empty_requirement_is_authentication_only() {
        let ctx = context_with_roles(&[]);
        assert!(authorize(&[], &ctx).is_ok());
    }

    #[test]
    fn disjoint_role_sets_deny() {
        let ctx = context_with_roles(&["member"]);
        let err = authorize(&["admin"], &ctx).unwrap_err();
        assert!(matches!(err, GatewayError::PermissionDenied(_)));
    }

    #[test]
    fn any_intersection_allows() {
        let ctx = context_with_roles(&["member", "reader"]);
        assert!(authorize(&["admin", "member"], &ctx).is_ok());
    }
}
