//! Per-request authentication context resolved from the identity service.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Immutable identity context for one inbound request.
///
/// Built once by the token resolver after a successful introspection call
/// and threaded through every handler and service on the request's path.
/// A context is only ever constructed for tokens that resolved to a scoped
/// project, so `project_id` is always non-empty.
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// The bearer token the caller presented, forwarded to the backend
    /// as its credential on every outbound call.
    pub subject_token: String,

    /// Identity-service user id.
    pub user_id: String,

    /// Human-readable username.
    pub username: String,

    /// Domain the user belongs to.
    pub user_domain: String,

    /// Project (tenant) the token is scoped to.
    pub project_id: String,

    /// Display name of the scoped project.
    pub project_name: String,

    /// Role names granted on the scoped project, lower-cased.
    pub roles: HashSet<String>,

    /// When the identity service will stop honouring the token.
    pub token_expiry: DateTime<Utc>,
}

impl RequestContext {
    /// True if the context carries the named role (expects lower case).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}
