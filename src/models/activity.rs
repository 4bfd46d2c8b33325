//! Activity records emitted after successful mutating operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Kind of mutation an activity record describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Action {
    Create,
    Delete,
    Upload,
    Move,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Upload => "upload",
            Action::Move => "move",
        };
        f.write_str(name)
    }
}

/// One append-only activity record.
///
/// Produced by the orchestrator after a mutation succeeds and handed to
/// the audit sink. Ordering across records is insertion order only.
#[derive(Clone, Debug, Serialize)]
pub struct ActivityRecord {
    /// User who performed the action.
    pub username: String,

    /// What was done.
    pub action: Action,

    /// Free-text description of the affected resources.
    pub details: String,

    /// Project the action was scoped to.
    pub project_id: String,

    /// When the record was produced.
    pub timestamp: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn new(
        username: impl Into<String>,
        action: Action,
        details: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            action,
            details: details.into(),
            project_id: project_id.into(),
            timestamp: Utc::now(),
        }
    }
}
