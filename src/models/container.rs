//! Represents a container — a named collection of objects within a tenant
//! account.

use serde::Serialize;

/// Per-container listing entry with the backend's reported statistics.
///
/// Name uniqueness within a project is enforced by the backend; the
/// gateway never assumes it can create a duplicate.
#[derive(Clone, Debug, Serialize)]
pub struct ContainerDescriptor {
    /// Container name, unique within the project.
    pub name: String,

    /// Number of objects the backend reports for this container.
    pub object_count: u64,

    /// Bytes stored in this container.
    pub bytes_used: u64,

    /// Last modification time as reported by the backend, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}
