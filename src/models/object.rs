//! Represents an object (blob) stored in a container.

use serde::Serialize;

/// Per-object listing entry with uploader metadata.
///
/// `uploaded_by` and `uploaded_at` are carried as opaque metadata attached
/// by the gateway at upload time. When an object was written by some other
/// client and carries no such metadata, `uploaded_at` falls back to the
/// backend's own last-modified timestamp and `uploaded_by` is absent.
#[derive(Clone, Debug, Serialize)]
pub struct ObjectDescriptor {
    /// Object name, unique within its container. May contain `/`.
    pub name: String,

    /// Size in bytes.
    pub size_bytes: u64,

    /// When the object was uploaded through the gateway, or the backend's
    /// last-modified time when no gateway metadata exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,

    /// Username recorded at upload time, if the object came through the
    /// gateway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,

    /// Content type reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}
