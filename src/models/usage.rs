//! Account-level usage figures, derived fresh from backend state.

use serde::{Serialize, Serializer};

/// Storage quota for an account: a finite byte ceiling or unlimited.
///
/// Serializes as the number of bytes, or the string `"unlimited"` when no
/// quota is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quota {
    Limited(u64),
    Unlimited,
}

impl Serialize for Quota {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quota::Limited(bytes) => serializer.serialize_u64(*bytes),
            Quota::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

/// Usage snapshot for one project's backend account.
///
/// Computed on demand by the usage aggregator and never persisted by the
/// gateway. `usage_percent` is only present when the quota is finite.
#[derive(Clone, Debug, Serialize)]
pub struct AccountUsage {
    /// Project the account belongs to.
    pub project_id: String,

    /// Byte quota, or unlimited when the backend reports none.
    pub quota_bytes: Quota,

    /// Total bytes stored across all containers.
    pub bytes_used: u64,

    /// Number of containers in the account.
    pub container_count: u64,

    /// Number of objects across all containers.
    pub object_count: u64,

    /// `bytes_used / quota_bytes`, as a percentage. Omitted for unlimited
    /// quotas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percent: Option<f64>,

    /// Containers whose metadata probe failed during a reconciliation
    /// pass. The aggregate above covers only the containers that
    /// succeeded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreachable_containers: Vec<String>,
}

impl AccountUsage {
    /// Derive the percent-used figure from a quota and a byte count.
    ///
    /// Returns `None` for unlimited or zero quotas.
    pub fn percent_of(quota: Quota, bytes_used: u64) -> Option<f64> {
        match quota {
            Quota::Limited(quota_bytes) if quota_bytes > 0 => {
                Some((bytes_used as f64 / quota_bytes as f64) * 100.0)
            }
            _ => None,
        }
    }
}
