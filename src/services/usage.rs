//! Account usage aggregation.
//!
//! The fast path reads the backend's account-level counters from one
//! metadata probe. Those counters converge asynchronously after object
//! mutations, so a reported zero is ambiguous: the account may be empty,
//! or the counter may simply not have caught up. In that case a
//! reconciliation pass recomputes the figures from live per-container
//! probes, tolerating individual probe failures.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::{
        context::RequestContext,
        usage::{AccountUsage, Quota},
    },
    services::backend::{
        ACCOUNT_BYTES_USED, ACCOUNT_CONTAINER_COUNT, ACCOUNT_OBJECT_COUNT, ACCOUNT_QUOTA_BYTES,
        BackendClient, CONTAINER_BYTES_USED, CONTAINER_OBJECT_COUNT, header_str, header_u64,
        map_status,
    },
};
use futures::StreamExt;
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Cap on concurrent read-only probes during fan-out. An operational
/// guess; the right bound depends on backend capacity.
pub const FANOUT_LIMIT: usize = 16;

#[derive(Clone)]
pub struct UsageAggregator {
    backend: BackendClient,
}

impl UsageAggregator {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Compute the account's usage snapshot.
    ///
    /// Fails with `NotFound` when the tenant account does not exist,
    /// `PermissionDenied` when the token cannot read it, and the transport
    /// variants on timeouts or outages.
    pub async fn compute_usage(&self, ctx: &RequestContext) -> GatewayResult<AccountUsage> {
        let probe = self.backend.head_account(ctx).await?;
        match probe.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(GatewayError::NotFound(format!(
                    "account for project `{}`",
                    ctx.project_id
                )));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GatewayError::PermissionDenied(
                    "token cannot read the tenant account".into(),
                ));
            }
            status => return Err(map_status(status, "account")),
        }

        let quota = header_str(&probe, ACCOUNT_QUOTA_BYTES)
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map_or(Quota::Unlimited, Quota::Limited);
        let mut bytes_used = header_u64(&probe, ACCOUNT_BYTES_USED);
        let mut container_count = header_u64(&probe, ACCOUNT_CONTAINER_COUNT);
        let mut object_count = header_u64(&probe, ACCOUNT_OBJECT_COUNT);
        let mut unreachable_containers = Vec::new();

        // Zero is ambiguous; recompute from live container metadata.
        if bytes_used == 0 {
            let pass = self.reconcile(ctx).await?;
            bytes_used = pass.bytes_used;
            object_count = pass.object_count;
            container_count = pass.container_count;
            unreachable_containers = pass.unreachable_containers;
        }

        Ok(AccountUsage {
            project_id: ctx.project_id.clone(),
            quota_bytes: quota,
            usage_percent: AccountUsage::percent_of(quota, bytes_used),
            bytes_used,
            container_count,
            object_count,
            unreachable_containers,
        })
    }

    /// Sum bytes and objects across per-container metadata probes.
    ///
    /// Probes run with bounded concurrency. A failed probe is recorded as
    /// a diagnostic and excluded from the sums; it does not fail the pass.
    async fn reconcile(&self, ctx: &RequestContext) -> GatewayResult<ReconciledUsage> {
        let containers = self.backend.list_containers(ctx).await?;
        let container_count = containers.len() as u64;
        debug!(
            project = %ctx.project_id,
            containers = container_count,
            "account counters look stale, reconciling from container metadata"
        );

        let probes = futures::stream::iter(containers.into_iter().map(|entry| {
            let backend = self.backend.clone();
            async move {
                let result = backend.head_container(ctx, &entry.name).await;
                (entry.name, result)
            }
        }))
        .buffer_unordered(FANOUT_LIMIT)
        .collect::<Vec<_>>()
        .await;

        let mut usage = ReconciledUsage {
            container_count,
            ..ReconciledUsage::default()
        };
        for (name, result) in probes {
            match result {
                Ok(response) if response.status().is_success() => {
                    usage.bytes_used += header_u64(&response, CONTAINER_BYTES_USED);
                    usage.object_count += header_u64(&response, CONTAINER_OBJECT_COUNT);
                }
                Ok(response) => {
                    warn!(container = %name, status = %response.status(), "container probe refused");
                    usage.unreachable_containers.push(name);
                }
                Err(err) => {
                    warn!(container = %name, error = %err, "container probe failed");
                    usage.unreachable_containers.push(name);
                }
            }
        }
        usage.unreachable_containers.sort();
        Ok(usage)
    }
}

#[derive(Debug, Default)]
struct ReconciledUsage {
    bytes_used: u64,
    object_count: u64,
    container_count: u64,
    unreachable_containers: Vec<String>,
}
