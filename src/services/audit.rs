//! Fire-and-forget activity recording.
//!
//! Mutating operations hand an [`ActivityRecord`] to the sink after they
//! succeed. Records travel over an unbounded channel to a drain task that
//! emits one structured log line each under the `audit` target; the
//! primary response path never waits on, and never fails because of,
//! activity recording.

use crate::models::activity::ActivityRecord;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::UnboundedSender<ActivityRecord>,
}

impl AuditSink {
    /// Spawn the drain task and return a handle for producers.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ActivityRecord>();
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                info!(
                    target: "audit",
                    user = %record.username,
                    action = %record.action,
                    project = %record.project_id,
                    timestamp = %record.timestamp.to_rfc3339(),
                    "{}",
                    record.details,
                );
            }
        });
        Self { tx }
    }

    /// Queue a record. Best-effort: a closed channel is logged and ignored.
    pub fn record(&self, record: ActivityRecord) {
        if self.tx.send(record).is_err() {
            warn!("audit sink closed, activity record dropped");
        }
    }

    /// A sink whose drain half is already gone. Records are dropped
    /// silently; useful in tests that do not assert on audit output.
    #[cfg(test)]
    pub fn disconnected() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }
}
