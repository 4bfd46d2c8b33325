//! Compound, multi-call operations over the backend client.
//!
//! The backend offers no atomic create-if-absent, no recursive container
//! delete, and no move primitive. Each operation here is a short protocol
//! of probes and mutations with documented ordering: destructive calls run
//! sequentially, read-only fan-out is bounded, and per-item failures in
//! batch operations are reported per item instead of aborting the batch.

use crate::{
    errors::{GatewayError, GatewayResult},
    models::{
        activity::{Action, ActivityRecord},
        context::RequestContext,
        object::ObjectDescriptor,
    },
    services::{
        audit::AuditSink,
        backend::{
            BackendClient, OBJECT_UPLOADED_AT, OBJECT_UPLOADED_BY, header_str, map_status,
        },
        usage::FANOUT_LIMIT,
    },
};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Serialize;
use std::io::Write;
use tracing::{debug, warn};
use zip::{ZipWriter, write::SimpleFileOptions};

/// One file in a bulk upload batch.
#[derive(Debug)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Per-file outcome of a bulk upload. The batch as a whole never fails
/// because one file conflicted.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UploadOutcome {
    pub name: String,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Uploaded,
    AlreadyExists,
    Failed,
}

/// Echo of a completed move.
#[derive(Debug, Serialize)]
pub struct MoveResult {
    pub from: String,
    pub to: String,
}

#[derive(Clone)]
pub struct ResourceOrchestrator {
    backend: BackendClient,
    audit: AuditSink,
}

impl ResourceOrchestrator {
    pub fn new(backend: BackendClient, audit: AuditSink) -> Self {
        Self { backend, audit }
    }

    /// Create a container after probing for an existing one.
    ///
    /// The probe-then-create sequence is racy; the backend has no atomic
    /// create-if-absent. A conflict reported by the create call itself is
    /// mapped to the same `AlreadyExists` the probe would have produced.
    pub async fn create_container(&self, ctx: &RequestContext, name: &str) -> GatewayResult<()> {
        let probe = self.backend.head_container(ctx, name).await?;
        match probe.status() {
            status if status.is_success() => {
                return Err(GatewayError::AlreadyExists(format!("container `{name}`")));
            }
            StatusCode::NOT_FOUND => {}
            status => return Err(map_status(status, &format!("container `{name}`"))),
        }

        let created = self.backend.put_container(ctx, name).await?;
        match created.status() {
            status if status.is_success() => {
                self.audit.record(ActivityRecord::new(
                    &ctx.username,
                    Action::Create,
                    format!("created container `{name}`"),
                    &ctx.project_id,
                ));
                Ok(())
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(GatewayError::AlreadyExists(format!("container `{name}`")))
            }
            status => Err(map_status(status, &format!("container `{name}`"))),
        }
    }

    /// Delete a container and everything in it.
    ///
    /// Listing failure aborts the operation before anything is deleted.
    /// Object deletes then run sequentially; an object that is already
    /// gone (404) is not an error. Only after every object delete has been
    /// attempted is the container itself deleted. Returns the number of
    /// objects removed.
    pub async fn delete_container(&self, ctx: &RequestContext, name: &str) -> GatewayResult<u64> {
        let objects = self.backend.list_objects(ctx, name).await?;

        let mut deleted = 0u64;
        for object in &objects {
            let response = self.backend.delete_object(ctx, name, &object.name).await?;
            match response.status() {
                status if status.is_success() => deleted += 1,
                StatusCode::NOT_FOUND => {
                    debug!(container = %name, object = %object.name, "object already gone");
                }
                status => {
                    return Err(map_status(
                        status,
                        &format!("object `{}` in `{name}`", object.name),
                    ));
                }
            }
        }

        let response = self.backend.delete_container(ctx, name).await?;
        match response.status() {
            status if status.is_success() => {
                self.audit.record(ActivityRecord::new(
                    &ctx.username,
                    Action::Delete,
                    format!("deleted container `{name}` ({deleted} objects)"),
                    &ctx.project_id,
                ));
                Ok(deleted)
            }
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(format!("container `{name}`"))),
            StatusCode::CONFLICT => Err(GatewayError::ContainerNotEmpty(name.to_string())),
            status => Err(map_status(status, &format!("container `{name}`"))),
        }
    }

    /// Delete a single object.
    pub async fn delete_object(
        &self,
        ctx: &RequestContext,
        container: &str,
        object: &str,
    ) -> GatewayResult<()> {
        let response = self.backend.delete_object(ctx, container, object).await?;
        match response.status() {
            status if status.is_success() => {
                self.audit.record(ActivityRecord::new(
                    &ctx.username,
                    Action::Delete,
                    format!("deleted `{object}` from `{container}`"),
                    &ctx.project_id,
                ));
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(GatewayError::NotFound(format!(
                "object `{object}` in `{container}`"
            ))),
            status => Err(map_status(
                status,
                &format!("object `{object}` in `{container}`"),
            )),
        }
    }

    /// Move an object by copy-then-delete.
    ///
    /// No delete is attempted unless the copy succeeded, so a failed copy
    /// leaves the source intact. A copy that succeeds followed by a delete
    /// that fails is surfaced as `PartialMove` so the caller retries the
    /// delete rather than re-copying. A 404 on the delete means the source
    /// was already gone, which is the desired end state.
    pub async fn move_object(
        &self,
        ctx: &RequestContext,
        src_container: &str,
        src_object: &str,
        dest_container: &str,
        dest_object: Option<&str>,
    ) -> GatewayResult<MoveResult> {
        let dest_object = dest_object.unwrap_or(src_object);
        let from = format!("{src_container}/{src_object}");
        let to = format!("{dest_container}/{dest_object}");

        let copied = self
            .backend
            .copy_object(ctx, src_container, src_object, dest_container, dest_object)
            .await?;
        match copied.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(GatewayError::NotFound(format!("object `{from}`")));
            }
            status => return Err(map_status(status, &format!("object `{from}`"))),
        }

        let delete = self
            .backend
            .delete_object(ctx, src_container, src_object)
            .await;
        let partial = |detail: String| GatewayError::PartialMove {
            from: from.clone(),
            to: to.clone(),
            detail,
        };
        match delete {
            Ok(response)
                if response.status().is_success()
                    || response.status() == StatusCode::NOT_FOUND => {}
            Ok(response) => {
                warn!(%from, %to, status = %response.status(), "source delete failed after copy");
                return Err(partial(format!("source delete answered {}", response.status())));
            }
            Err(err) => {
                warn!(%from, %to, error = %err, "source delete failed after copy");
                return Err(partial(err.to_string()));
            }
        }

        self.audit.record(ActivityRecord::new(
            &ctx.username,
            Action::Move,
            format!("moved `{from}` to `{to}`"),
            &ctx.project_id,
        ));
        Ok(MoveResult { from, to })
    }

    /// Upload a batch of files with overwrite negotiation.
    ///
    /// Each file is handled independently: existence is probed first, and
    /// a conflicting file yields an `AlreadyExists` outcome without
    /// aborting the rest of the batch unless the caller asked to replace.
    /// Uploads are sequential; they mutate backend state.
    pub async fn bulk_upload(
        &self,
        ctx: &RequestContext,
        container: &str,
        files: Vec<UploadFile>,
        replace: bool,
    ) -> GatewayResult<Vec<UploadOutcome>> {
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let outcome = self.upload_one(ctx, container, file, replace).await;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn upload_one(
        &self,
        ctx: &RequestContext,
        container: &str,
        file: UploadFile,
        replace: bool,
    ) -> UploadOutcome {
        let name = file.name;

        if !replace {
            match self.backend.head_object(ctx, container, &name).await {
                Ok(probe) if probe.status().is_success() => {
                    return UploadOutcome {
                        name,
                        status: UploadStatus::AlreadyExists,
                        message: Some("object exists and replace was not requested".into()),
                    };
                }
                Ok(probe) if probe.status() == StatusCode::NOT_FOUND => {}
                Ok(probe) => {
                    return UploadOutcome {
                        name,
                        status: UploadStatus::Failed,
                        message: Some(format!("existence probe answered {}", probe.status())),
                    };
                }
                Err(err) => {
                    return UploadOutcome {
                        name,
                        status: UploadStatus::Failed,
                        message: Some(err.to_string()),
                    };
                }
            }
        }

        let size = file.data.len();
        let result = self
            .backend
            .put_object(ctx, container, &name, file.content_type.as_deref(), file.data)
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                self.audit.record(ActivityRecord::new(
                    &ctx.username,
                    Action::Upload,
                    format!("uploaded `{name}` to `{container}` ({size} bytes)"),
                    &ctx.project_id,
                ));
                UploadOutcome {
                    name,
                    status: UploadStatus::Uploaded,
                    message: None,
                }
            }
            Ok(response) => UploadOutcome {
                name,
                status: UploadStatus::Failed,
                message: Some(format!("upload answered {}", response.status())),
            },
            Err(err) => UploadOutcome {
                name,
                status: UploadStatus::Failed,
                message: Some(err.to_string()),
            },
        }
    }

    /// List a container's objects enriched with uploader metadata.
    ///
    /// The listing gives names and sizes; uploader identity lives in
    /// per-object metadata, fetched with bounded concurrent probes. An
    /// object whose probe fails still appears, with the listing's own
    /// last-modified as its timestamp.
    pub async fn list_objects_with_metadata(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Vec<ObjectDescriptor>> {
        let entries = self.backend.list_objects(ctx, container).await?;

        let descriptors = futures::stream::iter(entries.into_iter().map(|entry| {
            let backend = self.backend.clone();
            async move {
                let mut descriptor = ObjectDescriptor {
                    name: entry.name.clone(),
                    size_bytes: entry.bytes,
                    uploaded_at: entry.last_modified.clone(),
                    uploaded_by: None,
                    content_type: entry.content_type.clone(),
                };
                match backend.head_object(ctx, container, &entry.name).await {
                    Ok(probe) if probe.status().is_success() => {
                        descriptor.uploaded_by = header_str(&probe, OBJECT_UPLOADED_BY);
                        if let Some(uploaded_at) = header_str(&probe, OBJECT_UPLOADED_AT) {
                            descriptor.uploaded_at = Some(uploaded_at);
                        }
                    }
                    Ok(probe) => {
                        debug!(object = %entry.name, status = %probe.status(), "metadata probe refused");
                    }
                    Err(err) => {
                        debug!(object = %entry.name, error = %err, "metadata probe failed");
                    }
                }
                descriptor
            }
        }))
        .buffered(FANOUT_LIMIT)
        .collect::<Vec<_>>()
        .await;

        Ok(descriptors)
    }

    /// Assemble a zip archive of every object in a container.
    ///
    /// Bodies are fetched with bounded, order-preserving concurrency and
    /// appended to the in-memory archive as each fetch completes, so at
    /// most the fan-out limit of bodies is resident alongside the growing
    /// archive. An object that vanished between listing and fetch is
    /// skipped; any other fetch failure aborts the archive.
    pub async fn download_archive(
        &self,
        ctx: &RequestContext,
        container: &str,
    ) -> GatewayResult<Vec<u8>> {
        let entries = self.backend.list_objects(ctx, container).await?;

        let mut bodies = futures::stream::iter(entries.into_iter().map(|entry| {
            let backend = self.backend.clone();
            async move {
                let response = backend.get_object(ctx, container, &entry.name).await?;
                match response.status() {
                    status if status.is_success() => {
                        let body = response.bytes().await?;
                        Ok::<_, GatewayError>((entry.name, Some(body)))
                    }
                    StatusCode::NOT_FOUND => {
                        debug!(object = %entry.name, "object vanished before archiving");
                        Ok((entry.name, None))
                    }
                    status => Err(map_status(status, &format!("object `{}`", entry.name))),
                }
            }
        }))
        .buffered(FANOUT_LIMIT);

        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        while let Some(fetched) = bodies.next().await {
            let (name, body) = fetched?;
            let Some(body) = body else { continue };
            writer
                .start_file(&name, options)
                .map_err(|err| GatewayError::Internal(format!("zip entry `{name}`: {err}")))?;
            writer
                .write_all(&body)
                .map_err(|err| GatewayError::Internal(format!("zip entry `{name}`: {err}")))?;
        }
        let cursor = writer
            .finish()
            .map_err(|err| GatewayError::Internal(format!("zip finish: {err}")))?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use chrono::Utc;
    use reqwest::Client;
    use std::collections::HashSet;
    use std::time::Duration;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context() -> RequestContext {
        RequestContext {
            subject_token: "tok".into(),
            user_id: "u-1".into(),
            username: "alice".into(),
            user_domain: "Default".into(),
            project_id: "p-1".into(),
            project_name: "demo".into(),
            roles: HashSet::from(["member".to_string()]),
            token_expiry: Utc::now() + chrono::Duration::hours(1),
        }
    }

    fn orchestrator(storage_url: &str) -> ResourceOrchestrator {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            identity_url: "http://127.0.0.1:1".into(),
            storage_url: storage_url.into(),
            user_domain: "Default".into(),
            backend_timeout: Duration::from_secs(2),
        };
        ResourceOrchestrator::new(
            BackendClient::new(Client::new(), &config).unwrap(),
            AuditSink::disconnected(),
        )
    }

    #[tokio::test]
    async fn create_probes_before_creating() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/media"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/AUTH_p-1/media"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        orchestrator(&server.uri())
            .create_container(&context(), "media")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_of_existing_container_conflicts_without_create_call() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/media"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/AUTH_p-1/media"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = orchestrator(&server.uri())
            .create_container(&context(), "media")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn delete_container_deletes_each_object_then_the_container() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "a.log", "bytes": 10 },
                { "name": "b.log", "bytes": 20 },
                { "name": "c.log", "bytes": 30 },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/logs/a.log"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        // Already gone: tolerated, not a failure.
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/logs/b.log"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/logs/c.log"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/logs"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let deleted = orchestrator(&server.uri())
            .delete_container(&context(), "logs")
            .await
            .unwrap();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn container_still_nonempty_surfaces_retryable_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/logs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/logs"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = orchestrator(&server.uri())
            .delete_container(&context(), "logs")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ContainerNotEmpty(_)));
    }

    #[tokio::test]
    async fn failed_copy_never_deletes_the_source() {
        let server = MockServer::start().await;
        Mock::given(method("COPY"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let err = orchestrator(&server.uri())
            .move_object(&context(), "a", "report.pdf", "b", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn copy_then_failed_delete_is_a_partial_move() {
        let server = MockServer::start().await;
        Mock::given(method("COPY"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .and(header_exists("destination"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = orchestrator(&server.uri())
            .move_object(&context(), "a", "report.pdf", "b", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::PartialMove { .. }));
    }

    #[tokio::test]
    async fn successful_move_echoes_source_and_destination() {
        let server = MockServer::start().await;
        Mock::given(method("COPY"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/AUTH_p-1/a/report.pdf"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = orchestrator(&server.uri())
            .move_object(&context(), "a", "report.pdf", "b", Some("archive/report.pdf"))
            .await
            .unwrap();
        assert_eq!(result.from, "a/report.pdf");
        assert_eq!(result.to, "b/archive/report.pdf");
    }

    #[tokio::test]
    async fn bulk_upload_reports_per_file_outcomes() {
        let server = MockServer::start().await;
        // x.txt exists, y.txt does not.
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/docs/y.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/AUTH_p-1/docs/y.txt"))
            .and(header_exists(OBJECT_UPLOADED_BY))
            .and(header_exists(OBJECT_UPLOADED_AT))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![
            UploadFile {
                name: "x.txt".into(),
                content_type: Some("text/plain".into()),
                data: Bytes::from_static(b"xx"),
            },
            UploadFile {
                name: "y.txt".into(),
                content_type: Some("text/plain".into()),
                data: Bytes::from_static(b"yy"),
            },
        ];
        let outcomes = orchestrator(&server.uri())
            .bulk_upload(&context(), "docs", files, false)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, UploadStatus::AlreadyExists);
        assert_eq!(outcomes[0].name, "x.txt");
        assert_eq!(outcomes[1].status, UploadStatus::Uploaded);
        assert_eq!(outcomes[1].name, "y.txt");
    }

    #[tokio::test]
    async fn replace_skips_the_existence_probe() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![UploadFile {
            name: "x.txt".into(),
            content_type: None,
            data: Bytes::from_static(b"xx"),
        }];
        let outcomes = orchestrator(&server.uri())
            .bulk_upload(&context(), "docs", files, true)
            .await
            .unwrap();
        assert_eq!(outcomes[0].status, UploadStatus::Uploaded);
    }

    #[tokio::test]
    async fn listing_enriches_objects_with_uploader_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "x.txt", "bytes": 2, "last_modified": "2026-01-01T00:00:00", "content_type": "text/plain" },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(OBJECT_UPLOADED_BY, "alice")
                    .insert_header(OBJECT_UPLOADED_AT, "2026-01-02T12:00:00Z"),
            )
            .mount(&server)
            .await;

        let descriptors = orchestrator(&server.uri())
            .list_objects_with_metadata(&context(), "docs")
            .await
            .unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].uploaded_by.as_deref(), Some("alice"));
        assert_eq!(
            descriptors[0].uploaded_at.as_deref(),
            Some("2026-01-02T12:00:00Z")
        );
    }

    #[tokio::test]
    async fn archive_contains_every_listed_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "x.txt", "bytes": 2 },
                { "name": "sub/y.txt", "bytes": 2 },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xx".as_slice()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs/sub/y.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"yy".as_slice()))
            .mount(&server)
            .await;

        let archive = orchestrator(&server.uri())
            .download_archive(&context(), "docs")
            .await
            .unwrap();

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x.txt", "sub/y.txt"]);
    }

    #[tokio::test]
    async fn object_vanished_before_archiving_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "x.txt", "bytes": 2 },
                { "name": "gone.txt", "bytes": 2 },
                { "name": "z.txt", "bytes": 2 },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs/x.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"xx".as_slice()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs/gone.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/AUTH_p-1/docs/z.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zz".as_slice()))
            .mount(&server)
            .await;

        let archive = orchestrator(&server.uri())
            .download_archive(&context(), "docs")
            .await
            .unwrap();

        let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["x.txt", "z.txt"]);
    }
}
