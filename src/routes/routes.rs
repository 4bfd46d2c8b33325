//! Defines routes for the gateway API.
//!
//! ## Structure
//! - **Open endpoints**
//!   - `GET  /health` — liveness
//!   - `POST /auth/login` — password login against the identity service
//!
//! - **Authenticated endpoints** (bearer token, resolved per request)
//!   - `GET    /containers` — list containers with stats
//!   - `POST   /containers/create` — conflict-checked create
//!   - `DELETE /containers/{name}` — cascading delete
//!   - `GET    /containers/{name}/download` — zip archive
//!   - `GET    /objects/{container}` — objects with uploader metadata
//!   - `POST   /objects/{container}/upload?replace=` — multipart batch
//!   - `GET    /objects/{container}/{*object}` — download one object
//!   - `DELETE /objects/{container}/{*object}` — delete one object
//!   - `POST   /objects/move` — copy-then-delete move
//!   - `GET    /account/usage`, `GET /overview`
//!   - `/projects/...` — tenant lifecycle, admin role required
//!
//! The wildcard `*object` allows nested names like `photos/2026/img.jpg`.
//!
//! `/objects/move` is a static sibling of `/objects/{container}` and takes
//! priority, so a container literally named `move` cannot be listed through
//! the object routes (the path answers 405 for GET). The name is treated as
//! reserved.

use crate::{
    auth,
    handlers::{
        account_handlers::{health, overview, usage},
        auth_handlers::login,
        container_handlers::{
            create_container, delete_container, download_container, list_containers,
        },
        object_handlers::{
            delete_object, download_object, list_objects, move_object, upload_objects,
        },
        project_handlers::{create_project, delete_project, list_projects, set_quota},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};

/// Upper bound on an inbound multipart batch.
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Build the router. Protected routes sit behind the token-resolving
/// middleware; a request that fails introspection never reaches them.
pub fn routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/containers", get(list_containers))
        .route("/containers/create", post(create_container))
        .route(
            "/containers/{name}",
            delete(delete_container),
        )
        .route("/containers/{name}/download", get(download_container))
        .route("/objects/move", post(move_object))
        .route("/objects/{container}", get(list_objects))
        .route("/objects/{container}/upload", post(upload_objects))
        .route(
            "/objects/{container}/{*object}",
            get(download_object).delete(delete_object),
        )
        .route("/account/usage", get(usage))
        .route("/overview", get(overview))
        .route("/projects", get(list_projects))
        .route("/projects/create", post(create_project))
        .route("/projects/{id}", delete(delete_project))
        .route("/projects/{id}/quota", post(set_quota))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_context,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        services::{
            audit::AuditSink, backend::BackendClient, identity::IdentityService,
            orchestrator::ResourceOrchestrator, usage::UsageAggregator,
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn state(identity_url: &str, storage_url: &str) -> AppState {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            identity_url: identity_url.into(),
            storage_url: storage_url.into(),
            user_domain: "Default".into(),
            backend_timeout: Duration::from_secs(2),
        };
        let http = reqwest::Client::new();
        let backend = BackendClient::new(http.clone(), &config).unwrap();
        AppState {
            identity: IdentityService::new(http, &config).unwrap(),
            usage: UsageAggregator::new(backend.clone()),
            orchestrator: ResourceOrchestrator::new(backend.clone(), AuditSink::disconnected()),
            backend,
        }
    }

    fn member_token() -> serde_json::Value {
        serde_json::json!({
            "token": {
                "user": { "id": "u-1", "name": "alice", "domain": { "name": "Default" } },
                "project": { "id": "p-1", "name": "demo" },
                "roles": [{ "name": "Member" }],
                "expires_at": "2099-01-01T00:00:00Z",
            }
        })
    }

    #[tokio::test]
    async fn rejected_token_short_circuits_before_any_storage_call() {
        let identity = MockServer::start().await;
        let storage = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&identity)
            .await;
        // Expectation verified when the mock server drops.
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&storage)
            .await;

        let app = routes(state(&identity.uri(), &storage.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/containers")
                    .header("authorization", "Bearer bad")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["success"], false);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_without_introspection() {
        let identity = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&identity)
            .await;

        let app = routes(state(&identity.uri(), "http://127.0.0.1:1"));
        let response = app
            .oneshot(Request::builder().uri("/containers").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn member_role_cannot_create_projects() {
        let identity = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(member_token()))
            .mount(&identity)
            .await;
        // The lifecycle call must never be issued for a denied caller.
        Mock::given(method("POST"))
            .and(path("/v3/projects"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&identity)
            .await;

        let app = routes(state(&identity.uri(), "http://127.0.0.1:1"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/projects/create")
                    .header("authorization", "Bearer tok")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"new-project"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["success"], false);
    }

    #[tokio::test]
    async fn listing_a_container_named_move_is_not_routable() {
        let identity = MockServer::start().await;
        let storage = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/auth/tokens"))
            .respond_with(ResponseTemplate::new(200).set_body_json(member_token()))
            .mount(&identity)
            .await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&storage)
            .await;

        let app = routes(state(&identity.uri(), &storage.uri()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/objects/move")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
