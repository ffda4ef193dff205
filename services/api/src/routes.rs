use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

use hireflow::signaling::{signaling_router, SignalingState};
use hireflow::workflows::hiring::{workflow_router, HiringWorkflowEngine};

use crate::infra::AppState;

/// Compose the workflow API, the signaling relay, and the operational
/// endpoints into the full service router.
pub(crate) fn service_routes(
    engine: Arc<HiringWorkflowEngine>,
    signaling: SignalingState,
) -> axum::Router {
    workflow_router(engine)
        .merge(signaling_router(signaling))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use hireflow::config::{SignalingConfig, WorkflowConfig};
    use hireflow::signaling::SessionRegistry;
    use tower::ServiceExt;

    use crate::infra::{
        seed_sample_data, InMemoryApplicationStore, InMemoryEventStore, InMemoryInterviewStore,
        InMemoryOfferStore, InMemoryPipelineStore, InMemoryTestStore, LoggingNotifier,
    };

    fn test_router() -> axum::Router {
        let applications = Arc::new(InMemoryApplicationStore::default());
        let tests = Arc::new(InMemoryTestStore::default());
        seed_sample_data(&applications, &tests);

        let engine = Arc::new(HiringWorkflowEngine::new(
            Arc::new(InMemoryPipelineStore::default()),
            applications,
            Arc::new(InMemoryEventStore::default()),
            tests,
            Arc::new(InMemoryInterviewStore::default()),
            Arc::new(InMemoryOfferStore::default()),
            Arc::new(LoggingNotifier::default()),
            WorkflowConfig::default(),
        ));
        let signaling = SignalingState {
            registry: Arc::new(SessionRegistry::new()),
            config: SignalingConfig::default(),
        };
        service_routes(engine, signaling)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_application_can_start_its_pipeline() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/workflow/applications/app-1001/initiate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn fallback_endpoint_is_mounted() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/video/app-1001/fallback")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
