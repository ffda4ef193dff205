use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::{debug, info};

use hireflow::config::AppConfig;
use hireflow::error::AppError;
use hireflow::signaling::{SessionRegistry, SignalingState};
use hireflow::telemetry;
use hireflow::workflows::hiring::HiringWorkflowEngine;

use crate::cli::ServeArgs;
use crate::infra::{
    seed_sample_data, AppState, InMemoryApplicationStore, InMemoryEventStore,
    InMemoryInterviewStore, InMemoryOfferStore, InMemoryPipelineStore, InMemoryTestStore,
    LoggingNotifier,
};
use crate::routes::service_routes;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

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
        config.workflow.clone(),
    ));

    let registry = Arc::new(SessionRegistry::new());
    spawn_session_sweeper(registry.clone(), &config);
    let signaling = SignalingState {
        registry,
        config: config.signaling.clone(),
    };

    let app = service_routes(engine, signaling)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "recruiting service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop signaling sessions that have sat idle with no connected
/// peer.
fn spawn_session_sweeper(registry: Arc<SessionRegistry>, config: &AppConfig) {
    let max_idle = config.signaling.session_idle();
    let sweep_interval = config.signaling.sweep_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(max_idle);
            if evicted > 0 {
                debug!(evicted, "swept idle signaling sessions");
            }
        }
    });
}
