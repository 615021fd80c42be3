use crate::cli::ServeArgs;
use crate::infra::{seed_vendors, AppState, InMemoryRequestRepository, InMemoryVendorRepository};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use upkeep::config::AppConfig;
use upkeep::error::AppError;
use upkeep::maintenance::{
    ClassificationAuditLog, MaintenanceService, OpenAiBackend, RequestClassifier,
};
use upkeep::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.classifier.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; every intake will use the fallback classification");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let requests = Arc::new(InMemoryRequestRepository::default());
    let vendors = Arc::new(InMemoryVendorRepository::default());
    seed_vendors(&vendors);

    let backend = Arc::new(OpenAiBackend::from_config(&config.classifier));
    let classifier = Arc::new(
        RequestClassifier::new(backend).with_timeout(config.classifier.timeout),
    );
    let audit = Arc::new(ClassificationAuditLog::default());
    let service = Arc::new(MaintenanceService::new(requests, vendors, classifier, audit));

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "maintenance intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
