use admitpay_backend::api::payments::{self, PaymentsState};
use admitpay_backend::config::AppConfig;
use admitpay_backend::database::{init_pool, PoolConfig};
use admitpay_backend::health::{HealthChecker, HealthStatus};
use admitpay_backend::logging::init_tracing;
use admitpay_backend::payments::paystack::PaystackGateway;
use admitpay_backend::services::acceptance_fee::{AcceptanceFeeService, AcceptanceFeeSettings};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        live_mode = config.paystack.is_live_mode(),
        "Starting admissions payment backend"
    );

    let db_pool = init_pool(&config.database.url, Some(PoolConfig::from(&config.database)))
        .await
        .map_err(|e| {
            error!("Failed to initialize database pool: {}", e);
            anyhow::anyhow!(e)
        })?;

    let gateway = PaystackGateway::new(config.paystack.clone())
        .map_err(|e| anyhow::anyhow!("failed to initialize payment gateway: {e}"))?;

    let store = admitpay_backend::database::application_repository::ApplicationRepository::new(
        db_pool.clone(),
    );

    let service = Arc::new(AcceptanceFeeService::new(
        Arc::new(gateway),
        Arc::new(store),
        AcceptanceFeeSettings::new(config.paystack.public_base_url.clone()),
    ));

    let health_checker = HealthChecker::new(db_pool.clone());

    let payment_routes = Router::new()
        .route("/api/payments/initialize", post(payments::initialize_payment))
        .route(
            "/api/acceptance/payment",
            post(payments::verify_acceptance_payment),
        )
        .with_state(PaymentsState { service });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/health/live", get(liveness))
        .merge(payment_routes)
        .with_state(health_checker)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

async fn root() -> &'static str {
    "Admissions payment backend"
}

async fn health(
    State(checker): State<HealthChecker>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    let health_status = checker.check_health().await;

    if health_status.is_healthy() {
        Ok(Json(health_status))
    } else {
        Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Service Unavailable".to_string(),
        ))
    }
}

/// Readiness probe - checks if the service is ready to accept traffic
async fn readiness(
    state: State<HealthChecker>,
) -> Result<Json<HealthStatus>, (axum::http::StatusCode, String)> {
    health(state).await
}

/// Liveness probe - checks if the service is alive (basic check)
async fn liveness() -> &'static str {
    "OK"
}
