pub mod db;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod openapi;
pub mod schema;
pub mod settings;
pub mod validation;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{create_booking, create_class, healthz_live, healthz_ready, root};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ledger::Ledger;
use crate::openapi::ApiDoc;
use crate::settings::{RunMode, Settings};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub ledger: Ledger,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = db::open_pool(&settings.database).await?;
    let ledger = Ledger::new(pool.clone())
        .await?
        .with_busy_retries(settings.database.busy_retries);

    let state = AppState {
        settings: settings.clone(),
        ledger,
    };
    let app = build_router(state);

    let addr = SocketAddr::new(settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Class Booking API listening on http://{}", listener.local_addr()?);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutting down");
    let _ = stop_tx.send(());

    stop_server(server, settings.shutdown_timeout()).await?;

    if tokio::time::timeout(settings.shutdown_timeout(), pool.close())
        .await
        .is_err()
    {
        warn!("Database pool did not close within {}s", settings.shutdown_timeout_secs);
    }
    info!("Server stopped");
    Ok(())
}

/// Waits up to `limit` for the server to drain, then aborts it so in-flight
/// handlers release their connections.
async fn stop_server(
    mut server: JoinHandle<std::io::Result<()>>,
    limit: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    match tokio::time::timeout(limit, &mut server).await {
        Ok(joined) => joined??,
        Err(_) => {
            warn!(
                "In-flight requests did not finish within {}s, aborting",
                limit.as_secs()
            );
            server.abort();
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let cors_layer = match state.settings.env {
        RunMode::Development => CorsLayer::very_permissive(),
        RunMode::Production => CorsLayer::permissive(),
    };

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/classes", post(create_class))
        .route("/bookings", post(create_booking))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(ServiceBuilder::new().layer(trace_layer).layer(cors_layer))
}
