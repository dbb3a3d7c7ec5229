//! Voltage Log Server
//!
//! HTML form and read-only JSON API over the `voltage_logs` table.

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, MethodRouter},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tracing::{info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use config::{AuthSettings, LoggingSettings, Settings};
use storage::{MySqlRepository, RecordStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

/// Create the application router
///
/// The UI pipeline runs through the request logger and then the access
/// guard, so rejected logins still show up in the access log. It serves `/`
/// and every path other than `/api/devices`, which is open and only logged.
pub fn create_router(state: AppState, auth: AuthSettings) -> Router {
    let ui: MethodRouter = get(routes::ui::index)
        .post(routes::ui::create_record)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::log_request))
                .layer(from_fn_with_state(
                    Arc::new(auth),
                    middleware::require_basic_auth,
                )),
        )
        .with_state(state.clone());

    // HEAD is routed explicitly, otherwise `get` would answer it
    let devices = get(routes::devices::list_devices)
        .head(routes::devices::method_not_allowed)
        .fallback(routes::devices::method_not_allowed);

    Router::new()
        .route("/api/devices", devices)
        .route_layer(ServiceBuilder::new().layer(from_fn(middleware::log_request)))
        .with_state(state)
        .route_service("/", ui.clone())
        .fallback_service(ui)
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_max_level(settings.max_level())
        .with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Run the server until Ctrl+C or SIGTERM
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let store = MySqlRepository::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await
    .context("Database is not reachable")?;
    let store: Arc<dyn RecordStore> = Arc::new(store);

    let app = create_router(AppState::new(store.clone()), settings.auth);

    let addr = settings.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Starting voltlog on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    store.close().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
