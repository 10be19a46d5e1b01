//! HTTP server setup and request routing
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. Timeout enforcement
//! 4. Origin gate (work-request routes), open CORS (status routes)
//! 5. Handler execution

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::{
    handlers,
    middleware::{cors_gate_middleware, inject_request_id},
    AppState,
};

/// Build the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let status_routes = Router::new()
        .route("/", get(handlers::api_test))
        .route("/APITEST", get(handlers::api_test))
        // health checks are readable from any page
        .layer(CorsLayer::permissive());

    let work_request_routes = Router::new()
        .route(
            "/workrequest/{id}",
            get(handlers::work_request_probe)
                .post(handlers::receive_work_request)
                .options(handlers::preflight),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cors_gate_middleware,
        ));

    Router::new()
        .merge(status_routes)
        .merge(work_request_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then let in-flight requests finish
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server<F>(
    state: AppState,
    addr: SocketAddr,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;
    info!(addr = %actual_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Waits for CTRL+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("No longer accepting connections, finishing in-flight requests");
}
