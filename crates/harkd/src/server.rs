//! HTTP server assembly and lifecycle.

use std::sync::Arc;

use axum::Router;
use hark_core::StateStore;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::command::CommandRunner;
use crate::error::StartupError;
use crate::routes;
use crate::routing::{dispatch, CompiledRouter};
use crate::services::{MachineService, SystemService};

/// Compile the route table and wrap it in an axum app.
///
/// axum only supplies the transport here: every request goes to the
/// fallback, which defers to the compiled regex router.
pub fn build_app(
    store: Arc<dyn StateStore>,
    runner: Arc<dyn CommandRunner>,
) -> Result<Router, StartupError> {
    let route_map = routes::route_map(SystemService::new(runner), MachineService::new(store));
    let router = Arc::new(CompiledRouter::compile(route_map)?);
    info!("Compiled {} routes", router.len());

    Ok(Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(router))
}

/// Serve `app` on `listener` until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, initiating shutdown");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
