pub(crate) mod routes;
mod state;

pub use state::AppState;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::FireberryMcpServer;

pub fn router(server: FireberryMcpServer) -> Router {
    let state = AppState {
        server: Arc::new(server),
    };

    Router::new()
        .route("/api/v1/health", get(routes::health))
        .route("/api/v1/tools", get(routes::list_tools))
        .route("/api/v1/:tool_name", post(routes::call_tool))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(bind: &str, port: u16, server: FireberryMcpServer) -> anyhow::Result<()> {
    let addr = format!("{}:{}", bind, port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Fireberry HTTP server listening on http://{}", addr);

    serve_on(listener, server).await
}

/// Serves on an already bound listener until Ctrl-C.
pub async fn serve_on(listener: TcpListener, server: FireberryMcpServer) -> anyhow::Result<()> {
    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
            }
        })
        .await?;

    Ok(())
}
