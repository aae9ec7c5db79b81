use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::{auth_router, AuthState};

/// Where the API listens
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: 4060,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// HTTP server for the back office API
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AuthState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: Arc<AuthState>) -> Self {
        Self { config, state }
    }

    /// Bind the configured host (IP or hostname) and port
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.config.host.as_str(), self.config.port)).await
    }

    /// Serve until Ctrl-C
    pub async fn start(&self) -> crate::Result<()> {
        let listener = self.bind().await.map_err(|e| {
            crate::BackofficeError::Server(format!(
                "cannot bind {}:{}: {}",
                self.config.host, self.config.port, e
            ))
        })?;
        let addr: SocketAddr = listener.local_addr()?;

        log::info!("Back office API listening on http://{}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        log::info!("Server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        auth_router(self.state.clone()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown requested, draining connections"),
        Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
    }
}
