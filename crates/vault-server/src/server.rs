//! HTTP server orchestration

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::routes::router;
use vault_core::CredentialService;

/// HTTP server for the password API
pub struct VaultServer {
    service: CredentialService,
    bind_address: String,
}

impl VaultServer {
    /// Create a new server
    pub fn new(service: CredentialService, bind_address: impl Into<String>) -> Self {
        Self {
            service,
            bind_address: bind_address.into(),
        }
    }

    /// Run until ctrl-c
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = router(self.service)
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!("Starting passvault HTTP server on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
