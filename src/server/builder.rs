//! ServerBuilder for fluent API to build the functions server

use super::host::ServerHost;
use super::router::{build_mint_routes, functions_cors, health_routes};
use crate::config::PaylinkConfig;
use crate::core::auth::AuthProvider;
use crate::core::store::InvoiceStore;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Builder for the functions server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_store(InMemoryInvoiceStore::new())
///     .with_auth_provider(StaticTokenAuthProvider::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: PaylinkConfig,
    store: Option<Arc<dyn InvoiceStore>>,
    auth: Option<Arc<dyn AuthProvider>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: PaylinkConfig::default(),
            store: None,
            auth: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: PaylinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the invoice store (required)
    pub fn with_store(mut self, store: impl InvoiceStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared invoice store (required unless `with_store` is used)
    pub fn with_shared_store(mut self, store: Arc<dyn InvoiceStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the auth provider (required)
    pub fn with_auth_provider(mut self, auth: impl AuthProvider + 'static) -> Self {
        self.auth = Some(Arc::new(auth));
        self
    }

    /// Add routes next to the mint function (e.g. other hosted functions)
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let store = self
            .store
            .take()
            .ok_or_else(|| anyhow::anyhow!("InvoiceStore is required. Call .with_store()"))?;
        let auth = self.auth.take().ok_or_else(|| {
            anyhow::anyhow!("AuthProvider is required. Call .with_auth_provider()")
        })?;

        ServerHost::from_builder_components(self.config.clone(), store, auth)
    }

    /// Build the router
    ///
    /// Health routes, the mint function and custom routes, wrapped in
    /// request tracing and the functions' CORS policy.
    pub fn build(mut self) -> Result<Router> {
        let host = self.build_host()?;

        let mut app = health_routes().merge(build_mint_routes(host.mint_state()));
        for custom in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom);
        }

        Ok(app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(functions_cors()),
        ))
    }

    /// Serve on `server.bind_addr` with graceful shutdown
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.bind_addr.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!(%addr, "functions server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("functions server stopped");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
///
/// A signal whose handler cannot be installed never fires.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "interrupt",
            Err(err) => {
                tracing::warn!(error = %err, "interrupt handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "terminate"
            }
            Err(err) => {
                tracing::warn!(error = %err, "terminate handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let reason = tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
    };
    tracing::info!(signal = reason, "draining mint requests before exit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::StaticTokenAuthProvider;
    use crate::storage::InMemoryInvoiceStore;

    #[test]
    fn test_build_requires_store() {
        let result = ServerBuilder::new()
            .with_auth_provider(StaticTokenAuthProvider::new())
            .build();
        let err = result.err().expect("missing store should fail");
        assert!(err.to_string().contains("InvoiceStore is required"));
    }

    #[test]
    fn test_build_requires_auth() {
        let result = ServerBuilder::new()
            .with_store(InMemoryInvoiceStore::new())
            .build();
        let err = result.err().expect("missing auth should fail");
        assert!(err.to_string().contains("AuthProvider is required"));
    }

    #[test]
    fn test_build_with_custom_routes() {
        let extra = Router::new().route("/ping", axum::routing::get(|| async { "pong" }));
        let result = ServerBuilder::new()
            .with_store(InMemoryInvoiceStore::new())
            .with_auth_provider(StaticTokenAuthProvider::new())
            .with_custom_routes(extra)
            .build();
        assert!(result.is_ok());
    }
}
