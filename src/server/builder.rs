//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::MarketplaceConfig;
use crate::core::auth::{AuthProvider, JwtAuthProvider, StaticTokenProvider};
use crate::core::events::EventBus;
use crate::core::repository::{
    CartRepository, OrderCommentRepository, OrderRepository, ProductRepository, Repositories,
};
use crate::storage;
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the marketplace HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryStore::new())
///     .with_auth_provider(JwtAuthProvider::new("secret"))
///     .build()?;
/// ```
pub struct ServerBuilder {
    repositories: Option<Repositories>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    custom_routes: Vec<Router>,
    event_bus: Option<EventBus>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            repositories: None,
            auth_provider: None,
            custom_routes: Vec::new(),
            event_bus: None,
        }
    }

    /// Storage, wired from a config file: backend connection, catalog
    /// seeding, JWT secret (plus static tokens) and event bus capacity
    pub async fn from_config(config: &MarketplaceConfig) -> Result<Self> {
        config.validate()?;

        let repositories = storage::connect(&config.storage).await?;
        storage::seed_catalog(repositories.products.as_ref(), &config.catalog).await?;

        let jwt: Arc<dyn AuthProvider> = Arc::new(JwtAuthProvider::new(&config.auth.jwt_secret));
        let auth: Arc<dyn AuthProvider> = if config.auth.tokens.is_empty() {
            jwt
        } else {
            let provider = config
                .auth
                .tokens
                .iter()
                .fold(StaticTokenProvider::new(), |provider, entry| {
                    provider.with_token(entry.token.clone(), entry.principal())
                });
            tracing::warn!(count = config.auth.tokens.len(), "static tokens enabled");
            Arc::new(provider.with_fallback(jwt))
        };

        Ok(Self::new()
            .with_repositories(repositories)
            .with_shared_auth_provider(auth)
            .with_event_bus(config.events.capacity))
    }

    /// Set the repositories (required)
    pub fn with_repositories(mut self, repositories: Repositories) -> Self {
        self.repositories = Some(repositories);
        self
    }

    /// Use one backend value for every repository
    pub fn with_store<S>(self, store: S) -> Self
    where
        S: ProductRepository
            + CartRepository
            + OrderRepository
            + OrderCommentRepository
            + 'static,
    {
        self.with_repositories(Repositories::from_store(store))
    }

    /// Set the auth provider (required)
    pub fn with_auth_provider(self, provider: impl AuthProvider + 'static) -> Self {
        self.with_shared_auth_provider(Arc::new(provider))
    }

    pub fn with_shared_auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    /// Add custom routes to the server
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Size the notification channel. Without this call a bus with the
    /// default capacity is created.
    pub fn with_event_bus(mut self, capacity: usize) -> Self {
        self.event_bus = Some(EventBus::new(capacity));
        self
    }

    /// Publish onto an existing bus, shared with services built elsewhere
    pub fn with_shared_event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Build the transport-agnostic host
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let repositories = self
            .repositories
            .take()
            .ok_or_else(|| anyhow!("Repositories are required. Call .with_repositories() or .with_store()"))?;
        let auth = self
            .auth_provider
            .take()
            .ok_or_else(|| anyhow!("Auth provider is required. Call .with_auth_provider()"))?;
        let event_bus = self.event_bus.take().unwrap_or_default();

        Ok(ServerHost::new(&repositories, auth, event_bus))
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = self.build_host()?;
        Ok(RestExposure::build_router(host, custom_routes))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
