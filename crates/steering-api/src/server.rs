// crates/steering-api/src/server.rs
// ============================================================================
// Module: Steering Server
// Description: Server assembly from configuration and the HTTP serve loop.
// Purpose: Wire catalog, store, service, auth, and audit into one router.
// Dependencies: steering-config, steering-core, steering-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`SteeringServer::from_config`] validates configuration, seeds the
//! catalog, opens the configured store, and builds the router. The router is
//! exposed separately so tests can drive it without binding a socket.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use steering_config::ServerAuthMode;
use steering_config::ServerConfig;
use steering_config::SteeringConfig;
use steering_config::StoreType;
use steering_core::Catalog;
use steering_core::InMemorySteeringTargetStore;
use steering_core::SharedSteeringTargetStore;
use steering_core::SteeringTargetService;
use steering_store_sqlite::SqliteSteeringTargetStore;
use thiserror::Error;

use crate::audit::AuditChangeSink;
use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::auth::DefaultAuthenticator;
use crate::routes::ApiState;
use crate::routes::build_router;

// ============================================================================
// SECTION: Server
// ============================================================================

/// Steering HTTP server.
pub struct SteeringServer {
    /// Validated configuration.
    config: SteeringConfig,
    /// Handler state shared by every route.
    state: Arc<ApiState>,
}

impl SteeringServer {
    /// Builds a server from configuration, auditing to stderr when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringServerError`] when configuration is invalid or the
    /// store cannot be opened.
    pub fn from_config(config: SteeringConfig) -> Result<Self, SteeringServerError> {
        let audit: Arc<dyn AuditSink> = if config.server.audit.enabled {
            Arc::new(StderrAuditSink)
        } else {
            Arc::new(NoopAuditSink)
        };
        Self::with_audit_sink(config, audit)
    }

    /// Builds a server from configuration with an explicit audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringServerError`] when configuration is invalid or the
    /// store cannot be opened.
    pub fn with_audit_sink(
        config: SteeringConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, SteeringServerError> {
        config.validate().map_err(|err| SteeringServerError::Config(err.to_string()))?;
        let catalog: Arc<dyn Catalog> = Arc::new(
            config
                .catalog
                .build_catalog()
                .map_err(|err| SteeringServerError::Config(err.to_string()))?,
        );
        let store = build_store(&config, Arc::clone(&catalog))?;
        let service = SteeringTargetService::from_catalog(catalog, store)
            .with_change_sink(Arc::new(AuditChangeSink::new(Arc::clone(&audit))));
        let authenticator = Arc::new(DefaultAuthenticator::from_config(&config.server.auth));
        let state = Arc::new(ApiState::new(service, authenticator, audit));
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Returns the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), self.config.server.max_body_bytes)
    }

    /// Binds the configured address and serves until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`SteeringServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), SteeringServerError> {
        let addr = self
            .config
            .server
            .bind_addr()
            .map_err(|err| SteeringServerError::Config(err.to_string()))?;
        emit_local_only_warning(&self.config.server);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| SteeringServerError::Transport(format!("http bind failed: {err}")))?;
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| SteeringServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Builds the steering target store from configuration.
fn build_store(
    config: &SteeringConfig,
    catalog: Arc<dyn Catalog>,
) -> Result<SharedSteeringTargetStore, SteeringServerError> {
    let store = match config.store.store_type {
        StoreType::Memory => {
            SharedSteeringTargetStore::from_store(InMemorySteeringTargetStore::new(catalog))
        }
        StoreType::Sqlite => {
            let sqlite_config = config.store.sqlite_config().ok_or_else(|| {
                SteeringServerError::Config("sqlite store requires path".to_string())
            })?;
            let store = SqliteSteeringTargetStore::new(sqlite_config, catalog)
                .map_err(|err| SteeringServerError::Init(err.to_string()))?;
            SharedSteeringTargetStore::from_store(store)
        }
    };
    Ok(store)
}

/// Warns on stderr when serving without explicit authentication.
fn emit_local_only_warning(server: &ServerConfig) {
    if server.auth.mode == ServerAuthMode::LocalOnly {
        let _ = writeln!(
            io::stderr().lock(),
            "steering: WARNING: server running in local-only mode without explicit auth; \
             configure server.auth to enable bearer_token"
        );
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server assembly and transport errors.
#[derive(Debug, Error)]
pub enum SteeringServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization failures.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
