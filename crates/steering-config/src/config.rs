// crates/steering-config/src/config.rs
// ============================================================================
// Module: Steering Configuration
// Description: Configuration loading and validation for the steering service.
// Purpose: Provide strict, fail-closed config parsing with size limits.
// Dependencies: steering-core, steering-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Loads `steering.toml` from an explicit path, the `STEERING_CONFIG`
//! environment variable, or the working directory, in that order. Every
//! section validates itself after parsing; the first violation aborts the
//! load with [`ConfigError::Invalid`].
//!
//! The `[catalog]` section seeds the reference catalog of delivery services
//! and types that steering edges point at.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use steering_core::CatalogError;
use steering_core::DeliveryServiceId;
use steering_core::DeliveryServiceRecord;
use steering_core::InMemoryCatalog;
use steering_core::PrincipalRole;
use steering_core::TypeId;
use steering_core::TypeName;
use steering_core::TypeRecord;
use steering_core::XmlId;
use steering_store_sqlite::SqliteStoreConfig;
use steering_store_sqlite::SqliteStoreMode;
use steering_store_sqlite::SqliteSyncMode;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "steering.toml";
/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "STEERING_CONFIG";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured principals.
pub const MAX_AUTH_PRINCIPALS: usize = 64;
/// Maximum length of a bearer token.
pub const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Maximum length of a principal name.
pub const MAX_PRINCIPAL_NAME_LENGTH: usize = 128;
/// Maximum length of an XML ID or type name in the catalog section.
pub const MAX_CATALOG_NAME_LENGTH: usize = 256;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8443";
/// Default request body limit in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Default `SQLite` busy timeout in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Top-Level Config
// ============================================================================

/// Steering service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SteeringConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Steering target store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Reference catalog seed.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl SteeringConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds limits,
    /// fails to parse, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.catalog.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Inbound authentication settings.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit logging settings.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        let addr = self.bind_addr()?;
        if !addr.ip().is_loopback() && self.auth.mode == ServerAuthMode::LocalOnly {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without bearer_token auth".to_string(),
            ));
        }
        self.auth.validate()
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Inbound authentication mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Loopback peers only, treated as the `loopback` admin principal.
    #[default]
    LocalOnly,
    /// Bearer token matched against configured principals.
    BearerToken,
}

impl ServerAuthMode {
    /// Returns the stable label for the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalOnly => "local_only",
            Self::BearerToken => "bearer_token",
        }
    }
}

/// Inbound authentication configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAuthConfig {
    /// Authentication mode.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Principals accepted in bearer token mode.
    #[serde(default)]
    pub principals: Vec<PrincipalConfig>,
}

impl ServerAuthConfig {
    /// Validates authentication settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.principals.len() > MAX_AUTH_PRINCIPALS {
            return Err(ConfigError::Invalid("too many auth principals".to_string()));
        }
        match self.mode {
            ServerAuthMode::LocalOnly => {
                if !self.principals.is_empty() {
                    return Err(ConfigError::Invalid(
                        "local_only auth must not set principals".to_string(),
                    ));
                }
            }
            ServerAuthMode::BearerToken => {
                if self.principals.is_empty() {
                    return Err(ConfigError::Invalid(
                        "bearer_token auth requires principals".to_string(),
                    ));
                }
            }
        }
        let mut tokens = BTreeSet::new();
        let mut names = BTreeSet::new();
        for principal in &self.principals {
            principal.validate()?;
            if !tokens.insert(principal.token.as_str()) {
                return Err(ConfigError::Invalid("auth tokens must be unique".to_string()));
            }
            if !names.insert(principal.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate principal name: {}",
                    principal.name
                )));
            }
        }
        Ok(())
    }
}

/// A principal accepted by bearer token auth.
#[derive(Debug, Clone, Deserialize)]
pub struct PrincipalConfig {
    /// Subject name recorded in audit events.
    pub name: String,
    /// Bearer token presented by the principal.
    pub token: String,
    /// Granted role.
    pub role: PrincipalRole,
    /// Delivery service XML IDs a `steering` principal may mutate.
    #[serde(default)]
    pub delivery_services: Vec<String>,
}

impl PrincipalConfig {
    /// Returns the assigned delivery services as XML IDs.
    #[must_use]
    pub fn assigned_delivery_services(&self) -> Vec<XmlId> {
        self.delivery_services.iter().map(|xml_id| XmlId::new(xml_id.trim())).collect()
    }

    /// Validates a single principal entry.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Invalid("principal name must be non-empty".to_string()));
        }
        if name.len() > MAX_PRINCIPAL_NAME_LENGTH {
            return Err(ConfigError::Invalid("principal name too long".to_string()));
        }
        let token = self.token.trim();
        if token.is_empty() {
            return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
        }
        if token.len() > MAX_AUTH_TOKEN_LENGTH {
            return Err(ConfigError::Invalid("auth token too long".to_string()));
        }
        if token.len() != self.token.len() || token.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid("auth token must not contain whitespace".to_string()));
        }
        match self.role {
            PrincipalRole::Steering => {
                if self.delivery_services.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "steering principal {name} must list delivery_services"
                    )));
                }
            }
            PrincipalRole::Admin | PrincipalRole::Operations | PrincipalRole::ReadOnly => {
                if !self.delivery_services.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "delivery_services only applies to steering principals ({name})"
                    )));
                }
            }
        }
        for xml_id in &self.delivery_services {
            validate_name("principal delivery_services entry", xml_id)?;
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enables JSON-line audit events on stderr.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
        }
    }
}

/// Audit is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Steering target store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Process-local store; contents are lost on restart.
    #[default]
    Memory,
    /// Durable `SQLite` store.
    Sqlite,
}

/// Steering target store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// Database path for the `SQLite` backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::Memory,
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` store configuration, if the backend is `SQLite`.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match (self.store_type, &self.path) {
            (StoreType::Sqlite, Some(path)) => Some(SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
            _ => None,
        }
    }

    /// Validates store settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid("memory store must not set path".to_string()));
                }
            }
            StoreType::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite store requires path".to_string()))?;
                validate_path_string("store.path", &path.to_string_lossy())?;
            }
        }
        Ok(())
    }
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Reference catalog seed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Type rows.
    #[serde(default)]
    pub types: Vec<TypeConfig>,
    /// Delivery service rows.
    #[serde(default)]
    pub delivery_services: Vec<DeliveryServiceConfig>,
}

/// A catalog type row.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeConfig {
    /// Type id.
    pub id: u64,
    /// Type name, for example `STEERING_ORDER`.
    pub name: String,
    /// Table the type applies to, for example `steering_target`.
    pub use_in_table: String,
}

/// A catalog delivery service row.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryServiceConfig {
    /// Delivery service id.
    pub id: u64,
    /// Delivery service XML ID.
    pub xml_id: String,
    /// Delivery service type name, for example `STEERING` or `HTTP`.
    pub kind: String,
}

impl CatalogConfig {
    /// Builds an in-memory catalog from the configured rows.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the rows are invalid or the catalog
    /// cannot be populated.
    pub fn build_catalog(&self) -> Result<InMemoryCatalog, ConfigError> {
        self.validate()?;
        let delivery_services = self.delivery_services.iter().map(|ds| DeliveryServiceRecord {
            id: DeliveryServiceId::new(ds.id),
            xml_id: XmlId::new(ds.xml_id.trim()),
            kind: ds.kind.trim().to_string(),
        });
        let types = self.types.iter().map(|ty| TypeRecord {
            id: TypeId::new(ty.id),
            name: TypeName::new(ty.name.trim()),
            use_in_table: ty.use_in_table.trim().to_string(),
        });
        InMemoryCatalog::with_records(delivery_services, types)
            .map_err(|err: CatalogError| ConfigError::Invalid(err.to_string()))
    }

    /// Validates catalog rows.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut type_ids = BTreeSet::new();
        for ty in &self.types {
            if !type_ids.insert(ty.id) {
                return Err(ConfigError::Invalid(format!("duplicate catalog type id: {}", ty.id)));
            }
            validate_name("catalog type name", &ty.name)?;
            validate_name("catalog type use_in_table", &ty.use_in_table)?;
        }
        let mut ds_ids = BTreeSet::new();
        let mut xml_ids = BTreeSet::new();
        for ds in &self.delivery_services {
            if !ds_ids.insert(ds.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate catalog delivery service id: {}",
                    ds.id
                )));
            }
            validate_name("catalog delivery service xml_id", &ds.xml_id)?;
            validate_name("catalog delivery service kind", &ds.kind)?;
            if !xml_ids.insert(ds.xml_id.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate catalog delivery service xml_id: {}",
                    ds.xml_id.trim()
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O error while reading config.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit path, the env var, or the default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a catalog or assignment name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_CATALOG_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} too long")));
    }
    Ok(())
}
