// crates/steering-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Steering Target Store
// Description: Durable SteeringTargetStore backed by SQLite.
// Purpose: Persist steering target edges with transactional mutations.
// Dependencies: steering-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`SteeringTargetStore`] using `SQLite`.
//! Edges live in a single `steering_targets` table keyed by
//! `(deliveryservice, target)`. The connection is guarded by a mutex and every
//! mutation runs inside one transaction, so the existence check, the catalog
//! checks, and the write commit together or not at all. Rows are validated on
//! read and fail closed on out-of-range ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use steering_core::Catalog;
use steering_core::DeliveryServiceId;
use steering_core::ReferenceField;
use steering_core::SteeringTarget;
use steering_core::SteeringTargetKey;
use steering_core::SteeringTargetStore;
use steering_core::SteeringValue;
use steering_core::StoreError;
use steering_core::TypeId;
use steering_core::check_edge_references;
use steering_core::check_type_reference;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` steering target store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration with default pragmas for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored row is malformed.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::Invalid(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed steering target store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Referential checks run inside the mutation transaction.
#[derive(Clone)]
pub struct SqliteSteeringTargetStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
    /// Catalog used for referential checks.
    catalog: Arc<dyn Catalog>,
}

impl SqliteSteeringTargetStore {
    /// Opens an `SQLite`-backed steering target store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(
        config: SqliteStoreConfig,
        catalog: Arc<dyn Catalog>,
    ) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
            catalog,
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Runs a trivial query to confirm the database is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn readiness(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(())
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("sqlite connection mutex poisoned".to_string()))
    }
}

impl SteeringTargetStore for SqliteSteeringTargetStore {
    fn create(&self, edge: &SteeringTarget) -> Result<SteeringTarget, StoreError> {
        let key = edge.key();
        let (delivery_service, target, type_id) = match edge_params(edge) {
            Ok(params) => params,
            Err(err) => {
                check_edge_references(self.catalog.as_ref(), edge)?;
                return Err(err);
            }
        };
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if select_edge(&tx, delivery_service, target)?.is_some() {
            return Err(StoreError::Conflict(key));
        }
        check_edge_references(self.catalog.as_ref(), edge)?;
        let inserted = tx.execute(
            "INSERT INTO steering_targets (deliveryservice, target, type, value, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![delivery_service, target, type_id, edge.value.get(), unix_millis()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::Conflict(key));
            }
            Err(err) => return Err(SqliteStoreError::Db(err.to_string()).into()),
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(edge.clone())
    }

    fn list(
        &self,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<Vec<SteeringTarget>, StoreError> {
        let Ok(delivery_service) = i64::try_from(delivery_service_id.get()) else {
            return Ok(Vec::new());
        };
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT deliveryservice, target, type, value FROM steering_targets
                 WHERE deliveryservice = ?1 ORDER BY value ASC, target ASC",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![delivery_service], read_row)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut edges = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            edges.push(raw.into_edge()?);
        }
        Ok(edges)
    }

    fn get(&self, key: SteeringTargetKey) -> Result<Option<SteeringTarget>, StoreError> {
        let Ok((delivery_service, target)) = key_params(key) else {
            return Ok(None);
        };
        let guard = self.lock()?;
        let raw = select_edge(&guard, delivery_service, target)?;
        drop(guard);
        Ok(raw.map(RawEdge::into_edge).transpose()?)
    }

    fn update(
        &self,
        key: SteeringTargetKey,
        type_id: TypeId,
        value: SteeringValue,
    ) -> Result<SteeringTarget, StoreError> {
        let Ok((delivery_service, target)) = key_params(key) else {
            return Err(StoreError::NotFound(key));
        };
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if select_edge(&tx, delivery_service, target)?.is_none() {
            return Err(StoreError::NotFound(key));
        }
        check_type_reference(self.catalog.as_ref(), type_id)?;
        let type_param = id_param(type_id.get(), ReferenceField::Type)?;
        tx.execute(
            "UPDATE steering_targets SET type = ?3, value = ?4, last_updated = ?5
             WHERE deliveryservice = ?1 AND target = ?2",
            params![delivery_service, target, type_param, value.get(), unix_millis()],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(SteeringTarget {
            delivery_service_id: key.delivery_service_id,
            target_id: key.target_id,
            type_id,
            value,
        })
    }

    fn delete(&self, key: SteeringTargetKey) -> Result<SteeringTarget, StoreError> {
        let Ok((delivery_service, target)) = key_params(key) else {
            return Err(StoreError::NotFound(key));
        };
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some(raw) = select_edge(&tx, delivery_service, target)? else {
            return Err(StoreError::NotFound(key));
        };
        let removed = raw.into_edge()?;
        tx.execute(
            "DELETE FROM steering_targets WHERE deliveryservice = ?1 AND target = ?2",
            params![delivery_service, target],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(removed)
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Row as stored, before id range checks.
struct RawEdge {
    /// `deliveryservice` column.
    delivery_service: i64,
    /// `target` column.
    target: i64,
    /// `type` column.
    type_id: i64,
    /// `value` column.
    value: i64,
}

impl RawEdge {
    /// Converts a stored row into an edge, rejecting negative ids.
    fn into_edge(self) -> Result<SteeringTarget, SqliteStoreError> {
        Ok(SteeringTarget {
            delivery_service_id: DeliveryServiceId::new(stored_id(
                self.delivery_service,
                "deliveryservice",
            )?),
            target_id: DeliveryServiceId::new(stored_id(self.target, "target")?),
            type_id: TypeId::new(stored_id(self.type_id, "type")?),
            value: SteeringValue::new(self.value),
        })
    }
}

/// Maps a `steering_targets` row.
fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEdge> {
    Ok(RawEdge {
        delivery_service: row.get(0)?,
        target: row.get(1)?,
        type_id: row.get(2)?,
        value: row.get(3)?,
    })
}

/// Loads one row by key.
fn select_edge(
    connection: &Connection,
    delivery_service: i64,
    target: i64,
) -> Result<Option<RawEdge>, SqliteStoreError> {
    connection
        .query_row(
            "SELECT deliveryservice, target, type, value FROM steering_targets
             WHERE deliveryservice = ?1 AND target = ?2",
            params![delivery_service, target],
            read_row,
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Converts a key into `SQLite` integer parameters.
fn key_params(key: SteeringTargetKey) -> Result<(i64, i64), StoreError> {
    Ok((
        id_param(key.delivery_service_id.get(), ReferenceField::DeliveryService)?,
        id_param(key.target_id.get(), ReferenceField::Target)?,
    ))
}

/// Converts every id of an edge into `SQLite` integer parameters.
fn edge_params(edge: &SteeringTarget) -> Result<(i64, i64, i64), StoreError> {
    let (delivery_service, target) = key_params(edge.key())?;
    Ok((delivery_service, target, id_param(edge.type_id.get(), ReferenceField::Type)?))
}

/// Converts an id into an `SQLite` integer.
///
/// Ids above `i64::MAX` cannot be stored and are reported as invalid
/// references to the field they came from.
fn id_param(id: u64, field: ReferenceField) -> Result<i64, StoreError> {
    i64::try_from(id).map_err(|_| StoreError::InvalidReference {
        field,
        id,
        reason: format!("{} id exceeds the storable range", field.as_str()),
    })
}

/// Converts a stored integer back into an id.
fn stored_id(raw: i64, column: &str) -> Result<u64, SqliteStoreError> {
    u64::try_from(raw).map_err(|_| SqliteStoreError::Corrupt(format!("negative {column} id {raw}")))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS steering_targets (
                    deliveryservice INTEGER NOT NULL,
                    target INTEGER NOT NULL,
                    type INTEGER NOT NULL,
                    value INTEGER NOT NULL,
                    last_updated INTEGER NOT NULL,
                    PRIMARY KEY (deliveryservice, target)
                );
                CREATE INDEX IF NOT EXISTS idx_steering_targets_listing
                    ON steering_targets (deliveryservice, value, target);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Returns the current time in unix milliseconds.
fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}
