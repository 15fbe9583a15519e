// crates/steering-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Steering Target Store
// Description: Steering target store held in memory with per-key locking.
// Purpose: Provide a concurrent store for tests, demos, and memory deployments.
// Dependencies: crate::core, crate::interfaces, crate::runtime::integrity
// ============================================================================

//! ## Overview
//! [`InMemorySteeringTargetStore`] keeps edges in an ordered map behind a
//! read/write lock. Mutations first take a per-key mutex from [`KeyedLocks`]
//! so that a create, update, or delete on one key pair never interleaves with
//! another mutation on the same pair, while mutations on other pairs and all
//! reads proceed. Reads clone a snapshot under the read lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

use crate::core::DeliveryServiceId;
use crate::core::SteeringTarget;
use crate::core::SteeringTargetKey;
use crate::core::SteeringValue;
use crate::core::TypeId;
use crate::core::sort_for_listing;
use crate::interfaces::Catalog;
use crate::interfaces::SteeringTargetStore;
use crate::interfaces::StoreError;
use crate::runtime::integrity::check_edge_references;
use crate::runtime::integrity::check_type_reference;

// ============================================================================
// SECTION: Keyed Locks
// ============================================================================

/// Table of per-key mutexes, reclaimed once no caller holds them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    /// Live key slots.
    slots: Mutex<HashMap<SteeringTargetKey, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the mutex for `key`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or [`StoreError::Store`] when a lock
    /// is poisoned.
    pub fn with_key<T>(
        &self,
        key: SteeringTargetKey,
        f: impl FnOnce() -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| StoreError::Store("key lock table poisoned".to_string()))?;
            Arc::clone(slots.entry(key).or_default())
        };
        let result = {
            let held = slot
                .lock()
                .map_err(|_| StoreError::Store(format!("key lock poisoned: {key}")));
            match held {
                Ok(guard) => {
                    let result = f();
                    drop(guard);
                    result
                }
                Err(err) => Err(err),
            }
        };
        self.release(key, &slot)?;
        result
    }

    /// Drops the slot for `key` when the caller is its last user.
    fn release(&self, key: SteeringTargetKey, slot: &Arc<Mutex<()>>) -> Result<(), StoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StoreError::Store("key lock table poisoned".to_string()))?;
        // One reference is held by the table, one by the caller.
        if Arc::strong_count(slot) <= 2 {
            slots.remove(&key);
        }
        drop(slots);
        Ok(())
    }

    /// Returns the number of keys with a live slot.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots.lock().map_or(0, |slots| slots.len())
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory steering target store.
#[derive(Clone)]
pub struct InMemorySteeringTargetStore {
    /// Catalog used for referential checks.
    catalog: Arc<dyn Catalog>,
    /// Edges keyed by `(delivery service, target)`.
    edges: Arc<RwLock<BTreeMap<SteeringTargetKey, SteeringTarget>>>,
    /// Per-key mutation locks.
    locks: Arc<KeyedLocks>,
}

impl InMemorySteeringTargetStore {
    /// Creates an empty store checking references against `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            edges: Arc::new(RwLock::new(BTreeMap::new())),
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Returns the number of keys currently holding a mutation lock slot.
    #[must_use]
    pub fn active_key_locks(&self) -> usize {
        self.locks.active_keys()
    }

    /// Loads an edge under the read lock.
    fn load(&self, key: SteeringTargetKey) -> Result<Option<SteeringTarget>, StoreError> {
        let guard = self
            .edges
            .read()
            .map_err(|_| StoreError::Store("steering target store lock poisoned".to_string()))?;
        Ok(guard.get(&key).cloned())
    }
}

impl SteeringTargetStore for InMemorySteeringTargetStore {
    fn create(&self, edge: &SteeringTarget) -> Result<SteeringTarget, StoreError> {
        let key = edge.key();
        self.locks.with_key(key, || {
            if self.load(key)?.is_some() {
                return Err(StoreError::Conflict(key));
            }
            check_edge_references(self.catalog.as_ref(), edge)?;
            self.edges
                .write()
                .map_err(|_| StoreError::Store("steering target store lock poisoned".to_string()))?
                .insert(key, edge.clone());
            Ok(edge.clone())
        })
    }

    fn list(
        &self,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<Vec<SteeringTarget>, StoreError> {
        let start = SteeringTargetKey::new(delivery_service_id, DeliveryServiceId::new(0));
        let end = SteeringTargetKey::new(delivery_service_id, DeliveryServiceId::new(u64::MAX));
        let mut edges: Vec<SteeringTarget> = {
            let guard = self.edges.read().map_err(|_| {
                StoreError::Store("steering target store lock poisoned".to_string())
            })?;
            guard.range(start..=end).map(|(_, edge)| edge.clone()).collect()
        };
        sort_for_listing(&mut edges);
        Ok(edges)
    }

    fn get(&self, key: SteeringTargetKey) -> Result<Option<SteeringTarget>, StoreError> {
        self.load(key)
    }

    fn update(
        &self,
        key: SteeringTargetKey,
        type_id: TypeId,
        value: SteeringValue,
    ) -> Result<SteeringTarget, StoreError> {
        self.locks.with_key(key, || {
            if self.load(key)?.is_none() {
                return Err(StoreError::NotFound(key));
            }
            check_type_reference(self.catalog.as_ref(), type_id)?;
            let mut guard = self.edges.write().map_err(|_| {
                StoreError::Store("steering target store lock poisoned".to_string())
            })?;
            let edge = guard.get_mut(&key).ok_or(StoreError::NotFound(key))?;
            edge.type_id = type_id;
            edge.value = value;
            let updated = edge.clone();
            drop(guard);
            Ok(updated)
        })
    }

    fn delete(&self, key: SteeringTargetKey) -> Result<SteeringTarget, StoreError> {
        self.locks.with_key(key, || {
            self.edges
                .write()
                .map_err(|_| StoreError::Store("steering target store lock poisoned".to_string()))?
                .remove(&key)
                .ok_or(StoreError::NotFound(key))
        })
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared steering target store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedSteeringTargetStore {
    /// Inner store implementation.
    inner: Arc<dyn SteeringTargetStore + Send + Sync>,
}

impl SharedSteeringTargetStore {
    /// Wraps a store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl SteeringTargetStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn SteeringTargetStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl SteeringTargetStore for SharedSteeringTargetStore {
    fn create(&self, edge: &SteeringTarget) -> Result<SteeringTarget, StoreError> {
        self.inner.create(edge)
    }

    fn list(
        &self,
        delivery_service_id: DeliveryServiceId,
    ) -> Result<Vec<SteeringTarget>, StoreError> {
        self.inner.list(delivery_service_id)
    }

    fn get(&self, key: SteeringTargetKey) -> Result<Option<SteeringTarget>, StoreError> {
        self.inner.get(key)
    }

    fn update(
        &self,
        key: SteeringTargetKey,
        type_id: TypeId,
        value: SteeringValue,
    ) -> Result<SteeringTarget, StoreError> {
        self.inner.update(key, type_id, value)
    }

    fn delete(&self, key: SteeringTargetKey) -> Result<SteeringTarget, StoreError> {
        self.inner.delete(key)
    }
}
