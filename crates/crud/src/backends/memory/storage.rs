//! In-memory store.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::core::{BackendCapability, BackendKind, Entity, Reflect, StoreBackend};
use crate::error::{
    BackendError, ConnectionError, ResourceError, StorageResult, ValidationError,
};
use crate::named::RawStatement;
use crate::types::QueryModel;

use super::eval::{self, Matcher};

const BACKEND_NAME: &str = "memory";

/// A stored entity with its concrete type erased.
trait StoredRow: Send + Sync {
    fn as_reflect(&self) -> &dyn Reflect;
    fn as_any(&self) -> &dyn Any;
    fn row_key(&self) -> Option<Value>;
}

impl<T: Entity> StoredRow for T {
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn row_key(&self) -> Option<Value> {
        self.key()
    }
}

type Table = Vec<Box<dyn StoredRow>>;

/// How missing keys are generated on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// 1, 2, 3, ... shared across all tables.
    #[default]
    Sequential,
    /// Random UUID v4 strings.
    Uuid,
}

/// Configuration for the in-memory backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBackendConfig {
    /// Capabilities the backend advertises.
    #[serde(default = "default_capabilities")]
    pub capabilities: HashSet<BackendCapability>,

    /// Key generation for entities saved without a key.
    #[serde(default)]
    pub key_strategy: KeyStrategy,
}

fn default_capabilities() -> HashSet<BackendCapability> {
    BackendCapability::ALL.into_iter().collect()
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            capabilities: default_capabilities(),
            key_strategy: KeyStrategy::default(),
        }
    }
}

impl MemoryBackendConfig {
    /// Advertises every capability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises no optional capability.
    pub fn minimal() -> Self {
        Self {
            capabilities: HashSet::new(),
            ..Self::default()
        }
    }

    /// Replaces the advertised capabilities.
    pub fn with_capabilities(
        mut self,
        capabilities: impl IntoIterator<Item = BackendCapability>,
    ) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Stops advertising one capability.
    pub fn without(mut self, capability: BackendCapability) -> Self {
        self.capabilities.remove(&capability);
        self
    }

    /// Sets the key strategy.
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }
}

/// Calls received by a [`MemoryBackend`], per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// `perform_save` calls.
    pub save: usize,
    /// `perform_save_batch` calls.
    pub save_batch: usize,
    /// `perform_update` calls.
    pub update: usize,
    /// `perform_update_batch` calls.
    pub update_batch: usize,
    /// `perform_delete` calls.
    pub delete: usize,
    /// `perform_delete_batch` calls.
    pub delete_batch: usize,
    /// `perform_list` calls.
    pub list: usize,
    /// `perform_count` calls.
    pub count: usize,
    /// `perform_delete_query` calls.
    pub delete_query: usize,
    /// `perform_statement` calls.
    pub statement: usize,
}

/// A process-local, non-durable [`StoreBackend`].
///
/// Rows are kept per entity type name behind a `parking_lot::RwLock`.
/// Filters are evaluated through [`Reflect`], so any [`Entity`] can be stored
/// without further setup. Native batch operations are all-or-nothing: the
/// whole collection is validated before anything is written.
///
/// Raw statements are not interpreted; they are recorded (see
/// [`executed_statements`](Self::executed_statements)) and report 0 affected
/// rows.
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
    config: MemoryBackendConfig,
    connected: AtomicBool,
    next_key: AtomicU64,
    stats: Mutex<OperationStats>,
    statements: Mutex<Vec<RawStatement>>,
}

impl Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables: HashMap<String, usize> = self
            .tables
            .read()
            .iter()
            .map(|(name, rows)| (name.clone(), rows.len()))
            .collect();
        f.debug_struct("MemoryBackend")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .field("tables", &tables)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty backend advertising every capability.
    pub fn new() -> Self {
        Self::with_config(MemoryBackendConfig::default())
    }

    /// Creates an empty backend with a custom configuration.
    pub fn with_config(config: MemoryBackendConfig) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            config,
            connected: AtomicBool::new(true),
            next_key: AtomicU64::new(1),
            stats: Mutex::new(OperationStats::default()),
            statements: Mutex::new(Vec::new()),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &MemoryBackendConfig {
        &self.config
    }

    /// Marks the connection usable again.
    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Marks the connection closed; every operation then fails.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Snapshot of the per-operation call counters.
    pub fn stats(&self) -> OperationStats {
        *self.stats.lock()
    }

    /// Resets the call counters.
    pub fn reset_stats(&self) {
        *self.stats.lock() = OperationStats::default();
    }

    /// Raw statements received so far, in order.
    pub fn executed_statements(&self) -> Vec<RawStatement> {
        self.statements.lock().clone()
    }

    /// Number of stored entities of type `T`.
    pub fn len_of<T: Entity>(&self) -> usize {
        self.tables
            .read()
            .get(T::metadata().name())
            .map_or(0, Vec::len)
    }

    /// Removes every stored entity.
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    fn record(&self, f: impl FnOnce(&mut OperationStats)) {
        f(&mut *self.stats.lock());
    }

    fn check_connected(&self, operation: &str) -> StorageResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        Err(ConnectionError::Closed {
            backend_name: BACKEND_NAME.to_string(),
            operation: operation.to_string(),
        }
        .into())
    }

    fn generate_key(&self) -> Value {
        match self.config.key_strategy {
            KeyStrategy::Sequential => Value::from(self.next_key.fetch_add(1, Ordering::SeqCst)),
            KeyStrategy::Uuid => Value::String(Uuid::new_v4().to_string()),
        }
    }

    /// Assigns a key if needed and checks it is not taken.
    fn prepare_insert<T: Entity>(&self, table: &Table, staged: &[T], mut item: T) -> StorageResult<T> {
        let entity_type = T::metadata();
        let Some(key_field) = entity_type.key() else {
            return Ok(item);
        };

        let key = match item.key() {
            Some(key) => key,
            None => {
                let key = self.generate_key();
                item.set_field(key_field, key.clone())?;
                key
            }
        };

        let taken = table.iter().any(|row| row.row_key().as_ref() == Some(&key))
            || staged.iter().any(|other| other.key().as_ref() == Some(&key));
        if taken {
            return Err(ResourceError::AlreadyExists {
                entity_type: entity_type.name().to_string(),
                key: render_key(&key),
            }
            .into());
        }
        Ok(item)
    }

    /// Finds the row holding `item`'s key.
    fn position_of<T: Entity>(
        rows: &[Box<dyn StoredRow>],
        item: &T,
    ) -> StorageResult<Option<usize>> {
        let entity_type = T::metadata();
        if entity_type.key().is_none() {
            return Err(ValidationError::MissingKey {
                entity_type: entity_type.name().to_string(),
            }
            .into());
        }
        let Some(key) = item.key() else {
            return Ok(None);
        };
        Ok(rows
            .iter()
            .position(|row| row.row_key().as_ref() == Some(&key)))
    }

    fn not_found<T: Entity>(item: &T) -> ResourceError {
        ResourceError::NotFound {
            entity_type: T::metadata().name().to_string(),
            key: item.key().as_ref().map_or_else(|| "<none>".to_string(), render_key),
        }
    }

    fn insert_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let mut tables = self.tables.write();
        let table = tables.entry(T::metadata().name().to_string()).or_default();

        let mut staged = Vec::with_capacity(items.len());
        for item in items {
            let prepared = self.prepare_insert(table, &staged, item)?;
            staged.push(prepared);
        }
        table.extend(
            staged
                .iter()
                .cloned()
                .map(|item| Box::new(item) as Box<dyn StoredRow>),
        );
        Ok(staged)
    }

    fn replace_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(T::metadata().name());

        let mut positions = Vec::with_capacity(items.len());
        for item in &items {
            match Self::position_of(table.as_deref().map(Vec::as_slice).unwrap_or(&[]), item)? {
                Some(position) => positions.push(position),
                None => return Err(Self::not_found(item).into()),
            }
        }

        if let Some(table) = table {
            for (position, item) in positions.into_iter().zip(items.iter().cloned()) {
                table[position] = Box::new(item);
            }
        }
        Ok(items)
    }

    fn remove_all<T: Entity>(&self, items: &[T]) -> StorageResult<usize> {
        let mut tables = self.tables.write();
        let mut positions = Vec::with_capacity(items.len());
        {
            let rows = tables
                .get(T::metadata().name())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for item in items {
                if let Some(position) = Self::position_of(rows, item)? {
                    positions.push(position);
                }
            }
        }
        positions.sort_unstable();
        positions.dedup();

        let Some(table) = tables.get_mut(T::metadata().name()) else {
            return Ok(0);
        };
        for position in positions.iter().rev() {
            table.remove(*position);
        }
        Ok(positions.len())
    }

    fn matching<'t>(
        rows: &'t [Box<dyn StoredRow>],
        query: &QueryModel,
    ) -> StorageResult<Vec<&'t dyn StoredRow>> {
        let matcher = Matcher::new(query.filter())?;
        Ok(rows
            .iter()
            .filter(|row| matcher.matches(row.as_reflect()))
            .map(|row| &**row)
            .collect())
    }
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn supports(&self, capability: BackendCapability) -> bool {
        self.config.capabilities.contains(&capability)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn perform_save<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.check_connected("save")?;
        self.record(|s| s.save += 1);
        let mut saved = self.insert_all(vec![item])?;
        trace!(entity_type = T::metadata().name(), "saved entity");
        saved.pop().ok_or_else(|| BackendError::failed(BACKEND_NAME, "save", "nothing stored").into())
    }

    fn perform_update<T: Entity>(&self, item: T) -> StorageResult<T> {
        self.check_connected("update")?;
        self.record(|s| s.update += 1);
        let mut updated = self.replace_all(vec![item])?;
        updated
            .pop()
            .ok_or_else(|| BackendError::failed(BACKEND_NAME, "update", "nothing stored").into())
    }

    fn perform_delete<T: Entity>(&self, item: &T) -> StorageResult<usize> {
        self.check_connected("delete")?;
        self.record(|s| s.delete += 1);
        self.remove_all(std::slice::from_ref(item))
    }

    fn perform_list<T: Entity>(&self, query: &QueryModel) -> StorageResult<Vec<T>> {
        self.check_connected("list")?;
        self.record(|s| s.list += 1);

        let tables = self.tables.read();
        let Some(rows) = tables.get(T::metadata().name()) else {
            return Ok(Vec::new());
        };
        let mut hits = Self::matching(rows, query)?;
        if !query.order_by().is_empty() {
            hits.sort_by(|a, b| eval::compare_rows(a.as_reflect(), b.as_reflect(), query.order_by()));
        }

        let offset = query.offset().unwrap_or(0);
        let limit = query.limit().unwrap_or(usize::MAX);
        let mut out = Vec::new();
        for row in hits.into_iter().skip(offset).take(limit) {
            let item = row.as_any().downcast_ref::<T>().ok_or_else(|| {
                BackendError::failed(
                    BACKEND_NAME,
                    "list",
                    format!("stored row is not a {}", T::metadata().name()),
                )
            })?;
            out.push(item.clone());
        }
        debug!(
            entity_type = T::metadata().name(),
            returned = out.len(),
            "listed entities"
        );
        Ok(out)
    }

    fn perform_count(&self, query: &QueryModel) -> StorageResult<usize> {
        self.check_connected("count")?;
        self.record(|s| s.count += 1);
        let tables = self.tables.read();
        match tables.get(query.target_type()) {
            Some(rows) => Ok(Self::matching(rows, query)?.len()),
            None => Ok(0),
        }
    }

    fn perform_delete_query<T: Entity>(&self, query: &QueryModel) -> StorageResult<usize> {
        self.check_connected("delete")?;
        self.record(|s| s.delete_query += 1);

        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(T::metadata().name()) else {
            return Ok(0);
        };
        let matcher = Matcher::new(query.filter())?;
        let before = rows.len();
        rows.retain(|row| !matcher.matches(row.as_reflect()));
        Ok(before - rows.len())
    }

    fn perform_save_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.check_connected("save")?;
        self.record(|s| s.save_batch += 1);
        self.insert_all(items)
    }

    fn perform_update_batch<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        self.check_connected("update")?;
        self.record(|s| s.update_batch += 1);
        self.replace_all(items)
    }

    fn perform_delete_batch<T: Entity>(&self, items: &[T]) -> StorageResult<usize> {
        self.check_connected("delete")?;
        self.record(|s| s.delete_batch += 1);
        self.remove_all(items)
    }

    fn perform_statement(&self, statement: &RawStatement) -> StorageResult<usize> {
        self.check_connected("execute")?;
        self.record(|s| s.statement += 1);
        debug!(statement = %statement, "recorded raw statement");
        self.statements.lock().push(statement.clone());
        Ok(0)
    }
}
