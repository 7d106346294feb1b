//! Copy-on-write table set behind the in-memory store.
//!
//! The committed state is an `Arc<Tables>`. Readers clone the `Arc` and keep a frozen
//! view for as long as they like. The single writer clones the tables (cheap, the maps
//! are persistent), mutates the clone and swaps it in on commit. Dropping a write
//! transaction without committing discards it.

use crate::models::SchemaDefinitionRow;
use im::OrdMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;

/// `(tenant, name, version)`
type IdentityKey = (String, String, String);
/// `(tenant, version, name)`
type VersionKey = (String, String, String);

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    identity: OrdMap<IdentityKey, Arc<SchemaDefinitionRow>>,
    by_version: OrdMap<VersionKey, Arc<SchemaDefinitionRow>>,
    heads: OrdMap<String, String>,
}

impl Tables {
    fn get(&self, tenant_id: &str, name: &str, version: &str) -> Option<&Arc<SchemaDefinitionRow>> {
        self.identity
            .get(&(tenant_id.to_string(), name.to_string(), version.to_string()))
    }

    fn scan_from<'a>(
        &'a self,
        tenant_id: &'a str,
        version: &str,
        name: &str,
    ) -> impl Iterator<Item = &'a Arc<SchemaDefinitionRow>> + 'a {
        let start = (tenant_id.to_string(), version.to_string(), name.to_string());
        self.by_version
            .range(start..)
            .take_while(move |(key, _)| key.0 == tenant_id)
            .map(|(_, row)| row)
    }

    fn rows_for_version<'a>(
        &'a self,
        tenant_id: &'a str,
        version: &'a str,
    ) -> impl Iterator<Item = &'a Arc<SchemaDefinitionRow>> + 'a {
        self.scan_from(tenant_id, version, "")
            .take_while(move |row| row.version == version)
    }

    fn head(&self, tenant_id: &str) -> Option<&String> {
        self.heads.get(tenant_id)
    }
}

pub(crate) struct MemoryDatabase {
    committed: RwLock<Arc<Tables>>,
    writer: Mutex<()>,
}

impl MemoryDatabase {
    pub(crate) fn new() -> Self {
        Self {
            committed: RwLock::new(Arc::new(Tables::default())),
            writer: Mutex::new(()),
        }
    }

    pub(crate) fn read(&self) -> ReadTxn {
        ReadTxn {
            tables: self.committed.read().clone(),
        }
    }

    /// Start the write transaction, waiting for any other writer to finish.
    pub(crate) fn write(&self) -> WriteTxn<'_> {
        let guard = self.writer.lock();
        let tables = (**self.committed.read()).clone();
        WriteTxn {
            db: self,
            _guard: guard,
            tables,
        }
    }
}

/// Frozen view of the committed tables.
pub(crate) struct ReadTxn {
    tables: Arc<Tables>,
}

impl ReadTxn {
    pub(crate) fn get(
        &self,
        tenant_id: &str,
        name: &str,
        version: &str,
    ) -> Option<&Arc<SchemaDefinitionRow>> {
        self.tables.get(tenant_id, name, version)
    }

    pub(crate) fn rows_for_version<'a>(
        &'a self,
        tenant_id: &'a str,
        version: &'a str,
    ) -> impl Iterator<Item = &'a Arc<SchemaDefinitionRow>> + 'a {
        self.tables.rows_for_version(tenant_id, version)
    }

    /// Rows of one tenant in `(version, name)` order, starting at the given position.
    pub(crate) fn scan_versions<'a>(
        &'a self,
        tenant_id: &'a str,
        from: Option<(&str, &str)>,
    ) -> impl Iterator<Item = &'a Arc<SchemaDefinitionRow>> + 'a {
        let (version, name) = from.unwrap_or(("", ""));
        self.tables.scan_from(tenant_id, version, name)
    }

    pub(crate) fn head(&self, tenant_id: &str) -> Option<&String> {
        self.tables.head(tenant_id)
    }
}

/// Exclusive, uncommitted copy of the tables.
pub(crate) struct WriteTxn<'a> {
    db: &'a MemoryDatabase,
    _guard: MutexGuard<'a, ()>,
    tables: Tables,
}

impl<'a> WriteTxn<'a> {
    pub(crate) fn head(&self, tenant_id: &str) -> Option<&String> {
        self.tables.head(tenant_id)
    }

    pub(crate) fn has_version(&self, tenant_id: &str, version: &str) -> bool {
        self.tables.rows_for_version(tenant_id, version).next().is_some()
    }

    pub(crate) fn insert(&mut self, row: SchemaDefinitionRow) {
        let row = Arc::new(row);
        self.tables.identity.insert(
            (row.tenant_id.clone(), row.name.clone(), row.version.clone()),
            Arc::clone(&row),
        );
        self.tables.by_version.insert(
            (row.tenant_id.clone(), row.version.clone(), row.name.clone()),
            row,
        );
    }

    pub(crate) fn set_head(&mut self, tenant_id: &str, version: &str) {
        self.tables
            .heads
            .insert(tenant_id.to_string(), version.to_string());
    }

    /// Publish every change at once.
    pub(crate) fn commit(self) {
        let WriteTxn { db, _guard, tables } = self;
        *db.committed.write() = Arc::new(tables);
    }
}
