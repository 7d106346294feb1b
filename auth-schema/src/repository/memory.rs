use super::snapshot::MemoryDatabase;
use super::{ensure_active, SchemaReader, SchemaWriter};
use crate::{
    compiler::DefinitionCompiler,
    error::{Result, SchemaError},
    models::{SchemaConstruct, SchemaDefinitionRow, SchemaListEntry},
    pagination::{ContinuationToken, EncodedContinuationToken, Pagination},
    schema::{EntityDefinition, RuleDefinition, SchemaCompiler, SchemaDefinition},
    version::creation_time,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// In-memory schema store with snapshot-isolated reads.
///
/// Rows and the per-tenant head version live in one copy-on-write snapshot, so a
/// reader that sees a new head always sees that version's rows.
pub struct MemorySchemaStore {
    db: MemoryDatabase,
    compiler: Arc<dyn SchemaCompiler>,
}

impl MemorySchemaStore {
    pub fn new(compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            db: MemoryDatabase::new(),
            compiler,
        }
    }

    /// Store compiling with the lenient [`DefinitionCompiler`].
    pub fn with_default_compiler() -> Self {
        Self::new(Arc::new(DefinitionCompiler::new()))
    }

    /// Compile a single row in isolation.
    fn compile_row(&self, row: &SchemaDefinitionRow) -> Result<SchemaDefinition> {
        Ok(self
            .compiler
            .compile(std::slice::from_ref(&row.serialized_definition))?)
    }
}

impl Default for MemorySchemaStore {
    fn default() -> Self {
        Self::with_default_compiler()
    }
}

fn validate_constructs(constructs: &[SchemaConstruct]) -> Result<()> {
    if constructs.is_empty() {
        return Err(SchemaError::InvalidArgument(
            "a schema version needs at least one construct".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for construct in constructs {
        if construct.name.is_empty() {
            return Err(SchemaError::InvalidArgument(
                "construct name must not be empty".to_string(),
            ));
        }
        if !seen.insert(construct.name.as_str()) {
            return Err(SchemaError::InvalidArgument(format!(
                "construct '{}' appears more than once",
                construct.name
            )));
        }
    }
    Ok(())
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SchemaError::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(())
}

#[async_trait]
impl SchemaWriter for MemorySchemaStore {
    async fn write_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: &str,
        constructs: Vec<SchemaConstruct>,
    ) -> Result<()> {
        ensure_active(cancel)?;
        require(tenant_id, "tenant id")?;
        require(version, "version")?;
        validate_constructs(&constructs)?;

        let mut txn = self.db.write();

        if txn.has_version(tenant_id, version) {
            warn!(tenant_id, version, "rejected write of existing schema version");
            return Err(SchemaError::Conflict {
                tenant_id: tenant_id.to_string(),
                version: version.to_string(),
            });
        }
        if let Some(head) = txn.head(tenant_id) {
            if version <= head.as_str() {
                warn!(tenant_id, version, head = %head, "rejected write older than head");
                return Err(SchemaError::StaleVersion {
                    tenant_id: tenant_id.to_string(),
                    version: version.to_string(),
                    head: head.clone(),
                });
            }
        }

        let count = constructs.len();
        for construct in constructs {
            txn.insert(SchemaDefinitionRow::new(tenant_id, version, construct));
        }
        txn.set_head(tenant_id, version);
        txn.commit();

        info!(tenant_id, version, constructs = count, "schema version committed");
        Ok(())
    }
}

#[async_trait]
impl SchemaReader for MemorySchemaStore {
    async fn read_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: &str,
    ) -> Result<SchemaDefinition> {
        ensure_active(cancel)?;

        let txn = self.db.read();
        let definitions: Vec<String> = txn
            .rows_for_version(tenant_id, version)
            .map(|row| row.serialized_definition.clone())
            .collect();
        if definitions.is_empty() {
            debug!(tenant_id, version, "no rows for schema version");
            return Err(SchemaError::not_found(tenant_id, Some(version), None));
        }

        debug!(tenant_id, version, rows = definitions.len(), "compiling schema version");
        Ok(self.compiler.compile(&definitions)?)
    }

    async fn read_entity_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: &str,
    ) -> Result<(EntityDefinition, String)> {
        ensure_active(cancel)?;

        let txn = self.db.read();
        let row = txn
            .get(tenant_id, name, version)
            .ok_or_else(|| SchemaError::not_found(tenant_id, Some(version), Some(name)))?;

        let mut schema = self.compile_row(row)?;
        match schema.entity_definitions.remove(name) {
            Some(entity) => Ok((entity, row.version.clone())),
            None if schema.rule_definitions.contains_key(name) => Err(SchemaError::TypeMismatch {
                expected: "entity".to_string(),
                found: "rule".to_string(),
            }),
            None => Err(SchemaError::Execution(format!(
                "row {} does not define '{}'",
                row, name
            ))),
        }
    }

    async fn read_rule_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: &str,
    ) -> Result<(RuleDefinition, String)> {
        ensure_active(cancel)?;

        let txn = self.db.read();
        let row = txn
            .get(tenant_id, name, version)
            .ok_or_else(|| SchemaError::not_found(tenant_id, Some(version), Some(name)))?;

        let mut schema = self.compile_row(row)?;
        match schema.rule_definitions.remove(name) {
            Some(rule) => Ok((rule, row.version.clone())),
            None if schema.entity_definitions.contains_key(name) => {
                Err(SchemaError::TypeMismatch {
                    expected: "rule".to_string(),
                    found: "entity".to_string(),
                })
            }
            None => Err(SchemaError::Execution(format!(
                "row {} does not define '{}'",
                row, name
            ))),
        }
    }

    async fn head_version(&self, cancel: &CancellationToken, tenant_id: &str) -> Result<String> {
        ensure_active(cancel)?;
        self.db
            .read()
            .head(tenant_id)
            .cloned()
            .ok_or_else(|| SchemaError::not_found(tenant_id, None, None))
    }

    async fn list_schemas(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        pagination: &Pagination,
    ) -> Result<(Vec<SchemaListEntry>, EncodedContinuationToken)> {
        ensure_active(cancel)?;

        let page_size = pagination.page_size() as usize;
        if page_size == 0 {
            return Err(SchemaError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }

        let token = pagination.token().decode().map_err(|e| {
            warn!(tenant_id, error = %e, "undecodable continuation token");
            e
        })?;
        let position = token.position_for(tenant_id).map_err(|e| {
            warn!(tenant_id, error = %e, "continuation token rejected");
            e
        })?;

        let txn = self.db.read();
        let from = position.map(|p| (p.version.as_str(), p.name.as_str()));
        let mut entries: Vec<SchemaListEntry> = Vec::with_capacity(page_size);

        for row in txn.scan_versions(tenant_id, from) {
            if entries.last().is_some_and(|last| last.version == row.version) {
                continue;
            }
            if entries.len() == page_size {
                let next = ContinuationToken::at(tenant_id, &row.version, &row.name).encode()?;
                debug!(tenant_id, returned = entries.len(), "schema listing page full");
                return Ok((entries, next));
            }
            entries.push(SchemaListEntry {
                version: row.version.clone(),
                created_at: creation_time(&row.version)?,
            });
        }

        debug!(tenant_id, returned = entries.len(), "schema listing exhausted");
        Ok((entries, EncodedContinuationToken::noop()))
    }
}
