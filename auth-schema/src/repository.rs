use crate::{
    error::{Result, SchemaError},
    models::{SchemaConstruct, SchemaListEntry},
    pagination::{EncodedContinuationToken, Pagination},
    schema::{EntityDefinition, RuleDefinition, SchemaCompiler, SchemaDefinition},
};
use async_trait::async_trait;
use config_engine::{DatabaseEngine, StoreSettings};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod memory;
mod snapshot;

pub use memory::MemorySchemaStore;

/// Read side of the schema store.
///
/// Every call observes one consistent snapshot. Versions must be concrete: resolving
/// "latest" is done by the caller through [`head_version`](SchemaReader::head_version).
#[async_trait]
pub trait SchemaReader: Send + Sync {
    /// Compile every construct of `version`, in name order.
    async fn read_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: &str,
    ) -> Result<SchemaDefinition>;

    /// Point lookup of one entity construct. Only that construct's text is compiled.
    async fn read_entity_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: &str,
    ) -> Result<(EntityDefinition, String)>;

    /// Point lookup of one rule construct.
    async fn read_rule_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: &str,
    ) -> Result<(RuleDefinition, String)>;

    /// Most recently committed version of the tenant.
    async fn head_version(&self, cancel: &CancellationToken, tenant_id: &str) -> Result<String>;

    /// Distinct versions in creation order, one page at a time.
    async fn list_schemas(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        pagination: &Pagination,
    ) -> Result<(Vec<SchemaListEntry>, EncodedContinuationToken)>;
}

/// Write side of the schema store.
#[async_trait]
pub trait SchemaWriter: Send + Sync {
    /// Insert one row per construct for a new version and advance the head, atomically.
    async fn write_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: &str,
        constructs: Vec<SchemaConstruct>,
    ) -> Result<()>;
}

/// A complete store backend.
pub trait SchemaStore: SchemaReader + SchemaWriter {}

impl<T: SchemaReader + SchemaWriter> SchemaStore for T {}

/// Build the store selected by the settings.
pub fn build_store(
    settings: &StoreSettings,
    compiler: Arc<dyn SchemaCompiler>,
) -> Result<Arc<dyn SchemaStore>> {
    match settings.engine {
        DatabaseEngine::Memory => Ok(Arc::new(MemorySchemaStore::new(compiler))),
        engine => {
            tracing::error!(%engine, "requested storage engine is not built in");
            Err(SchemaError::UnsupportedEngine(engine))
        }
    }
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(SchemaError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DefinitionCompiler;

    #[tokio::test]
    async fn test_build_memory_store() {
        let settings = StoreSettings::default();
        let store = build_store(&settings, Arc::new(DefinitionCompiler::new())).unwrap();
        let cancel = CancellationToken::new();
        assert!(matches!(
            store.head_version(&cancel, "t1").await,
            Err(SchemaError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_sql_engines_are_rejected() {
        for engine in [DatabaseEngine::Postgres, DatabaseEngine::Mysql] {
            let settings = StoreSettings {
                engine,
                ..StoreSettings::default()
            };
            let result = build_store(&settings, Arc::new(DefinitionCompiler::new()));
            assert!(matches!(result, Err(SchemaError::UnsupportedEngine(e)) if e == engine));
        }
    }

    #[test]
    fn test_cancelled_token_is_reported() {
        let cancel = CancellationToken::new();
        assert!(ensure_active(&cancel).is_ok());
        cancel.cancel();
        assert!(matches!(ensure_active(&cancel), Err(SchemaError::Cancelled)));
    }
}
