use crate::{
    error::{Result, SchemaError},
    models::SchemaListEntry,
    pagination::{EncodedContinuationToken, Pagination, DEFAULT_PAGE_SIZE},
    repository::{build_store, SchemaStore},
    schema::{EntityDefinition, RuleDefinition, SchemaCompiler, SchemaDefinition},
    version::new_version,
};
use auth_attributes::{validate_value, DynamicValue};
use config_engine::StoreSettings;
use dashmap::DashMap;
use error_common::log_error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// A write that lost the race for the head is retried with a fresh version this many times.
const WRITE_ATTEMPTS: usize = 3;

/// Schema façade used by the write path and by callers that want "latest".
///
/// Wraps a [`SchemaStore`] with version minting, head resolution, page size policy
/// and an optional cache of compiled schemas.
pub struct SchemaService {
    /// Backing store
    store: Arc<dyn SchemaStore>,

    /// Compiler applied to submitted schema text
    compiler: Arc<dyn SchemaCompiler>,

    /// Compiled schemas keyed by (tenant, version). Versions are immutable, so
    /// entries never go stale.
    cache: Option<Arc<DashMap<(String, String), Arc<SchemaDefinition>>>>,

    default_page_size: u32,
    max_page_size: u32,
}

impl SchemaService {
    pub fn new(store: Arc<dyn SchemaStore>, compiler: Arc<dyn SchemaCompiler>) -> Self {
        Self {
            store,
            compiler,
            cache: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Build the configured store and apply the configured page sizes.
    pub fn from_settings(
        settings: &StoreSettings,
        compiler: Arc<dyn SchemaCompiler>,
    ) -> Result<Self> {
        let store = build_store(settings, Arc::clone(&compiler))?;
        Ok(Self::new(store, compiler).with_page_sizes(
            settings.pagination.default_page_size,
            settings.pagination.max_page_size,
        ))
    }

    /// Enable caching of compiled schemas
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(Arc::new(DashMap::new()));
        self
    }

    pub fn with_page_sizes(mut self, default_page_size: u32, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size.max(1);
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }

    // =============================================================================
    // Write Path
    // =============================================================================

    /// Compile `text`, mint a version and store one row per entity and rule.
    ///
    /// Returns the new version, which is also the tenant's head once this returns. A
    /// version overtaken by a concurrent write is replaced by a freshly minted one.
    pub async fn write_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        text: &str,
    ) -> Result<String> {
        let result = self.write_schema_inner(cancel, tenant_id, text).await;
        if let Err(ref err) = result {
            log_error("write_schema", err);
        }
        result
    }

    async fn write_schema_inner(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        text: &str,
    ) -> Result<String> {
        let schema = self.compiler.compile(&[text.to_string()])?;
        if schema.is_empty() {
            return Err(SchemaError::InvalidArgument(
                "schema defines no entities or rules".to_string(),
            ));
        }

        let constructs = schema.constructs();
        let count = constructs.len();
        let mut attempt = 1;
        let version = loop {
            let version = new_version()?;
            match self
                .store
                .write_schema(cancel, tenant_id, &version, constructs.clone())
                .await
            {
                Ok(()) => break version,
                Err(SchemaError::StaleVersion { head, .. }) if attempt < WRITE_ATTEMPTS => {
                    debug!(tenant_id, version = %version, head = %head, attempt, "version overtaken, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        if let Some(ref cache) = self.cache {
            cache.insert((tenant_id.to_string(), version.clone()), Arc::new(schema));
        }

        info!(tenant_id, version = %version, constructs = count, "schema written");
        Ok(version)
    }

    // =============================================================================
    // Version Resolution
    // =============================================================================

    pub async fn head_version(&self, cancel: &CancellationToken, tenant_id: &str) -> Result<String> {
        self.store.head_version(cancel, tenant_id).await
    }

    /// A missing or empty version means the tenant's head.
    pub async fn resolve_version(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: Option<&str>,
    ) -> Result<String> {
        match version {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => {
                let head = self.store.head_version(cancel, tenant_id).await?;
                debug!(tenant_id, head = %head, "resolved latest schema version");
                Ok(head)
            }
        }
    }

    // =============================================================================
    // Reads
    // =============================================================================

    pub async fn read_schema(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        version: Option<&str>,
    ) -> Result<(Arc<SchemaDefinition>, String)> {
        let version = self.resolve_version(cancel, tenant_id, version).await?;
        let key = (tenant_id.to_string(), version.clone());

        if let Some(ref cache) = self.cache {
            if let Some(schema) = cache.get(&key) {
                debug!(tenant_id, version = %version, "schema cache hit");
                return Ok((Arc::clone(schema.value()), version));
            }
        }

        let schema = Arc::new(self.store.read_schema(cancel, tenant_id, &version).await?);

        if let Some(ref cache) = self.cache {
            cache.insert(key, Arc::clone(&schema));
        }
        Ok((schema, version))
    }

    pub async fn read_entity_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<(EntityDefinition, String)> {
        let version = self.resolve_version(cancel, tenant_id, version).await?;
        self.store
            .read_entity_definition(cancel, tenant_id, name, &version)
            .await
    }

    pub async fn read_rule_definition(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<(RuleDefinition, String)> {
        let version = self.resolve_version(cancel, tenant_id, version).await?;
        self.store
            .read_rule_definition(cancel, tenant_id, name, &version)
            .await
    }

    /// List versions. No page size means the configured default; larger than the
    /// configured maximum is clamped to it.
    pub async fn list_schemas(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        page_size: Option<u32>,
        token: impl Into<EncodedContinuationToken>,
    ) -> Result<(Vec<SchemaListEntry>, EncodedContinuationToken)> {
        let page_size = page_size
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);
        let pagination = Pagination::new(page_size).with_token(token);
        self.store.list_schemas(cancel, tenant_id, &pagination).await
    }

    // =============================================================================
    // Attribute Validation
    // =============================================================================

    /// Check that `value` matches the type `entity_type` declares for `attribute`.
    pub async fn validate_attribute(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        entity_type: &str,
        attribute: &str,
        value: &DynamicValue,
        version: Option<&str>,
    ) -> Result<()> {
        let result = self
            .validate_attribute_inner(cancel, tenant_id, entity_type, attribute, value, version)
            .await;
        if let Err(ref err) = result {
            log_error("validate_attribute", err);
        }
        result
    }

    async fn validate_attribute_inner(
        &self,
        cancel: &CancellationToken,
        tenant_id: &str,
        entity_type: &str,
        attribute: &str,
        value: &DynamicValue,
        version: Option<&str>,
    ) -> Result<()> {
        let (entity, version) = self
            .read_entity_definition(cancel, tenant_id, entity_type, version)
            .await?;
        let declared = entity.attribute(attribute).ok_or_else(|| {
            SchemaError::InvalidArgument(format!(
                "entity '{}' declares no attribute '{}' in version {}",
                entity_type, attribute, version
            ))
        })?;
        validate_value(value, declared.attribute_type)?;
        debug!(tenant_id, entity_type, attribute, "attribute value accepted");
        Ok(())
    }

    // =============================================================================
    // Cache Management
    // =============================================================================

    pub fn clear_cache(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DefinitionCompiler;
    use crate::models::SchemaConstruct;
    use crate::repository::{MemorySchemaStore, SchemaReader, SchemaWriter};
    use async_trait::async_trait;
    use auth_attributes::AttributeValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to a memory store; the first `stale_writes` writes fail as overtaken.
    struct OvertakenStore {
        inner: MemorySchemaStore,
        stale_writes: AtomicUsize,
    }

    #[async_trait]
    impl SchemaReader for OvertakenStore {
        async fn read_schema(
            &self,
            cancel: &CancellationToken,
            tenant_id: &str,
            version: &str,
        ) -> Result<SchemaDefinition> {
            self.inner.read_schema(cancel, tenant_id, version).await
        }

        async fn read_entity_definition(
            &self,
            cancel: &CancellationToken,
            tenant_id: &str,
            name: &str,
            version: &str,
        ) -> Result<(EntityDefinition, String)> {
            self.inner
                .read_entity_definition(cancel, tenant_id, name, version)
                .await
        }

        async fn read_rule_definition(
            &self,
            cancel: &CancellationToken,
            tenant_id: &str,
            name: &str,
            version: &str,
        ) -> Result<(RuleDefinition, String)> {
            self.inner
                .read_rule_definition(cancel, tenant_id, name, version)
                .await
        }

        async fn head_version(&self, cancel: &CancellationToken, tenant_id: &str) -> Result<String> {
            self.inner.head_version(cancel, tenant_id).await
        }

        async fn list_schemas(
            &self,
            cancel: &CancellationToken,
            tenant_id: &str,
            pagination: &Pagination,
        ) -> Result<(Vec<SchemaListEntry>, EncodedContinuationToken)> {
            self.inner.list_schemas(cancel, tenant_id, pagination).await
        }
    }

    #[async_trait]
    impl SchemaWriter for OvertakenStore {
        async fn write_schema(
            &self,
            cancel: &CancellationToken,
            tenant_id: &str,
            version: &str,
            constructs: Vec<SchemaConstruct>,
        ) -> Result<()> {
            let remaining = self.stale_writes.load(Ordering::SeqCst);
            if remaining > 0 {
                self.stale_writes.store(remaining - 1, Ordering::SeqCst);
                return Err(SchemaError::StaleVersion {
                    tenant_id: tenant_id.to_string(),
                    version: version.to_string(),
                    head: "later".to_string(),
                });
            }
            self.inner
                .write_schema(cancel, tenant_id, version, constructs)
                .await
        }
    }

    const BANKING: &str = r#"
        entity user {}

        entity account {
            relation owner @user
            attribute balance double
            attribute tags string[]
            permission withdraw = owner and check_balance(balance)
        }

        rule check_balance(balance double) {
            balance >= 5000
        }
    "#;

    fn service() -> SchemaService {
        let compiler = Arc::new(DefinitionCompiler::new());
        let store = Arc::new(MemorySchemaStore::new(compiler.clone()));
        SchemaService::new(store, compiler)
    }

    #[tokio::test]
    async fn test_write_then_read_latest() {
        let service = service();
        let cancel = CancellationToken::new();

        let version = service.write_schema(&cancel, "t1", BANKING).await.unwrap();
        assert_eq!(service.head_version(&cancel, "t1").await.unwrap(), version);

        let (schema, resolved) = service.read_schema(&cancel, "t1", None).await.unwrap();
        assert_eq!(resolved, version);
        assert!(schema.entity_by_name("account").is_some());
        assert!(schema.rule_by_name("check_balance").is_some());

        let (rule, resolved) = service
            .read_rule_definition(&cancel, "t1", "check_balance", Some(""))
            .await
            .unwrap();
        assert_eq!(resolved, version);
        assert_eq!(rule.expression, "balance >= 5000");
    }

    #[tokio::test]
    async fn test_overtaken_write_retries_with_fresh_version() {
        let compiler = Arc::new(DefinitionCompiler::new());
        let store = Arc::new(OvertakenStore {
            inner: MemorySchemaStore::new(compiler.clone()),
            stale_writes: AtomicUsize::new(1),
        });
        let service = SchemaService::new(store, compiler);
        let cancel = CancellationToken::new();

        let version = service.write_schema(&cancel, "t1", BANKING).await.unwrap();
        assert_eq!(service.head_version(&cancel, "t1").await.unwrap(), version);
        let (schema, _) = service.read_schema(&cancel, "t1", None).await.unwrap();
        assert!(schema.entity_by_name("account").is_some());
    }

    #[tokio::test]
    async fn test_write_gives_up_behind_unreachable_head() {
        let compiler = Arc::new(DefinitionCompiler::new());
        let store = Arc::new(MemorySchemaStore::new(compiler.clone()));
        let cancel = CancellationToken::new();
        // Largest possible ULID: no freshly minted version can sort after it.
        store
            .write_schema(
                &cancel,
                "t1",
                "7ZZZZZZZZZZZZZZZZZZZZZZZZZ",
                vec![SchemaConstruct::new("user", "entity user {}")],
            )
            .await
            .unwrap();

        let service = SchemaService::new(store, compiler);
        let err = service.write_schema(&cancel, "t1", BANKING).await.unwrap_err();
        assert!(matches!(err, SchemaError::StaleVersion { .. }));
        assert_eq!(
            service.head_version(&cancel, "t1").await.unwrap(),
            "7ZZZZZZZZZZZZZZZZZZZZZZZZZ"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_service_writes_keep_head_monotonic() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let cancel = CancellationToken::new();
                let mut written = Vec::new();
                for _ in 0..10 {
                    match service.write_schema(&cancel, "t1", BANKING).await {
                        Ok(version) => written.push(version),
                        Err(SchemaError::StaleVersion { .. }) => {}
                        Err(other) => panic!("unexpected write failure: {other}"),
                    }
                }
                written
            }));
        }

        let mut written = Vec::new();
        for handle in handles {
            written.extend(handle.await.unwrap());
        }
        assert!(!written.is_empty());
        let cancel = CancellationToken::new();
        let head = service.head_version(&cancel, "t1").await.unwrap();
        assert_eq!(Some(&head), written.iter().max());
    }

    #[tokio::test]
    async fn test_rejects_unparseable_and_empty_text() {
        let service = service();
        let cancel = CancellationToken::new();

        assert!(matches!(
            service.write_schema(&cancel, "t1", "entity {").await,
            Err(SchemaError::Compile(_))
        ));
        assert!(matches!(
            service.write_schema(&cancel, "t1", "// nothing").await,
            Err(SchemaError::InvalidArgument(_))
        ));
        assert!(matches!(
            service.read_schema(&cancel, "t1", None).await,
            Err(SchemaError::SchemaNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cache_serves_repeated_reads() {
        let service = service().with_cache();
        let cancel = CancellationToken::new();

        let version = service.write_schema(&cancel, "t1", BANKING).await.unwrap();
        assert_eq!(service.cache_size(), 1);

        let (first, _) = service.read_schema(&cancel, "t1", Some(&version)).await.unwrap();
        let (second, _) = service.read_schema(&cancel, "t1", None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        service.clear_cache();
        assert_eq!(service.cache_size(), 0);
        let (third, _) = service.read_schema(&cancel, "t1", None).await.unwrap();
        assert_eq!(*third, *first);
    }

    #[tokio::test]
    async fn test_validate_attribute_against_declared_type() {
        let service = service();
        let cancel = CancellationToken::new();
        service.write_schema(&cancel, "t1", BANKING).await.unwrap();

        let balance = DynamicValue::pack(&AttributeValue::Double(7500.0)).unwrap();
        service
            .validate_attribute(&cancel, "t1", "account", "balance", &balance, None)
            .await
            .unwrap();

        let wrong = DynamicValue::pack(&AttributeValue::Boolean(true)).unwrap();
        assert!(matches!(
            service
                .validate_attribute(&cancel, "t1", "account", "balance", &wrong, None)
                .await,
            Err(SchemaError::Attribute(_))
        ));

        assert!(matches!(
            service
                .validate_attribute(&cancel, "t1", "account", "nickname", &balance, None)
                .await,
            Err(SchemaError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_page_size_policy() {
        let service = service().with_page_sizes(1, 2);
        let cancel = CancellationToken::new();
        for _ in 0..3 {
            service.write_schema(&cancel, "t1", BANKING).await.unwrap();
        }

        let (page, token) = service.list_schemas(&cancel, "t1", None, "").await.unwrap();
        assert_eq!(page.len(), 1);
        assert!(!token.is_noop());

        let (page, _) = service
            .list_schemas(&cancel, "t1", Some(50), "")
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_from_settings_uses_memory_store() {
        let mut settings = StoreSettings::default();
        settings.pagination.default_page_size = 5;
        let service =
            SchemaService::from_settings(&settings, Arc::new(DefinitionCompiler::new())).unwrap();
        assert_eq!(service.default_page_size, 5);
        assert_eq!(service.max_page_size, settings.pagination.max_page_size);
    }
}
