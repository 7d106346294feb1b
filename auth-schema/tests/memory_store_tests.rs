//! Store contract tests against the in-memory backend.

use auth_schema::*;
use error_common::{Coded, ErrorCode};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn store() -> Arc<MemorySchemaStore> {
    Arc::new(MemorySchemaStore::with_default_compiler())
}

fn user_and_doc() -> Vec<SchemaConstruct> {
    vec![
        SchemaConstruct::new("user", "entity user {}"),
        SchemaConstruct::new("doc", "entity doc { relation owner: user }"),
    ]
}

// =============================================================================
// WRITE AND READ
// =============================================================================

#[tokio::test]
async fn test_write_then_read_whole_and_single_construct() {
    let store = store();
    let cancel = CancellationToken::new();

    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();
    assert_eq!(store.head_version(&cancel, "t1").await.unwrap(), "v1");

    let schema = store.read_schema(&cancel, "t1", "v1").await.unwrap();
    assert!(schema.entity_by_name("user").is_some());
    assert!(schema.entity_by_name("doc").is_some());

    let (doc, version) = store
        .read_entity_definition(&cancel, "t1", "doc", "v1")
        .await
        .unwrap();
    assert_eq!(version, "v1");
    assert_eq!(doc.name, "doc");
    assert_eq!(
        doc.relation("owner").unwrap().relation_references,
        vec![RelationReference::new("user")]
    );
}

#[tokio::test]
async fn test_point_lookup_requires_exact_version() {
    let store = store();
    let cancel = CancellationToken::new();
    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();
    store
        .write_schema(
            &cancel,
            "t1",
            "v2",
            vec![SchemaConstruct::new("team", "entity team {}")],
        )
        .await
        .unwrap();

    let err = store
        .read_entity_definition(&cancel, "t1", "user", "v2")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaNotFound);

    let err = store
        .read_entity_definition(&cancel, "t1", "user", "v3")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaNotFound);

    assert!(store
        .read_entity_definition(&cancel, "t1", "user", "v1")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let store = store();
    let cancel = CancellationToken::new();
    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();

    assert!(matches!(
        store.head_version(&cancel, "t2").await,
        Err(SchemaError::SchemaNotFound { .. })
    ));
    assert!(matches!(
        store.read_schema(&cancel, "t2", "v1").await,
        Err(SchemaError::SchemaNotFound { .. })
    ));

    store
        .write_schema(&cancel, "t2", "v1", user_and_doc())
        .await
        .unwrap();
    assert_eq!(store.head_version(&cancel, "t2").await.unwrap(), "v1");
}

#[tokio::test]
async fn test_rewriting_a_version_conflicts() {
    let store = store();
    let cancel = CancellationToken::new();
    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();

    let err = store
        .write_schema(
            &cancel,
            "t1",
            "v1",
            vec![SchemaConstruct::new("team", "entity team {}")],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    // nothing from the rejected write leaked in
    assert!(store
        .read_entity_definition(&cancel, "t1", "team", "v1")
        .await
        .is_err());
}

#[tokio::test]
async fn test_single_construct_compile_is_isolated() {
    let compiler = Arc::new(DefinitionCompiler::strict());
    let store = MemorySchemaStore::new(compiler);
    let cancel = CancellationToken::new();
    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();

    // The whole version resolves `user`, the lone `doc` row cannot.
    assert!(store.read_schema(&cancel, "t1", "v1").await.is_ok());
    assert!(matches!(
        store.read_entity_definition(&cancel, "t1", "doc", "v1").await,
        Err(SchemaError::Compile(_))
    ));
}

// =============================================================================
// HEAD VERSION
// =============================================================================

#[tokio::test]
async fn test_head_strictly_increases() {
    let store = store();
    let cancel = CancellationToken::new();
    let generator = VersionGenerator::new();

    let mut previous: Option<String> = None;
    for _ in 0..20 {
        let version = generator.next_version().unwrap();
        store
            .write_schema(&cancel, "t1", &version, user_and_doc())
            .await
            .unwrap();
        let head = store.head_version(&cancel, "t1").await.unwrap();
        assert_eq!(head, version);
        if let Some(prev) = previous {
            assert!(head > prev);
        }
        previous = Some(head);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_regress_head() {
    let store = store();
    let generator = Arc::new(VersionGenerator::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let generator = Arc::clone(&generator);
        handles.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let mut observed = Vec::new();
            for _ in 0..25 {
                let version = generator.next_version().unwrap();
                // Writers racing past each other may be told their version is stale.
                match store.write_schema(&cancel, "t1", &version, user_and_doc()).await {
                    Ok(()) | Err(SchemaError::StaleVersion { .. }) => {}
                    Err(other) => panic!("unexpected write failure: {other}"),
                }
                observed.push(store.head_version(&cancel, "t1").await.unwrap());
            }
            observed
        }));
    }

    for handle in handles {
        let observed = handle.await.unwrap();
        assert!(observed.windows(2).all(|w| w[0] <= w[1]));
    }

    let cancel = CancellationToken::new();
    let head = store.head_version(&cancel, "t1").await.unwrap();
    let schema = store.read_schema(&cancel, "t1", &head).await.unwrap();
    assert_eq!(schema.entity_definitions.len(), 2);
}

// =============================================================================
// SNAPSHOT ISOLATION
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_unaffected_by_concurrent_writes() {
    let store = store();
    let cancel = CancellationToken::new();
    let generator = Arc::new(VersionGenerator::new());

    let base = generator.next_version().unwrap();
    store
        .write_schema(&cancel, "t1", &base, user_and_doc())
        .await
        .unwrap();
    let expected = store.read_schema(&cancel, "t1", &base).await.unwrap();

    let writer = {
        let store = Arc::clone(&store);
        let generator = Arc::clone(&generator);
        tokio::spawn(async move {
            let cancel = CancellationToken::new();
            for i in 0..50 {
                let version = generator.next_version().unwrap();
                let constructs = vec![
                    SchemaConstruct::new("user", "entity user {}"),
                    SchemaConstruct::new(&format!("e{}", i), &format!("entity e{} {{}}", i)),
                ];
                store
                    .write_schema(&cancel, "t1", &version, constructs)
                    .await
                    .unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let store = Arc::clone(&store);
        let base = base.clone();
        let expected = expected.clone();
        readers.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            for _ in 0..200 {
                let schema = store.read_schema(&cancel, "t1", &base).await.unwrap();
                assert_eq!(schema, expected);

                // every head a reader can see is fully populated
                let head = store.head_version(&cancel, "t1").await.unwrap();
                let latest = store.read_schema(&cancel, "t1", &head).await.unwrap();
                assert_eq!(latest.entity_definitions.len(), 2);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

// =============================================================================
// LISTING
// =============================================================================

async fn write_versions(store: &MemorySchemaStore, tenant: &str, count: usize) -> Vec<String> {
    let cancel = CancellationToken::new();
    let generator = VersionGenerator::new();
    let mut versions = Vec::new();
    for _ in 0..count {
        let version = generator.next_version().unwrap();
        store
            .write_schema(&cancel, tenant, &version, user_and_doc())
            .await
            .unwrap();
        versions.push(version);
    }
    versions
}

#[tokio::test]
async fn test_paging_yields_every_version_once_in_order() {
    let store = store();
    let cancel = CancellationToken::new();
    let versions = write_versions(&store, "t1", 7).await;
    write_versions(&store, "t2", 3).await;

    for page_size in 1..=8 {
        let mut listed = Vec::new();
        let mut token = EncodedContinuationToken::noop();
        let mut pages = 0;
        loop {
            let pagination = Pagination::new(page_size).with_token(token.clone());
            let (page, next) = store.list_schemas(&cancel, "t1", &pagination).await.unwrap();
            assert!(page.len() <= page_size as usize);
            listed.extend(page.into_iter().map(|entry| entry.version));
            pages += 1;
            if next.is_noop() {
                break;
            }
            token = next;
        }
        assert_eq!(listed, versions, "page size {page_size}");
        assert_eq!(listed.iter().collect::<BTreeSet<_>>().len(), versions.len());
        assert!(pages <= versions.len() + 1);
    }
}

#[tokio::test]
async fn test_listing_reports_creation_time() {
    let store = store();
    let cancel = CancellationToken::new();
    let versions = write_versions(&store, "t1", 2).await;

    let (page, token) = store
        .list_schemas(&cancel, "t1", &Pagination::default())
        .await
        .unwrap();
    assert!(token.is_noop());
    for (entry, version) in page.iter().zip(&versions) {
        assert_eq!(&entry.version, version);
        assert_eq!(entry.created_at, creation_time(version).unwrap());
    }
    assert!(page[0].created_at <= page[1].created_at);
}

#[tokio::test]
async fn test_listing_empty_tenant() {
    let store = store();
    let cancel = CancellationToken::new();
    let (page, token) = store
        .list_schemas(&cancel, "nobody", &Pagination::new(5))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert!(token.is_noop());
}

#[tokio::test]
async fn test_listing_rejects_foreign_and_garbage_tokens() {
    let store = store();
    let cancel = CancellationToken::new();
    write_versions(&store, "t1", 3).await;
    write_versions(&store, "t2", 3).await;

    let (_, token) = store
        .list_schemas(&cancel, "t1", &Pagination::new(1))
        .await
        .unwrap();
    assert!(!token.is_noop());

    let foreign = Pagination::new(1).with_token(token);
    let err = store.list_schemas(&cancel, "t2", &foreign).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidContinuationToken);

    let garbage = Pagination::new(1).with_token("not a token");
    let err = store.list_schemas(&cancel, "t1", &garbage).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidContinuationToken);
}

#[tokio::test]
async fn test_listing_undecodable_version_is_internal() {
    let store = store();
    let cancel = CancellationToken::new();
    store
        .write_schema(&cancel, "t1", "v1", user_and_doc())
        .await
        .unwrap();

    let err = store
        .list_schemas(&cancel, "t1", &Pagination::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Internal);
}
