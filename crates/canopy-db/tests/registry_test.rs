//! Integration tests for the SurrealDB-backed authorization registry.

use canopy_core::error::CanopyError;
use canopy_core::registry::{AuthorizationRegistry, OwnerPath};
use canopy_db::repository::SurrealAuthorizationRegistry;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealAuthorizationRegistry<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    canopy_db::run_migrations(&db).await.unwrap();
    SurrealAuthorizationRegistry::new(db)
}

fn owner() -> OwnerPath {
    OwnerPath {
        customer_id: Uuid::new_v4(),
        device_id: Uuid::new_v4(),
        application_id: Uuid::new_v4(),
        resource_id: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn register_then_deregister() {
    let registry = setup().await;
    let registration = registry.register(&owner(), Uuid::new_v4()).await.unwrap();
    assert!(registration.created);

    registry.deregister(registration.external_id).await.unwrap();
}

#[tokio::test]
async fn registering_the_same_path_twice_returns_the_existing_entry() {
    let registry = setup().await;
    let path = owner();

    let first = registry.register(&path, Uuid::new_v4()).await.unwrap();
    let second = registry.register(&path, Uuid::new_v4()).await.unwrap();
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.external_id, second.external_id);

    let other = registry.register(&owner(), Uuid::new_v4()).await.unwrap();
    assert!(other.created);
    assert_ne!(first.external_id, other.external_id);
}

#[tokio::test]
async fn deregistering_an_unknown_entry_fails() {
    let registry = setup().await;
    let err = registry.deregister(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CanopyError::Registry(_)));
}

#[test]
fn owner_path_uri_addresses_the_whole_hierarchy() {
    let path = owner();
    assert_eq!(
        path.uri(),
        format!(
            "/v1/{}/devices/{}/applications/{}/resources/{}",
            path.customer_id, path.device_id, path.application_id, path.resource_id
        )
    );
}
