//! Shared fixtures for the content integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use canopy_content::ResourceController;
use canopy_core::error::{CanopyError, CanopyResult};
use canopy_core::models::annotation::KeyValue;
use canopy_core::models::application::Application;
use canopy_core::models::resource::{NewResource, Resource, ResourceKind};
use canopy_core::registry::{AuthorizationRegistry, OwnerPath, Registration};
use canopy_db::repository::{SurrealAuthorizationRegistry, SurrealResourceRepository};
use chrono::Utc;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

pub type Controller = ResourceController<SurrealResourceRepository<Db>, FakeRegistry>;

pub type StoredRegistryController =
    ResourceController<SurrealResourceRepository<Db>, SurrealAuthorizationRegistry<Db>>;

#[derive(Default)]
pub struct RegistryState {
    pub registered: HashMap<Uuid, OwnerPath>,
    pub deregistered: Vec<Uuid>,
    pub fail_register: bool,
    pub fail_deregister: bool,
}

/// In-process registry whose failures can be switched on per test.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    pub state: Arc<Mutex<RegistryState>>,
}

impl FakeRegistry {
    pub fn fail_register(&self, fail: bool) {
        self.state.lock().unwrap().fail_register = fail;
    }

    pub fn fail_deregister(&self, fail: bool) {
        self.state.lock().unwrap().fail_deregister = fail;
    }

    pub fn owner_of(&self, external_id: Uuid) -> Option<OwnerPath> {
        self.state.lock().unwrap().registered.get(&external_id).copied()
    }

    pub fn registered_count(&self) -> usize {
        self.state.lock().unwrap().registered.len()
    }

    pub fn deregistered(&self) -> Vec<Uuid> {
        self.state.lock().unwrap().deregistered.clone()
    }
}

impl AuthorizationRegistry for FakeRegistry {
    async fn register(&self, owner: &OwnerPath, _actor_id: Uuid) -> CanopyResult<Registration> {
        let mut state = self.state.lock().unwrap();
        if state.fail_register {
            return Err(CanopyError::Registry("registry unavailable".into()));
        }
        let id = Uuid::new_v4();
        state.registered.insert(id, *owner);
        Ok(Registration {
            external_id: id,
            created: true,
        })
    }

    async fn deregister(&self, external_id: Uuid) -> CanopyResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deregister {
            return Err(CanopyError::Registry("registry unavailable".into()));
        }
        state
            .registered
            .remove(&external_id)
            .ok_or_else(|| CanopyError::Registry(format!("{external_id} not registered")))?;
        state.deregistered.push(external_id);
        Ok(())
    }
}

pub async fn setup() -> (Controller, FakeRegistry, Surreal<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    canopy_db::run_migrations(&db).await.unwrap();

    let registry = FakeRegistry::default();
    let controller =
        ResourceController::new(SurrealResourceRepository::new(db.clone()), registry.clone());

    (controller, registry, db)
}

/// Controller whose registry entries live in the same database.
pub async fn setup_with_stored_registry() -> (
    StoredRegistryController,
    SurrealAuthorizationRegistry<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    canopy_db::run_migrations(&db).await.unwrap();

    let registry = SurrealAuthorizationRegistry::new(db.clone());
    let controller = ResourceController::new(SurrealResourceRepository::new(db), registry.clone());

    (controller, registry)
}

pub fn application() -> Application {
    Application {
        id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        device_id: Uuid::new_v4(),
        root_resource_id: Uuid::new_v4(),
        active_content_version_id: None,
        name: "Lobby screen".into(),
        modified_at: Utc::now(),
    }
}

pub fn kv(key: &str, value: &str) -> KeyValue {
    KeyValue::new(key, value)
}

pub fn new_resource(kind: ResourceKind, name: &str, order_number: i64) -> NewResource {
    NewResource {
        order_number,
        kind,
        name: name.into(),
        slug: name.to_lowercase().replace(' ', "-"),
        data: None,
        properties: vec![],
        styles: vec![],
    }
}

pub async fn create_root(controller: &Controller, application: &Application) -> Resource {
    controller
        .create_node(
            application,
            None,
            new_resource(ResourceKind::Root, "Root", 0),
            Uuid::new_v4(),
        )
        .await
        .unwrap()
}

pub async fn create_child(
    controller: &Controller,
    application: &Application,
    parent: &Resource,
    kind: ResourceKind,
    name: &str,
    order_number: i64,
) -> Resource {
    controller
        .create_node(
            application,
            Some(parent),
            new_resource(kind, name, order_number),
            Uuid::new_v4(),
        )
        .await
        .unwrap()
}
