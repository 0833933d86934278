//! SurrealDB-backed authorization registry.
//!
//! Keeps one `protected_resource` row per resource node, addressed by the
//! node's owner path URI. Any storage failure is reported as a registry
//! error so callers can tell it apart from resource store failures.

use canopy_core::error::{CanopyError, CanopyResult};
use canopy_core::registry::{AuthorizationRegistry, OwnerPath, Registration};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::parse_uuid;

/// Configuration for protected-resource registration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Type tag stored on every protected resource.
    pub resource_type: String,
    /// Scopes granted on every protected resource.
    pub scopes: Vec<String>,
    /// Whether owners manage access to their own resources.
    pub owner_managed_access: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            resource_type: "resource".into(),
            scopes: vec![
                "resource:access".into(),
                "resource:modify".into(),
                "resource:delete".into(),
                "resource:create-resource".into(),
                "resource:create-folder".into(),
            ],
            owner_managed_access: true,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

/// SurrealDB implementation of [`AuthorizationRegistry`].
#[derive(Clone)]
pub struct SurrealAuthorizationRegistry<C: Connection> {
    db: Surreal<C>,
    config: RegistryConfig,
}

impl<C: Connection> SurrealAuthorizationRegistry<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_config(db, RegistryConfig::default())
    }

    pub fn with_config(db: Surreal<C>, config: RegistryConfig) -> Self {
        Self { db, config }
    }

    async fn find_by_uri(&self, uri: &str) -> CanopyResult<Option<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id FROM protected_resource \
                 WHERE uri = $uri LIMIT 1",
            )
            .bind(("uri", uri.to_string()))
            .await
            .map_err(registry_error)?;

        let rows: Vec<IdRow> = result.take(0).map_err(registry_error)?;
        rows.into_iter()
            .next()
            .map(|row| parse_uuid(&row.record_id, "protected resource"))
            .transpose()
            .map_err(|e| CanopyError::Registry(e.to_string()))
    }
}

fn registry_error(err: surrealdb::Error) -> CanopyError {
    CanopyError::Registry(err.to_string())
}

impl<C: Connection> AuthorizationRegistry for SurrealAuthorizationRegistry<C> {
    async fn register(&self, owner: &OwnerPath, actor_id: Uuid) -> CanopyResult<Registration> {
        let uri = owner.uri();

        // A retried create finds the entry of the earlier attempt.
        if let Some(existing) = self.find_by_uri(&uri).await? {
            debug!(%uri, external_id = %existing, "Protected resource already registered");
            return Ok(Registration {
                external_id: existing,
                created: false,
            });
        }

        let id = Uuid::new_v4();
        self.db
            .query(
                "CREATE type::record('protected_resource', $id) SET \
                 uri = $uri, name = $name, resource_type = $resource_type, \
                 scopes = $scopes, owner_id = $owner_id, \
                 owner_managed_access = $owner_managed_access",
            )
            .bind(("id", id.to_string()))
            .bind(("uri", uri.clone()))
            .bind(("name", owner.resource_id.to_string()))
            .bind(("resource_type", self.config.resource_type.clone()))
            .bind(("scopes", self.config.scopes.clone()))
            .bind(("owner_id", actor_id.to_string()))
            .bind(("owner_managed_access", self.config.owner_managed_access))
            .await
            .map_err(registry_error)?
            .check()
            .map_err(registry_error)?;

        info!(%uri, external_id = %id, "Registered protected resource");

        Ok(Registration {
            external_id: id,
            created: true,
        })
    }

    async fn deregister(&self, external_id: Uuid) -> CanopyResult<()> {
        let mut result = self
            .db
            .query(
                "DELETE type::record('protected_resource', $id) \
                 RETURN BEFORE",
            )
            .bind(("id", external_id.to_string()))
            .await
            .map_err(registry_error)?;

        let removed: Vec<surrealdb_types::Value> = result.take(0).map_err(registry_error)?;
        if removed.is_empty() {
            return Err(CanopyError::Registry(format!(
                "protected resource {external_id} is not registered"
            )));
        }

        info!(external_id = %external_id, "Deregistered protected resource");

        Ok(())
    }
}
