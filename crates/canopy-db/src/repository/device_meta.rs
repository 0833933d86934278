//! SurrealDB implementation of [`DeviceMetaRepository`].

use canopy_core::error::CanopyResult;
use canopy_core::models::annotation::{Annotation, AnnotationOp, AnnotationSet};
use canopy_core::repository::DeviceMetaRepository;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::annotation::{self, AnnotationRowWithId, AnnotationWrites};
use crate::error::DbError;

/// SurrealDB implementation of the device meta repository.
#[derive(Clone)]
pub struct SurrealDeviceMetaRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDeviceMetaRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DeviceMetaRepository for SurrealDeviceMetaRepository<C> {
    async fn list(&self, device_id: Uuid) -> CanopyResult<Vec<Annotation>> {
        let mut result = self
            .db
            .query(annotation::select_by_owner(AnnotationSet::DeviceMeta))
            .bind(("owner_id", device_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnnotationRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(AnnotationRowWithId::try_into_annotation)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn apply(
        &self,
        device_id: Uuid,
        ops: Vec<AnnotationOp>,
        actor_id: Uuid,
    ) -> CanopyResult<()> {
        if ops.is_empty() {
            return Ok(());
        }

        let writes = AnnotationWrites::from_ops(ops);
        let query = format!(
            "BEGIN TRANSACTION; {} COMMIT TRANSACTION;",
            annotation::write_statements(AnnotationSet::DeviceMeta, "meta"),
        );

        self.db
            .query(query)
            .bind(("owner_id", device_id.to_string()))
            .bind(("actor_id", actor_id.to_string()))
            .bind(("meta_creates", writes.creates))
            .bind(("meta_updates", writes.updates))
            .bind(("meta_deletes", writes.deletes))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }
}
