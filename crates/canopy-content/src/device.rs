//! Device metadata, reconciled like resource properties.

use canopy_core::error::CanopyResult;
use canopy_core::models::annotation::{Annotation, KeyValue};
use canopy_core::reconcile::reconcile;
use canopy_core::repository::DeviceMetaRepository;
use tracing::debug;
use uuid::Uuid;

pub struct DeviceMetaController<M: DeviceMetaRepository> {
    metas: M,
}

impl<M: DeviceMetaRepository> DeviceMetaController<M> {
    pub fn new(metas: M) -> Self {
        Self { metas }
    }

    pub async fn list_device_metas(&self, device_id: Uuid) -> CanopyResult<Vec<Annotation>> {
        self.metas.list(device_id).await
    }

    /// Replaces the device's metas with `desired` and returns the stored
    /// result. Entries whose key survives keep their id.
    pub async fn set_device_metas(
        &self,
        device_id: Uuid,
        desired: &[KeyValue],
        actor_id: Uuid,
    ) -> CanopyResult<Vec<Annotation>> {
        let current = self.metas.list(device_id).await?;
        let ops = reconcile(&current, desired);

        debug!(device_id = %device_id, ops = ops.len(), "Reconciled device metas");

        self.metas.apply(device_id, ops, actor_id).await?;
        self.metas.list(device_id).await
    }
}
