//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must write each
//! call as one unit of work: a reader never sees a resource with new
//! properties but stale styles.

use uuid::Uuid;

use crate::error::CanopyResult;
use crate::models::annotation::{Annotation, AnnotationOp, AnnotationPlan, AnnotationSet};
use crate::models::resource::{CreateResource, Resource, ResourceKind, UpdateResource};

// ---------------------------------------------------------------------------
// Resource tree
// ---------------------------------------------------------------------------

pub trait ResourceRepository: Send + Sync {
    /// Inserts a resource together with the annotation creates in `plan`.
    ///
    /// Fails with a validation error when `parent_id` does not reference an
    /// existing resource.
    fn create(
        &self,
        input: CreateResource,
        plan: AnnotationPlan,
    ) -> impl Future<Output = CanopyResult<Resource>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = CanopyResult<Option<Resource>>> + Send;

    /// Children of `parent_id`, ascending by order number then id.
    ///
    /// Returns an empty list for an unknown parent.
    fn list_children(
        &self,
        parent_id: Uuid,
        kind: Option<ResourceKind>,
    ) -> impl Future<Output = CanopyResult<Vec<Resource>>> + Send;

    /// First child of `parent_id` with `slug`, optionally of one kind.
    ///
    /// The kind is part of the lookup, so a sibling of another kind that
    /// shares the slug never hides a match.
    fn find_child_by_slug(
        &self,
        parent_id: Uuid,
        slug: &str,
        kind: Option<ResourceKind>,
    ) -> impl Future<Output = CanopyResult<Option<Resource>>> + Send;

    /// Updates scalar fields and applies `plan` in the same transaction.
    fn update(
        &self,
        id: Uuid,
        input: UpdateResource,
        plan: AnnotationPlan,
        actor_id: Uuid,
    ) -> impl Future<Output = CanopyResult<Resource>> + Send;

    /// Lists the properties or styles of a resource.
    fn list_annotations(
        &self,
        resource_id: Uuid,
        set: AnnotationSet,
    ) -> impl Future<Output = CanopyResult<Vec<Annotation>>> + Send;

    /// Removes every property and style of a resource.
    fn delete_annotations(&self, resource_id: Uuid) -> impl Future<Output = CanopyResult<()>> + Send;

    /// Removes exactly the resource row.
    ///
    /// Fails with an integrity error while the resource still has
    /// children. Deleting an absent resource succeeds.
    fn delete(&self, id: Uuid) -> impl Future<Output = CanopyResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Device metadata
// ---------------------------------------------------------------------------

pub trait DeviceMetaRepository: Send + Sync {
    fn list(&self, device_id: Uuid) -> impl Future<Output = CanopyResult<Vec<Annotation>>> + Send;

    /// Applies reconciled writes to a device's metas in one transaction.
    fn apply(
        &self,
        device_id: Uuid,
        ops: Vec<AnnotationOp>,
        actor_id: Uuid,
    ) -> impl Future<Output = CanopyResult<()>> + Send;
}
