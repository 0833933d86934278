//! Resource controller: node creation, update, cascading delete and the
//! tree-membership checks used for authorization scoping.

use std::collections::HashSet;

use canopy_core::error::{CanopyError, CanopyResult};
use canopy_core::models::annotation::{Annotation, AnnotationPlan, AnnotationSet};
use canopy_core::models::application::Application;
use canopy_core::models::resource::{
    CreateResource, NewResource, Resource, ResourceChanges, ResourceKind,
};
use canopy_core::reconcile::{reconcile, reconcile_new};
use canopy_core::registry::{AuthorizationRegistry, OwnerPath};
use canopy_core::repository::ResourceRepository;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::BoxFuture;

/// Resource controller.
///
/// Generic over the store and registry implementations.
pub struct ResourceController<R: ResourceRepository, G: AuthorizationRegistry> {
    resources: R,
    registry: G,
}

impl<R: ResourceRepository, G: AuthorizationRegistry> ResourceController<R, G> {
    pub fn new(resources: R, registry: G) -> Self {
        Self {
            resources,
            registry,
        }
    }

    pub async fn find_resource_by_id(&self, id: Uuid) -> CanopyResult<Option<Resource>> {
        self.resources.find_by_id(id).await
    }

    /// Ordered children of `parent`, optionally restricted to one kind.
    pub async fn list_resources_by_parent(
        &self,
        parent: &Resource,
        kind: Option<ResourceKind>,
    ) -> CanopyResult<Vec<Resource>> {
        self.resources.list_children(parent.id, kind).await
    }

    pub async fn find_child_by_slug(
        &self,
        parent: &Resource,
        slug: &str,
        kind: Option<ResourceKind>,
    ) -> CanopyResult<Option<Resource>> {
        self.resources.find_child_by_slug(parent.id, slug, kind).await
    }

    pub async fn list_properties(&self, resource: &Resource) -> CanopyResult<Vec<Annotation>> {
        self.resources
            .list_annotations(resource.id, AnnotationSet::Property)
            .await
    }

    pub async fn list_styles(&self, resource: &Resource) -> CanopyResult<Vec<Annotation>> {
        self.resources
            .list_annotations(resource.id, AnnotationSet::Style)
            .await
    }

    /// Creates a node with its properties and styles.
    ///
    /// A `Root` node takes `application.root_resource_id` as its id and
    /// must not have a parent; every other kind needs a parent inside the
    /// application. A second root for the same application is an integrity
    /// error. The registry entry is created first; if that fails nothing
    /// is written.
    pub async fn create_node(
        &self,
        application: &Application,
        parent: Option<&Resource>,
        input: NewResource,
        actor_id: Uuid,
    ) -> CanopyResult<Resource> {
        validate_new(&input)?;

        let id = match (parent, input.kind) {
            (None, ResourceKind::Root) => {
                let root_id = application.root_resource_id;
                if self.resources.find_by_id(root_id).await?.is_some() {
                    return Err(CanopyError::integrity(format!(
                        "application {} already has root resource {root_id}",
                        application.id
                    )));
                }
                root_id
            }
            (None, kind) => {
                return Err(CanopyError::validation(format!(
                    "a {kind} resource requires a parent"
                )));
            }
            (Some(_), ResourceKind::Root) => {
                return Err(CanopyError::validation("a ROOT resource can not have a parent"));
            }
            (Some(parent), kind) => {
                if kind == ResourceKind::ContentVersion && parent.kind != ResourceKind::Root {
                    return Err(CanopyError::validation(
                        "content versions can only be created under ROOT",
                    ));
                }
                if !self.is_application_resource(application, parent).await? {
                    return Err(CanopyError::validation(format!(
                        "parent resource {} does not belong to application {}",
                        parent.id, application.id
                    )));
                }
                Uuid::new_v4()
            }
        };

        let owner = OwnerPath::new(application, id);
        let registration = self.registry.register(&owner, actor_id).await?;
        let external_authorization_id = registration.external_id;

        let plan = AnnotationPlan {
            properties: reconcile_new(&input.properties),
            styles: reconcile_new(&input.styles),
        };

        let created = self
            .resources
            .create(
                CreateResource {
                    id: Some(id),
                    parent_id: parent.map(|p| p.id),
                    order_number: input.order_number,
                    kind: input.kind,
                    name: input.name,
                    slug: input.slug,
                    data: input.data,
                    external_authorization_id,
                    creator_id: actor_id,
                },
                plan,
            )
            .await;

        match created {
            Ok(resource) => {
                info!(
                    resource_id = %resource.id,
                    application_id = %application.id,
                    kind = %resource.kind,
                    "Created resource"
                );
                Ok(resource)
            }
            Err(err) => {
                // Only an entry minted by this call may be removed; a reused
                // one can belong to a stored node.
                if !registration.created {
                    return Err(err);
                }
                if let Err(cleanup) = self.registry.deregister(external_authorization_id).await {
                    warn!(
                        external_id = %external_authorization_id,
                        error = %cleanup,
                        "Failed to roll back registry entry"
                    );
                }
                Err(err)
            }
        }
    }

    /// Updates scalar fields and replaces both annotation sets.
    ///
    /// Everything is handed to the store as one unit of work. A change set
    /// that alters nothing leaves `modified_at` untouched.
    pub async fn update_node(
        &self,
        resource: &Resource,
        changes: ResourceChanges,
        actor_id: Uuid,
    ) -> CanopyResult<Resource> {
        let ResourceChanges {
            fields,
            properties,
            styles,
        } = changes;

        if let Some(kind) = fields.kind
            && (kind == ResourceKind::Root) != (resource.kind == ResourceKind::Root)
        {
            return Err(CanopyError::validation(format!(
                "can not change a {} resource into {kind}",
                resource.kind
            )));
        }
        if matches!(&fields.name, Some(name) if name.trim().is_empty()) {
            return Err(CanopyError::validation("name must not be empty"));
        }
        if matches!(&fields.slug, Some(slug) if slug.trim().is_empty()) {
            return Err(CanopyError::validation("slug must not be empty"));
        }
        if let Some(parent_id) = fields.parent_id {
            self.validate_reparent(resource, parent_id).await?;
        }

        let current_properties = self.list_properties(resource).await?;
        let current_styles = self.list_styles(resource).await?;
        let plan = AnnotationPlan {
            properties: reconcile(&current_properties, &properties),
            styles: reconcile(&current_styles, &styles),
        };

        debug!(
            resource_id = %resource.id,
            property_ops = plan.properties.len(),
            style_ops = plan.styles.len(),
            "Reconciled resource annotations"
        );

        // Nothing to write: the node and its modification stamp stay as they are.
        if fields.is_empty() && plan.is_empty() {
            return self
                .resources
                .find_by_id(resource.id)
                .await?
                .ok_or_else(|| CanopyError::NotFound {
                    entity: "resource".into(),
                    id: resource.id.to_string(),
                });
        }

        self.resources
            .update(resource.id, fields, plan, actor_id)
            .await
    }

    /// Deletes a node, its whole subtree and every annotation below it.
    ///
    /// Children go first, depth-first. Registry deregistration is best
    /// effort: a failure is logged and the local delete continues. Calling
    /// this again for a partially deleted subtree completes it; a node that
    /// is already gone is skipped.
    pub async fn delete_node(&self, resource: &Resource) -> CanopyResult<()> {
        self.delete_subtree(resource.id).await?;
        info!(resource_id = %resource.id, "Deleted resource subtree");
        Ok(())
    }

    fn delete_subtree(&self, id: Uuid) -> BoxFuture<'_, CanopyResult<()>> {
        Box::pin(async move {
            let Some(resource) = self.resources.find_by_id(id).await? else {
                debug!(resource_id = %id, "Resource already deleted");
                return Ok(());
            };

            for child in self.resources.list_children(id, None).await? {
                self.delete_subtree(child.id).await?;
            }

            self.resources.delete_annotations(id).await?;

            if let Err(err) = self
                .registry
                .deregister(resource.external_authorization_id)
                .await
            {
                warn!(
                    resource_id = %id,
                    external_id = %resource.external_authorization_id,
                    error = %err,
                    "Failed to remove protected resource from registry"
                );
            }

            self.resources.delete(id).await
        })
    }

    /// Whether `candidate` lies strictly below `root`.
    ///
    /// Walks parent links upward. A `None` candidate is never a
    /// descendant.
    pub async fn is_descendant_of(
        &self,
        root: &Resource,
        candidate: Option<&Resource>,
    ) -> CanopyResult<bool> {
        match candidate {
            Some(candidate) => self.has_ancestor(root.id, candidate).await,
            None => Ok(false),
        }
    }

    /// Whether `resource` is the application's root or lies below it.
    pub async fn is_application_resource(
        &self,
        application: &Application,
        resource: &Resource,
    ) -> CanopyResult<bool> {
        if resource.id == application.root_resource_id {
            return Ok(true);
        }
        self.has_ancestor(application.root_resource_id, resource)
            .await
    }

    async fn has_ancestor(&self, ancestor_id: Uuid, resource: &Resource) -> CanopyResult<bool> {
        let mut visited = HashSet::from([resource.id]);
        let mut next = resource.parent_id;

        while let Some(parent_id) = next {
            if parent_id == ancestor_id {
                return Ok(true);
            }
            if !visited.insert(parent_id) {
                warn!(resource_id = %resource.id, "Cycle in resource parent chain");
                return Ok(false);
            }
            next = match self.resources.find_by_id(parent_id).await? {
                Some(parent) => parent.parent_id,
                None => None,
            };
        }

        Ok(false)
    }

    /// Id of the top-most resource reachable from `resource`.
    async fn root_id(&self, resource: &Resource) -> CanopyResult<Uuid> {
        let mut visited = HashSet::from([resource.id]);
        let mut current = resource.id;
        let mut next = resource.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(CanopyError::integrity(format!(
                    "cycle in parent chain of resource {}",
                    resource.id
                )));
            }
            match self.resources.find_by_id(parent_id).await? {
                Some(parent) => {
                    current = parent.id;
                    next = parent.parent_id;
                }
                None => break,
            }
        }

        Ok(current)
    }

    async fn validate_reparent(&self, resource: &Resource, parent_id: Uuid) -> CanopyResult<()> {
        if resource.parent_id.is_none() {
            return Err(CanopyError::validation("the root resource has no parent"));
        }
        if parent_id == resource.id {
            return Err(CanopyError::validation("a resource can not be its own parent"));
        }

        let parent = self
            .resources
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| {
                CanopyError::validation(format!("parent resource {parent_id} does not exist"))
            })?;

        if self.root_id(resource).await? != self.root_id(&parent).await? {
            return Err(CanopyError::validation(
                "resources can not be moved to another application",
            ));
        }

        if self.is_descendant_of(resource, Some(&parent)).await? {
            return Err(CanopyError::integrity(format!(
                "moving resource {} under its descendant {parent_id} would create a cycle",
                resource.id
            )));
        }

        Ok(())
    }
}

fn validate_new(input: &NewResource) -> CanopyResult<()> {
    if input.name.trim().is_empty() {
        return Err(CanopyError::validation("name must not be empty"));
    }
    if input.slug.trim().is_empty() {
        return Err(CanopyError::validation("slug must not be empty"));
    }
    Ok(())
}
