//! Wall export: recursive, read-only projection of an application's
//! resource tree.

use std::collections::BTreeMap;

use canopy_core::error::{CanopyError, CanopyResult};
use canopy_core::models::annotation::Annotation;
use canopy_core::models::application::Application;
use canopy_core::models::resource::{Resource, ResourceKind};
use canopy_core::models::wall::{WallApplication, WallResource};
use canopy_core::registry::AuthorizationRegistry;
use canopy_core::repository::ResourceRepository;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::BoxFuture;
use crate::controller::ResourceController;

/// Builds wall exports through a [`ResourceController`].
pub struct WallExporter<'a, R: ResourceRepository, G: AuthorizationRegistry> {
    controller: &'a ResourceController<R, G>,
}

impl<'a, R: ResourceRepository, G: AuthorizationRegistry> WallExporter<'a, R, G> {
    pub fn new(controller: &'a ResourceController<R, G>) -> Self {
        Self { controller }
    }

    /// Exports the application's whole tree, starting at its root.
    pub async fn export_application(
        &self,
        application: &Application,
    ) -> CanopyResult<WallApplication> {
        let root = self.application_root(application).await?;
        self.export_subtree(root).await
    }

    /// Exports the content version the application currently serves.
    ///
    /// The active version must be a `ContentVersion` inside the
    /// application's tree.
    pub async fn export_active_content_version(
        &self,
        application: &Application,
    ) -> CanopyResult<WallApplication> {
        let version_id = application.active_content_version_id.ok_or_else(|| {
            CanopyError::validation(format!(
                "application {} has no active content version",
                application.id
            ))
        })?;

        let version = self
            .controller
            .find_resource_by_id(version_id)
            .await?
            .ok_or_else(|| {
                CanopyError::validation(format!(
                    "active content version {version_id} does not exist"
                ))
            })?;

        if version.kind != ResourceKind::ContentVersion {
            return Err(CanopyError::validation(format!(
                "active content version {version_id} is a {} resource",
                version.kind
            )));
        }
        if !self
            .controller
            .is_application_resource(application, &version)
            .await?
        {
            return Err(CanopyError::validation(format!(
                "resource {version_id} does not belong to application {}",
                application.id
            )));
        }

        self.export_subtree(version).await
    }

    /// Exports one content version of the application, addressed by its
    /// slug below the root.
    pub async fn export_content_version(
        &self,
        application: &Application,
        slug: &str,
    ) -> CanopyResult<WallApplication> {
        let root = self.application_root(application).await?;
        let version = self
            .controller
            .find_child_by_slug(&root, slug, Some(ResourceKind::ContentVersion))
            .await?
            .ok_or_else(|| CanopyError::NotFound {
                entity: "content version".into(),
                id: slug.to_string(),
            })?;

        self.export_subtree(version).await
    }

    /// Translates one node and everything below it.
    pub fn translate(&self, resource: Resource) -> BoxFuture<'_, CanopyResult<WallResource>> {
        Box::pin(async move {
            let properties = self.controller.list_properties(&resource).await?;
            let styles = self.controller.list_styles(&resource).await?;

            let mut children = Vec::new();
            for child in self
                .controller
                .list_resources_by_parent(&resource, None)
                .await?
            {
                children.push(self.translate(child).await?);
            }

            Ok(WallResource {
                kind: resource.kind,
                name: resource.name,
                slug: resource.slug,
                data: resource.data,
                properties: flatten(properties),
                styles: flatten(styles),
                children,
                modified_at: resource.modified_at,
            })
        })
    }

    async fn export_subtree(&self, root: Resource) -> CanopyResult<WallApplication> {
        let root_id = root.id;
        let root = self.translate(root).await?;
        let modified_at = latest_modification(&root);

        debug!(resource_id = %root_id, %modified_at, "Exported wall tree");

        Ok(WallApplication { root, modified_at })
    }

    async fn application_root(&self, application: &Application) -> CanopyResult<Resource> {
        self.controller
            .find_resource_by_id(application.root_resource_id)
            .await?
            .ok_or_else(|| {
                CanopyError::validation(format!(
                    "application {} has no root resource",
                    application.id
                ))
            })
    }
}

/// Key uniqueness within a set makes this lossless.
fn flatten(entries: Vec<Annotation>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|entry| (entry.key, entry.value))
        .collect()
}

/// Most recent `modified_at` over a node and all of its descendants.
pub fn latest_modification(root: &WallResource) -> DateTime<Utc> {
    let mut times = Vec::new();
    root.walk(&mut |node| times.push(node.modified_at));
    times.into_iter().max().unwrap_or(root.modified_at)
}
