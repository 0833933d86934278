//! SurrealDB implementation of [`ResourceRepository`].

use canopy_core::error::{CanopyError, CanopyResult};
use canopy_core::models::annotation::{Annotation, AnnotationPlan, AnnotationSet};
use canopy_core::models::resource::{CreateResource, Resource, ResourceKind, UpdateResource};
use canopy_core::repository::ResourceRepository;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::annotation::{self, AnnotationRowWithId, AnnotationWrites};
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ResourceRowWithId {
    record_id: String,
    parent_id: Option<String>,
    order_number: i64,
    kind: String,
    name: String,
    slug: String,
    payload: Option<String>,
    external_authorization_id: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    creator_id: String,
    last_modifier_id: String,
}

impl ResourceRowWithId {
    fn try_into_resource(self) -> Result<Resource, DbError> {
        let parent_id = self
            .parent_id
            .map(|p| parse_uuid(&p, "parent"))
            .transpose()?;
        let kind = self
            .kind
            .parse::<ResourceKind>()
            .map_err(|e| DbError::Decode(e.to_string()))?;
        Ok(Resource {
            id: parse_uuid(&self.record_id, "resource")?,
            parent_id,
            order_number: self.order_number,
            kind,
            name: self.name,
            slug: self.slug,
            data: self.payload,
            external_authorization_id: parse_uuid(
                &self.external_authorization_id,
                "authorization",
            )?,
            created_at: self.created_at,
            modified_at: self.modified_at,
            creator_id: parse_uuid(&self.creator_id, "creator")?,
            last_modifier_id: parse_uuid(&self.last_modifier_id, "modifier")?,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select_rows(
        &self,
        query: &str,
        binds: Vec<(&'static str, String)>,
    ) -> Result<Vec<Resource>, DbError> {
        let mut builder = self.db.query(query);
        for bind in binds {
            builder = builder.bind(bind);
        }
        let mut result = builder.await?;
        let rows: Vec<ResourceRowWithId> = result.take(0)?;
        rows.into_iter()
            .map(ResourceRowWithId::try_into_resource)
            .collect()
    }

    async fn require(&self, id: Uuid) -> CanopyResult<Resource> {
        self.find_by_id(id).await?.ok_or_else(|| CanopyError::NotFound {
            entity: "resource".into(),
            id: id.to_string(),
        })
    }

    async fn child_count(&self, id: Uuid) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resource \
                 WHERE parent_id = $parent_id GROUP ALL",
            )
            .bind(("parent_id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, input: CreateResource, plan: AnnotationPlan) -> CanopyResult<Resource> {
        if let Some(parent_id) = input.parent_id
            && self.find_by_id(parent_id).await?.is_none()
        {
            return Err(CanopyError::validation(format!(
                "parent resource {parent_id} does not exist"
            )));
        }

        let id = input.id.unwrap_or_else(Uuid::new_v4);
        let id_str = id.to_string();
        let actor = input.creator_id.to_string();
        let properties = AnnotationWrites::from_ops(plan.properties);
        let styles = AnnotationWrites::from_ops(plan.styles);

        // Node row and its annotations commit together.
        let query = format!(
            "BEGIN TRANSACTION; \
             CREATE type::record('resource', $owner_id) SET \
             parent_id = $parent_id, order_number = $order_number, \
             kind = $kind, name = $name, slug = $slug, payload = $payload, \
             external_authorization_id = $external_authorization_id, \
             creator_id = $actor_id, last_modifier_id = $actor_id; \
             {} {} \
             COMMIT TRANSACTION;",
            annotation::write_statements(AnnotationSet::Property, "property"),
            annotation::write_statements(AnnotationSet::Style, "style"),
        );

        self.db
            .query(query)
            .bind(("owner_id", id_str.clone()))
            .bind(("actor_id", actor))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("order_number", input.order_number))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("payload", input.data))
            .bind((
                "external_authorization_id",
                input.external_authorization_id.to_string(),
            ))
            .bind(("property_creates", properties.creates))
            .bind(("property_updates", properties.updates))
            .bind(("property_deletes", properties.deletes))
            .bind(("style_creates", styles.creates))
            .bind(("style_updates", styles.updates))
            .bind(("style_deletes", styles.deletes))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(resource_id = %id, kind = %input.kind, "Created resource");

        self.find_by_id(id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "resource".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn find_by_id(&self, id: Uuid) -> CanopyResult<Option<Resource>> {
        let rows = self
            .select_rows(
                "SELECT meta::id(id) AS record_id, * FROM type::record('resource', $id)",
                vec![("id", id.to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_children(
        &self,
        parent_id: Uuid,
        kind: Option<ResourceKind>,
    ) -> CanopyResult<Vec<Resource>> {
        let mut binds = vec![("parent_id", parent_id.to_string())];
        let kind_filter = match kind {
            Some(kind) => {
                binds.push(("kind", kind.as_str().to_string()));
                " AND kind = $kind"
            }
            None => "",
        };

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM resource \
             WHERE parent_id = $parent_id{kind_filter} \
             ORDER BY order_number ASC, record_id ASC"
        );

        Ok(self.select_rows(&query, binds).await?)
    }

    async fn find_child_by_slug(
        &self,
        parent_id: Uuid,
        slug: &str,
        kind: Option<ResourceKind>,
    ) -> CanopyResult<Option<Resource>> {
        let mut binds = vec![
            ("parent_id", parent_id.to_string()),
            ("slug", slug.to_string()),
        ];
        let kind_filter = match kind {
            Some(kind) => {
                binds.push(("kind", kind.as_str().to_string()));
                " AND kind = $kind"
            }
            None => "",
        };

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM resource \
             WHERE parent_id = $parent_id AND slug = $slug{kind_filter} \
             ORDER BY order_number ASC, record_id ASC LIMIT 1"
        );

        let rows = self.select_rows(&query, binds).await?;
        Ok(rows.into_iter().next())
    }

    async fn update(
        &self,
        id: Uuid,
        input: UpdateResource,
        plan: AnnotationPlan,
        actor_id: Uuid,
    ) -> CanopyResult<Resource> {
        let existing = self.require(id).await?;

        if let Some(parent_id) = input.parent_id {
            if existing.parent_id.is_none() {
                return Err(CanopyError::validation("the root resource has no parent"));
            }
            if self.find_by_id(parent_id).await?.is_none() {
                return Err(CanopyError::validation(format!(
                    "parent resource {parent_id} does not exist"
                )));
            }
        }

        let mut sets = Vec::new();
        if input.order_number.is_some() {
            sets.push("order_number = $order_number");
        }
        if input.kind.is_some() {
            sets.push("kind = $kind");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.data.is_some() {
            sets.push("payload = $payload");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        sets.push("modified_at = time::now()");
        sets.push("last_modifier_id = $actor_id");

        let properties = AnnotationWrites::from_ops(plan.properties);
        let styles = AnnotationWrites::from_ops(plan.styles);

        let query = format!(
            "BEGIN TRANSACTION; \
             UPDATE type::record('resource', $owner_id) SET {}; \
             {} {} \
             COMMIT TRANSACTION;",
            sets.join(", "),
            annotation::write_statements(AnnotationSet::Property, "property"),
            annotation::write_statements(AnnotationSet::Style, "style"),
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("owner_id", id.to_string()))
            .bind(("actor_id", actor_id.to_string()))
            .bind(("property_creates", properties.creates))
            .bind(("property_updates", properties.updates))
            .bind(("property_deletes", properties.deletes))
            .bind(("style_creates", styles.creates))
            .bind(("style_updates", styles.updates))
            .bind(("style_deletes", styles.deletes));

        if let Some(order_number) = input.order_number {
            builder = builder.bind(("order_number", order_number));
        }
        if let Some(kind) = input.kind {
            builder = builder.bind(("kind", kind.as_str().to_string()));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(payload) = input.data {
            builder = builder.bind(("payload", payload));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", Some(parent_id.to_string())));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(resource_id = %id, "Updated resource");

        self.require(id).await
    }

    async fn list_annotations(
        &self,
        resource_id: Uuid,
        set: AnnotationSet,
    ) -> CanopyResult<Vec<Annotation>> {
        if set == AnnotationSet::DeviceMeta {
            return Err(CanopyError::Internal(
                "device metas are not resource annotations".into(),
            ));
        }

        let mut result = self
            .db
            .query(annotation::select_by_owner(set))
            .bind(("owner_id", resource_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnnotationRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(AnnotationRowWithId::try_into_annotation)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn delete_annotations(&self, resource_id: Uuid) -> CanopyResult<()> {
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE resource_property WHERE owner_id = $owner_id; \
                 DELETE resource_style WHERE owner_id = $owner_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("owner_id", resource_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CanopyResult<()> {
        let children = self.child_count(id).await?;
        if children > 0 {
            return Err(CanopyError::integrity(format!(
                "resource {id} still has {children} child resource(s)"
            )));
        }

        self.db
            .query("DELETE type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(resource_id = %id, "Deleted resource row");

        Ok(())
    }
}
