//! Row mapping and batched writes shared by the key/value tables
//! (`resource_property`, `resource_style`, `device_meta`).

use canopy_core::models::annotation::{Annotation, AnnotationOp, AnnotationSet};
use chrono::{DateTime, Utc};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

pub(crate) fn table(set: AnnotationSet) -> &'static str {
    match set {
        AnnotationSet::Property => "resource_property",
        AnnotationSet::Style => "resource_style",
        AnnotationSet::DeviceMeta => "device_meta",
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct AnnotationRowWithId {
    record_id: String,
    owner_id: String,
    entry_key: String,
    entry_value: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    creator_id: String,
    last_modifier_id: String,
}

impl AnnotationRowWithId {
    pub(crate) fn try_into_annotation(self) -> Result<Annotation, DbError> {
        Ok(Annotation {
            id: parse_uuid(&self.record_id, "annotation")?,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            key: self.entry_key,
            value: self.entry_value,
            created_at: self.created_at,
            modified_at: self.modified_at,
            creator_id: parse_uuid(&self.creator_id, "creator")?,
            last_modifier_id: parse_uuid(&self.last_modifier_id, "modifier")?,
        })
    }
}

pub(crate) fn select_by_owner(set: AnnotationSet) -> String {
    format!(
        "SELECT meta::id(id) AS record_id, * FROM {} \
         WHERE owner_id = $owner_id ORDER BY entry_key ASC",
        table(set)
    )
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct EntryWrite {
    id: String,
    key: String,
    value: String,
}

/// Reconciled operations split by statement type so each kind can be
/// bound as one array parameter.
#[derive(Debug, Default)]
pub(crate) struct AnnotationWrites {
    pub creates: Vec<EntryWrite>,
    pub updates: Vec<EntryWrite>,
    pub deletes: Vec<String>,
}

impl AnnotationWrites {
    pub(crate) fn from_ops(ops: Vec<AnnotationOp>) -> Self {
        let mut writes = Self::default();
        for op in ops {
            match op {
                AnnotationOp::Create { key, value } => writes.creates.push(EntryWrite {
                    id: Uuid::new_v4().to_string(),
                    key,
                    value,
                }),
                AnnotationOp::Update { id, key, value } => writes.updates.push(EntryWrite {
                    id: id.to_string(),
                    key,
                    value,
                }),
                AnnotationOp::Delete { id, .. } => writes.deletes.push(id.to_string()),
            }
        }
        writes
    }
}

/// Renders the statements applying one set of writes. The caller binds
/// `${prefix}_creates`, `${prefix}_updates`, `${prefix}_deletes`,
/// `$owner_id` and `$actor_id`.
pub(crate) fn write_statements(set: AnnotationSet, prefix: &str) -> String {
    let table = table(set);
    format!(
        "FOR $entry IN ${prefix}_creates {{ \
             CREATE type::record('{table}', $entry.id) SET \
             owner_id = $owner_id, entry_key = $entry.key, \
             entry_value = $entry.value, creator_id = $actor_id, \
             last_modifier_id = $actor_id; \
         }}; \
         FOR $entry IN ${prefix}_updates {{ \
             UPDATE type::record('{table}', $entry.id) SET \
             entry_value = $entry.value, modified_at = time::now(), \
             last_modifier_id = $actor_id; \
         }}; \
         FOR $entry IN ${prefix}_deletes {{ \
             DELETE type::record('{table}', $entry); \
         }};"
    )
}
