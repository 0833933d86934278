//! Key/value annotation model.
//!
//! Properties and styles hang off resources, metas off devices. Every
//! entry is its own persisted record so an update can target a single
//! key without rewriting the whole set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The annotation set an entry belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AnnotationSet {
    Property,
    Style,
    DeviceMeta,
}

/// A key/value pair as supplied by a caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A stored annotation entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Annotation {
    pub id: Uuid,
    /// Resource id for properties and styles, device id for metas.
    pub owner_id: Uuid,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub creator_id: Uuid,
    pub last_modifier_id: Uuid,
}

/// One write produced by [`crate::reconcile::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOp {
    Create { key: String, value: String },
    /// Value change on an existing entry; the entry keeps its id.
    Update { id: Uuid, key: String, value: String },
    Delete { id: Uuid, key: String },
}

/// Reconciled writes for both annotation sets of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationPlan {
    pub properties: Vec<AnnotationOp>,
    pub styles: Vec<AnnotationOp>,
}

impl AnnotationPlan {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.styles.is_empty()
    }
}
