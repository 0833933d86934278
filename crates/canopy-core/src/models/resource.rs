//! Resource domain model.
//!
//! A resource is one node of an application's content tree. Nodes only
//! know their parent; child lists are derived by querying on `parent_id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CanopyError;
use crate::models::annotation::KeyValue;

/// Closed set of node kinds. Adding a kind is a schema change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Root,
    ContentVersion,
    Intro,
    Language,
    Menu,
    Page,
    Slideshow,
    SlideshowPdf,
    Text,
    Image,
    Video,
    Pdf,
    ApplicationIcon,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Root,
        ResourceKind::ContentVersion,
        ResourceKind::Intro,
        ResourceKind::Language,
        ResourceKind::Menu,
        ResourceKind::Page,
        ResourceKind::Slideshow,
        ResourceKind::SlideshowPdf,
        ResourceKind::Text,
        ResourceKind::Image,
        ResourceKind::Video,
        ResourceKind::Pdf,
        ResourceKind::ApplicationIcon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Root => "ROOT",
            ResourceKind::ContentVersion => "CONTENT_VERSION",
            ResourceKind::Intro => "INTRO",
            ResourceKind::Language => "LANGUAGE",
            ResourceKind::Menu => "MENU",
            ResourceKind::Page => "PAGE",
            ResourceKind::Slideshow => "SLIDESHOW",
            ResourceKind::SlideshowPdf => "SLIDESHOW_PDF",
            ResourceKind::Text => "TEXT",
            ResourceKind::Image => "IMAGE",
            ResourceKind::Video => "VIDEO",
            ResourceKind::Pdf => "PDF",
            ResourceKind::ApplicationIcon => "APPLICATION_ICON",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CanopyError::validation(format!("unknown resource kind: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    /// `None` only for the root node of an application.
    pub parent_id: Option<Uuid>,
    pub order_number: i64,
    pub kind: ResourceKind,
    pub name: String,
    pub slug: String,
    /// Payload interpreted according to `kind` (content URL, inline text).
    pub data: Option<String>,
    /// Entry id in the external authorization registry.
    pub external_authorization_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub creator_id: Uuid,
    pub last_modifier_id: Uuid,
}

/// Fields required to insert a resource row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResource {
    /// Pre-allocated id. The store generates one when `None`.
    pub id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub order_number: i64,
    pub kind: ResourceKind,
    pub name: String,
    pub slug: String,
    pub data: Option<String>,
    pub external_authorization_id: Uuid,
    pub creator_id: Uuid,
}

/// Scalar fields that can be updated on an existing resource.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateResource {
    pub order_number: Option<i64>,
    pub kind: Option<ResourceKind>,
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub data: Option<Option<String>>,
    /// Re-parent within the same tree. The root can not be re-parented.
    pub parent_id: Option<Uuid>,
}

impl UpdateResource {
    pub fn is_empty(&self) -> bool {
        self.order_number.is_none()
            && self.kind.is_none()
            && self.name.is_none()
            && self.slug.is_none()
            && self.data.is_none()
            && self.parent_id.is_none()
    }
}

/// Caller input for creating a node together with its annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewResource {
    pub order_number: i64,
    pub kind: ResourceKind,
    pub name: String,
    pub slug: String,
    pub data: Option<String>,
    pub properties: Vec<KeyValue>,
    pub styles: Vec<KeyValue>,
}

/// Caller input for updating a node. `properties` and `styles` are the
/// complete desired sets; keys missing from them are removed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResourceChanges {
    pub fields: UpdateResource,
    pub properties: Vec<KeyValue>,
    pub styles: Vec<KeyValue>,
}
