//! Wall export model: the denormalized, read-only projection of an
//! application's resource tree handed to display clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resource::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WallResource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub name: String,
    pub slug: String,
    pub data: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub children: Vec<WallResource>,
    pub modified_at: DateTime<Utc>,
}

impl WallResource {
    /// Visits this node and every descendant, depth-first, pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a WallResource)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WallApplication {
    pub root: WallResource,
    /// Most recent modification time across the whole exported tree.
    pub modified_at: DateTime<Utc>,
}
