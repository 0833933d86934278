//! Application model.
//!
//! Applications are owned by devices, which are owned by customers. The
//! content of an application is the resource tree below its root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub device_id: Uuid,
    /// The `Root` resource of the application's content tree.
    pub root_resource_id: Uuid,
    /// The `ContentVersion` below the root that display clients are
    /// served.
    pub active_content_version_id: Option<Uuid>,
    pub name: String,
    pub modified_at: DateTime<Utc>,
}
