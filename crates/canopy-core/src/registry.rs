//! Contract with the external authorization registry.
//!
//! Every resource node has exactly one protected-resource entry in the
//! registry. The registry's own access scoping is driven by the owner
//! path, so the path must address customer, device, application and node.

use std::fmt;

use uuid::Uuid;

use crate::error::CanopyResult;
use crate::models::application::Application;

/// Addressing of a resource node inside the customer hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerPath {
    pub customer_id: Uuid,
    pub device_id: Uuid,
    pub application_id: Uuid,
    pub resource_id: Uuid,
}

impl OwnerPath {
    pub fn new(application: &Application, resource_id: Uuid) -> Self {
        Self {
            customer_id: application.customer_id,
            device_id: application.device_id,
            application_id: application.id,
            resource_id,
        }
    }

    /// The URI the registry uses to identify the protected resource.
    pub fn uri(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for OwnerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/v1/{}/devices/{}/applications/{}/resources/{}",
            self.customer_id, self.device_id, self.application_id, self.resource_id
        )
    }
}

/// Result of a register call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub external_id: Uuid,
    /// `false` when the owner path was already registered and the existing
    /// entry was handed back. Such an entry must not be rolled back.
    pub created: bool,
}

pub trait AuthorizationRegistry: Send + Sync {
    /// Registers a protected resource for `owner`.
    ///
    /// Failures are reported as [`crate::CanopyError::Registry`].
    fn register(
        &self,
        owner: &OwnerPath,
        actor_id: Uuid,
    ) -> impl Future<Output = CanopyResult<Registration>> + Send;

    /// Removes a protected resource entry.
    fn deregister(&self, external_id: Uuid) -> impl Future<Output = CanopyResult<()>> + Send;
}
