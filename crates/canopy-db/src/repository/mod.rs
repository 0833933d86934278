//! SurrealDB repository implementations.

mod annotation;
mod device_meta;
mod registry;
mod resource;

pub use device_meta::SurrealDeviceMetaRepository;
pub use registry::{RegistryConfig, SurrealAuthorizationRegistry};
pub use resource::SurrealResourceRepository;
