//! Canopy Content: orchestration of the resource tree.
//!
//! [`ResourceController`] keeps the tree, its annotations and the
//! authorization registry consistent. [`WallExporter`] projects a tree
//! into the read-only wall format. Both are generic over the
//! `canopy-core` traits, so this crate has no dependency on the database
//! crate.

pub mod controller;
pub mod device;
pub mod wall;

use std::pin::Pin;

pub use controller::ResourceController;
pub use device::DeviceMetaController;
pub use wall::WallExporter;

/// Boxed future used by the recursive tree walks.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
