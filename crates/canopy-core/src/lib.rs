//! Canopy Core: domain models, repository traits and the annotation
//! reconciler shared by every Canopy crate.
//!
//! Nothing in here talks to a database or the network. Storage lives
//! behind the traits in [`repository`], the authorization registry behind
//! [`registry::AuthorizationRegistry`].

pub mod error;
pub mod models;
pub mod reconcile;
pub mod registry;
pub mod repository;

pub use error::{CanopyError, CanopyResult};
