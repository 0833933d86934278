//! Domain models for Canopy.

pub mod annotation;
pub mod application;
pub mod resource;
pub mod wall;
