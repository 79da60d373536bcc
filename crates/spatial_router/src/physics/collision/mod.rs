//! Collision geometry
//!
//! # Architecture
//!
//! - **Model Space Storage**: [`Volume`]s are described in the node's local frame
//! - **On-Demand Transformation**: a universe-from-local matrix turns them into
//!   a [`WorldVolume`] when an entity is added to a collision pass
//!
//! # Module Organization
//!
//! - [`primitives`] - Spheres and oriented boxes with their overlap tests
//! - [`volume`] - Local-space volumes and world-space dispatch

pub mod primitives;
pub mod volume;

pub use primitives::{BoundingSphere, OrientedBox};
pub use volume::{Volume, WorldVolume};
