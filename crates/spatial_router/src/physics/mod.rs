//! Physics module for grabber / grabbable / hook intersection detection
//!
//! Detection only: the engine reports which volumes overlap each frame and
//! never computes a response.

pub mod collision;
pub mod collision_engine;

pub use collision::{BoundingSphere, OrientedBox, Volume, WorldVolume};
pub use collision_engine::{CollisionEngine, CollisionPhase, GrabberResult};
