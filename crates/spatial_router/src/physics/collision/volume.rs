//! Local-space volumes and their universe-space form
//!
//! A [`Volume`] is what a client attaches to a grabber, handle, or hook
//! node. The host pairs it with the node's universe-from-local matrix when
//! feeding the collision engine, producing a temporary [`WorldVolume`].

use serde::{Deserialize, Serialize};

use super::primitives::{BoundingSphere, OrientedBox};
use crate::error::CollisionError;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Collision volume in the node's local frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Volume {
    /// Sphere centered on the node origin. The radius is in universe units
    /// and is not scaled by the node transform.
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Box centered on the node origin, scaled and rotated by the node transform
    Box {
        /// Half size along each local axis
        half_extents: Vec3,
    },
}

impl Volume {
    /// Creates a spherical volume
    pub const fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Creates a box volume from its half extents
    pub const fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    /// Reject negative or non-finite dimensions
    pub fn validate(&self) -> Result<(), CollisionError> {
        let valid = |value: f32| value.is_finite() && value >= 0.0;
        match self {
            Self::Sphere { radius } if !valid(*radius) => {
                Err(CollisionError::InvalidVolume(format!("sphere radius {radius}")))
            }
            Self::Box { half_extents } if !half_extents.iter().all(|v| valid(*v)) => {
                Err(CollisionError::InvalidVolume(format!("box half extents {half_extents:?}")))
            }
            _ => Ok(()),
        }
    }

    /// Transform this volume to universe space
    pub fn to_world_space(&self, universe_from_local: &Mat4) -> Result<WorldVolume, CollisionError> {
        self.validate()?;
        let center = universe_from_local.translation_part();
        if !center.iter().all(|v| v.is_finite()) {
            return Err(CollisionError::InvalidVolume(format!("transform translation {center:?}")));
        }

        Ok(match self {
            Self::Sphere { radius } => WorldVolume::Sphere(BoundingSphere::new(center, *radius)),
            Self::Box { half_extents } => {
                const EPSILON: f32 = 0.000_001;
                let basis = [Vec3::x(), Vec3::y(), Vec3::z()];
                let mut axes = basis;
                let mut world_half = Vec3::zeros();
                for i in 0..3 {
                    let column = universe_from_local.basis_column(i);
                    let scale = column.magnitude();
                    // A collapsed axis keeps the local basis direction with zero extent
                    if scale > EPSILON {
                        axes[i] = column / scale;
                        world_half[i] = half_extents[i] * scale;
                    }
                }
                WorldVolume::Box(OrientedBox::new(center, axes, world_half))
            }
        })
    }
}

/// Universe-space volume (temporary, for testing only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldVolume {
    /// Universe-space sphere
    Sphere(BoundingSphere),
    /// Universe-space oriented box
    Box(OrientedBox),
}

impl WorldVolume {
    /// Get center position
    pub const fn center(&self) -> Vec3 {
        match self {
            Self::Sphere(sphere) => sphere.center,
            Self::Box(obb) => obb.center,
        }
    }

    /// Test if this volume intersects with another volume
    ///
    /// Symmetric: `a.intersects(b) == b.intersects(a)`.
    pub fn intersects(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Sphere(a), Self::Sphere(b)) => a.intersects(b),

            (Self::Sphere(sphere), Self::Box(obb)) | (Self::Box(obb), Self::Sphere(sphere)) => {
                obb.intersects_sphere(sphere)
            }

            (Self::Box(a), Self::Box(b)) => a.intersects_box(b),
        }
    }
}
