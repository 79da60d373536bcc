//! Math types for scene payloads and collision tests
//!
//! Every matrix handed to the collision engine is universe-from-local: it
//! maps a node's local frame into the shared universe frame.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Unit quaternion for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Local transform carried by a `Transform` scene node
///
/// Applied in scale, rotate, translate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Translation relative to the parent
    pub position: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Per-axis scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }
}

impl Transform {
    /// Pure translation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Translation plus rotation, unit scale
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Replace the scale factors
    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Parent-from-local matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Frame data read back out of an affine `Mat4`
pub trait Mat4Ext {
    /// Translation column of the matrix
    fn translation_part(&self) -> Vec3;

    /// Basis column `index` (0 = x, 1 = y, 2 = z) including any scale
    fn basis_column(&self, index: usize) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }

    fn basis_column(&self, index: usize) -> Vec3 {
        Vec3::new(self[(0, index)], self[(1, index)], self[(2, index)])
    }
}
