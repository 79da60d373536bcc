//! Primitive collision shapes and intersection algorithms
//!
//! All tests treat touching as intersecting.

use crate::foundation::math::Vec3;

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in universe space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if a point lies inside or on the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).magnitude_squared() <= self.radius * self.radius
    }
}

/// An oriented bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Box center in universe space
    pub center: Vec3,
    /// Unit local axes in universe space
    pub axes: [Vec3; 3],
    /// Half size along each local axis
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Creates a new oriented box
    pub const fn new(center: Vec3, axes: [Vec3; 3], half_extents: Vec3) -> Self {
        Self {
            center,
            axes,
            half_extents,
        }
    }

    /// Axis-aligned box around `center`
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, [Vec3::x(), Vec3::y(), Vec3::z()], half_extents)
    }

    /// Closest point on or inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        let mut closest = self.center;
        for (axis, half) in self.axes.iter().zip(self.half_extents.iter()) {
            let distance = offset.dot(axis).clamp(-half, *half);
            closest += axis * distance;
        }
        closest
    }

    /// Test overlap with a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        sphere.contains_point(self.closest_point(sphere.center))
    }

    /// Extent of the box projected onto a unit `axis`
    fn projected_radius(&self, axis: &Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.half_extents.iter())
            .map(|(box_axis, half)| box_axis.dot(axis).abs() * half)
            .sum()
    }

    /// Test overlap with another box
    /// Uses the Separating Axis Theorem over 15 candidate axes:
    /// - 3 face normals per box
    /// - 9 edge-edge cross products
    pub fn intersects_box(&self, other: &Self) -> bool {
        const EPSILON: f32 = 0.000_001;

        let between = other.center - self.center;

        // Returns false if `axis` separates the boxes
        let test_axis = |axis: Vec3| -> bool {
            let length_squared = axis.magnitude_squared();
            if length_squared < EPSILON {
                return true; // Degenerate axis (parallel edges), skip
            }
            let axis = axis / length_squared.sqrt();
            let distance = between.dot(&axis).abs();
            distance <= self.projected_radius(&axis) + other.projected_radius(&axis)
        };

        for axis in self.axes.iter().chain(other.axes.iter()) {
            if !test_axis(*axis) {
                return false;
            }
        }

        for edge_a in &self.axes {
            for edge_b in &other.axes {
                if !test_axis(edge_a.cross(edge_b)) {
                    return false;
                }
            }
        }

        // No separating axis found
        true
    }
}
