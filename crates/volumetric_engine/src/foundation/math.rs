//! Math utilities and types
//!
//! Provides fundamental math types for the volumetric pipeline.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Bounding sphere approximating an entity's spatial extent for fast
/// overlap tests
///
/// The owning entity is responsible for keeping the sphere in sync with its
/// world transform before each culling pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center in world space
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a bounding sphere from center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Create a degenerate sphere containing a single point
    pub fn point(center: Vec3) -> Self {
        Self { center, radius: 0.0 }
    }

    /// Create a sphere that overlaps every frustum
    ///
    /// Used by directional lights, which have no spatial extent and must
    /// always survive culling.
    pub fn unbounded() -> Self {
        Self {
            center: Vec3::zeros(),
            radius: f32::INFINITY,
        }
    }
}

/// Convert a matrix into four row vectors for GPU upload
///
/// Packed parameter records transport 4x4 matrices as four contiguous
/// vec4 rows so compute kernels can reconstruct them without caring about
/// the CPU-side storage order.
pub fn mat4_to_rows(m: &Mat4) -> [[f32; 4]; 4] {
    let mut rows = [[0.0_f32; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_sphere_radius() {
        let sphere = BoundingSphere::unbounded();
        assert!(sphere.radius.is_infinite());
    }

    #[test]
    fn test_mat4_to_rows_layout() {
        let m = Mat4::new(
            1.0, 2.0, 3.0, 4.0,
            5.0, 6.0, 7.0, 8.0,
            9.0, 10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        );
        let rows = mat4_to_rows(&m);
        assert_eq!(rows[0], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(rows[3], [13.0, 14.0, 15.0, 16.0]);
    }
}
