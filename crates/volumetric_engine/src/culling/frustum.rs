//! Camera frustum plane extraction and sphere overlap tests

use crate::foundation::math::{BoundingSphere, Mat4, Vec3};

use super::camera::CameraState;

/// Plane defined by normal and distance from origin
///
/// Points with a positive signed distance lie on the inside of the plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Build the culling frustum for a camera with a range override
    ///
    /// The camera's far clip plane is replaced by `range_override`, so
    /// entities beyond the pipeline's configured range are excluded even
    /// when the camera itself sees further.
    pub fn from_camera(camera: &CameraState, range_override: f32) -> Self {
        Self::from_matrix(&camera.view_projection(range_override))
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Uses the Gribb-Hartmann method: each plane is a sum or difference
    /// of the matrix's fourth row with one of the other rows.
    pub fn from_matrix(vp: &Mat4) -> Self {
        let row = |i: usize| {
            [vp[(i, 0)], vp[(i, 1)], vp[(i, 2)], vp[(i, 3)]]
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let add = |a: [f32; 4], b: [f32; 4]| {
            [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
        };
        let sub = |a: [f32; 4], b: [f32; 4]| {
            [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
        };

        let planes = [
            add(r3, r0), // left
            sub(r3, r0), // right
            add(r3, r1), // bottom
            sub(r3, r1), // top
            add(r3, r2), // near
            sub(r3, r2), // far
        ]
        .map(|[a, b, c, d]| {
            let normal = Vec3::new(a, b, c);
            let length = normal.norm();
            if length > f32::EPSILON {
                Plane {
                    normal: normal / length,
                    distance: d / length,
                }
            } else {
                // degenerate plane: excludes nothing
                Plane {
                    normal: Vec3::zeros(),
                    distance: 0.0,
                }
            }
        });

        Self { planes }
    }

    /// Check if a bounding sphere overlaps the frustum
    ///
    /// A sphere is excluded as soon as any plane's signed distance to its
    /// center is less than `-radius`.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        for plane in &self.planes {
            if plane.distance_to_point(sphere.center) < -sphere.radius {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> CameraState {
        // camera at origin looking down +Z
        CameraState::perspective(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 1.0),
            60.0,
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }

    #[test]
    fn test_sphere_in_front_is_visible() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0);
        assert!(frustum.intersects_sphere(&sphere));
    }

    #[test]
    fn test_sphere_behind_camera_is_excluded() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, -50.0), 1.0);
        assert!(!frustum.intersects_sphere(&sphere));
    }

    #[test]
    fn test_sphere_beyond_range_override_is_excluded() {
        let camera = test_camera();
        let frustum = Frustum::from_camera(&camera, 100.0);
        // within the camera's own far plane, but beyond the override
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 500.0), 1.0);
        assert!(!frustum.intersects_sphere(&sphere));

        let wide = Frustum::from_camera(&camera, 600.0);
        assert!(wide.intersects_sphere(&sphere));
    }

    #[test]
    fn test_extracted_plane_normals_are_unit_length() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        for plane in &frustum.planes {
            assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_near_zero_radius_sphere_at_apex_is_visible() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        // the pyramid's apex is the camera position, but the near plane
        // truncates the culling volume just in front of it; "apex" here
        // means the near-plane center, the closest point that can lie
        // inside the frustum
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, 0.1), 1e-6);
        assert!(frustum.intersects_sphere(&sphere));

        // at the literal camera position the near plane rejects the sphere
        let at_camera = BoundingSphere::new(Vec3::zeros(), 1e-6);
        assert!(!frustum.intersects_sphere(&at_camera));
    }

    #[test]
    fn test_sphere_far_outside_all_planes_is_excluded() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        let sphere = BoundingSphere::new(Vec3::new(1.0e6, 1.0e6, -1.0e6), 10.0);
        assert!(!frustum.intersects_sphere(&sphere));
    }

    #[test]
    fn test_large_sphere_straddling_plane_is_visible() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        // center behind the camera but radius reaches inside
        let sphere = BoundingSphere::new(Vec3::new(0.0, 0.0, -1.0), 5.0);
        assert!(frustum.intersects_sphere(&sphere));
    }

    #[test]
    fn test_unbounded_sphere_always_visible() {
        let frustum = Frustum::from_camera(&test_camera(), 100.0);
        assert!(frustum.intersects_sphere(&BoundingSphere::unbounded()));
    }

    #[test]
    fn test_orthographic_frustum() {
        let camera = CameraState::orthographic(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 1.0),
            10.0,
            1.0,
            0.1,
            1000.0,
        );
        let frustum = Frustum::from_camera(&camera, 50.0);
        assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 25.0), 1.0)));
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 20.0, 25.0), 1.0)));
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 80.0), 1.0)));
    }
}
