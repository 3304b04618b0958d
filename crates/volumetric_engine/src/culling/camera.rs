//! Read-only camera abstraction
//!
//! The pipeline consumes a snapshot of the driving camera once per frame
//! and never mutates it.

use nalgebra::{Orthographic3, Perspective3};

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Stereo rendering mode of the consuming camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoMode {
    /// No stereo rendering
    None,
    /// One pass per eye; the pipeline runs once per pass
    MultiPass,
    /// Both eyes in a single pass; kernel variants carry a fixed offset
    SinglePass,
}

/// Camera projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection
    Perspective {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Width over height
        aspect: f32,
    },
    /// Orthographic projection
    Orthographic {
        /// Half of the vertical view size
        half_height: f32,
        /// Width over height
        aspect: f32,
    },
}

/// Per-frame snapshot of the driving camera
#[derive(Debug, Clone)]
pub struct CameraState {
    /// World-space position
    pub position: Vec3,
    /// Normalized view direction
    pub forward: Vec3,
    /// Normalized up vector
    pub up: Vec3,
    /// Projection parameters
    pub projection: Projection,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Stereo rendering mode
    pub stereo: StereoMode,
}

impl CameraState {
    /// Create a perspective camera looking along `forward`
    ///
    /// `fov_y_degrees` is converted to radians; up is world Y.
    pub fn perspective(
        position: Vec3,
        forward: Vec3,
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            forward: forward.normalize(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
                aspect,
            },
            near,
            far,
            stereo: StereoMode::None,
        }
    }

    /// Create an orthographic camera looking along `forward`
    pub fn orthographic(
        position: Vec3,
        forward: Vec3,
        half_height: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            forward: forward.normalize(),
            up: Vec3::new(0.0, 1.0, 0.0),
            projection: Projection::Orthographic { half_height, aspect },
            near,
            far,
            stereo: StereoMode::None,
        }
    }

    /// Set the stereo mode
    pub fn with_stereo(mut self, stereo: StereoMode) -> Self {
        self.stereo = stereo;
        self
    }

    /// Whether the camera projects orthographically
    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// View matrix of the camera
    pub fn view_matrix(&self) -> Mat4 {
        let eye = Point3::from(self.position);
        let target = Point3::from(self.position + self.forward);
        Mat4::look_at_rh(&eye, &target, &self.up)
    }

    /// Projection matrix with the far plane overridden to `far` units
    pub fn projection_matrix(&self, far: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Perspective3::new(aspect, fov_y, self.near, far).to_homogeneous()
            }
            Projection::Orthographic { half_height, aspect } => {
                let half_width = half_height * aspect;
                Orthographic3::new(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    far,
                )
                .to_homogeneous()
            }
        }
    }

    /// Combined view-projection matrix with an overridden far plane
    pub fn view_projection(&self, far: f32) -> Mat4 {
        self.projection_matrix(far) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_is_normalized() {
        let camera = CameraState::perspective(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 10.0),
            60.0,
            16.0 / 9.0,
            0.1,
            1000.0,
        );
        assert_relative_eq!(camera.forward.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orthographic_flag() {
        let persp = CameraState::perspective(Vec3::zeros(), Vec3::z(), 60.0, 1.0, 0.1, 100.0);
        let ortho = CameraState::orthographic(Vec3::zeros(), Vec3::z(), 10.0, 1.0, 0.1, 100.0);
        assert!(!persp.is_orthographic());
        assert!(ortho.is_orthographic());
    }
}
