//! Per-camera visibility determination
//!
//! A read-only camera abstraction, frustum plane extraction, and the
//! generic frustum culler the per-kind data managers build on.

pub mod camera;
pub mod culler;
pub mod frustum;

pub use camera::{CameraState, Projection, StereoMode};
pub use culler::FrustumCuller;
pub use frustum::{Frustum, Plane};
