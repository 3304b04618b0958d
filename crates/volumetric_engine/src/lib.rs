//! # Volumetric Engine
//!
//! A per-frame volumetric lighting and fog data pipeline.
//!
//! Once per rendered frame the pipeline gathers the set of lights and fog
//! volumes visible to a camera, packs them into GPU buffers sized exactly to
//! the visible count, derives a feature bitmask describing which optional
//! compute stages apply this frame, and manages double-buffered intermediate
//! textures for temporal reprojection. The numerical compute kernels
//! themselves live behind the [`gpu::ComputeBackend`] boundary.
//!
//! ## Quick Start
//!
//! ```rust
//! use volumetric_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut backend = HeadlessBackend::new();
//!     let mut pipeline = VolumetricPipeline::new();
//!
//!     let quality = QualitySettings::default();
//!     let environment = EnvironmentSettings::default();
//!     pipeline.initialize(&mut backend, &quality)?;
//!
//!     pipeline.registry_mut().register_point(PointLight::new(
//!         Vec3::new(0.0, 2.0, 5.0),
//!         Vec3::new(1.0, 0.9, 0.7),
//!         1.0,
//!         10.0,
//!     ));
//!
//!     let camera = CameraState::perspective(
//!         Vec3::zeros(),
//!         Vec3::new(0.0, 0.0, 1.0),
//!         60.0,
//!         16.0 / 9.0,
//!         0.1,
//!         1000.0,
//!     );
//!     pipeline.render_frame(&mut backend, &camera, &quality, &environment)?;
//!
//!     pipeline.uninitialize(&mut backend);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod core;
pub mod culling;
pub mod registry;
pub mod lights;
pub mod gpu;
pub mod frame;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        core::config::{CascadeCount, Config, ConfigError, EnvironmentSettings, QualitySettings},
        culling::{CameraState, Frustum, FrustumCuller, Projection, StereoMode},
        foundation::math::{BoundingSphere, Mat4, Vec3, Vec4},
        frame::{FeatureFlags, FrameStats, PipelineError, VolumetricPipeline},
        gpu::{BufferHandle, ComputeBackend, Extent3d, HeadlessBackend, TextureHandle},
        lights::{DirectionalLight, FogVolume, PointLight, SpotLight},
        registry::{CommonDataRegistry, EntityKind, RegistryEvent, SubscriptionToken},
    };
}
