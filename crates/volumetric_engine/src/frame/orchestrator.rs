//! Frame orchestrator
//!
//! Drives the fixed per-frame sequence: apply deferred registry removals
//! and refresh the managers, cull against the camera frustum, reconcile
//! buffer capacities and collect packed records, evaluate the feature
//! mask, dispatch the compute stages, swap the reprojection pairs, and
//! advance the frame counter. A failure anywhere inside the sequence is
//! contained within that frame: the orchestrator logs it, requests a
//! pass-through copy of the untouched input frame, and leaves all
//! persistent state valid for the next attempt.

use thiserror::Error;

use crate::core::config::{EnvironmentSettings, QualitySettings};
use crate::culling::{CameraState, Frustum};
use crate::gpu::{BackendError, ComputeBackend, DispatchArgs, PassKind, TextureHandle, TextureSet};
use crate::lights::managers::{
    DirectionalLightManager, PointLightManager, SpotLightManager, VolumeManager,
};
use crate::registry::CommonDataRegistry;

use super::flags::{compute_flags, resolve_kernel_id, FeatureFlags, KindCandidates};

/// Errors surfaced by the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A per-frame operation was requested before initialization
    #[error("pipeline is not initialized")]
    NotInitialized,

    /// A non-recoverable setup error aborted initialization
    #[error("pipeline initialization failed: {0}")]
    InitializationFailed(String),

    /// A texture required by the dispatch sequence could not be provided
    #[error("required texture '{0}' is unavailable")]
    TextureUnavailable(&'static str),

    /// The compute backend reported an error
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Summary of one rendered frame
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame_index: u64,
    /// Feature mask evaluated for this frame
    pub flags: FeatureFlags,
    /// Kernel variant id bound to this frame's dispatches
    pub kernel_id: u32,
    /// Visible directional lights
    pub visible_directional: usize,
    /// Visible spot lights
    pub visible_spot: usize,
    /// Visible point lights
    pub visible_point: usize,
    /// Visible fog volumes
    pub visible_volumes: usize,
    /// Whether this frame fell back to the pass-through copy
    pub passthrough: bool,
}

/// Per-kind managers and textures owned while the pipeline is initialized
struct FrameResources {
    directional: DirectionalLightManager,
    spot: SpotLightManager,
    point: PointLightManager,
    volumes: VolumeManager,
    textures: TextureSet,
}

/// The volumetric lighting pipeline
///
/// States are Uninitialized and Initialized; per-frame work is only
/// accepted while Initialized. Each pipeline owns its registry, so
/// multiple independent instances never cross-talk.
pub struct VolumetricPipeline {
    registry: CommonDataRegistry,
    resources: Option<FrameResources>,
    frame_index: u64,
    last_flags: FeatureFlags,
}

impl VolumetricPipeline {
    /// Create an uninitialized pipeline with an empty registry
    pub fn new() -> Self {
        Self {
            registry: CommonDataRegistry::new(),
            resources: None,
            frame_index: 0,
            last_flags: FeatureFlags::empty(),
        }
    }

    /// The pipeline's registry
    pub fn registry(&self) -> &CommonDataRegistry {
        &self.registry
    }

    /// The pipeline's registry, for registration and descriptor updates
    pub fn registry_mut(&mut self) -> &mut CommonDataRegistry {
        &mut self.registry
    }

    /// Whether the pipeline has been initialized
    pub fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }

    /// Number of frames rendered since initialization
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Feature mask of the most recent frame
    pub fn last_flags(&self) -> FeatureFlags {
        self.last_flags
    }

    /// Construct per-kind managers and texture state
    ///
    /// Re-entrant safe: initializing an already-initialized pipeline is a
    /// guarded no-op. A setup failure releases everything acquired so far
    /// and leaves the pipeline Uninitialized.
    pub fn initialize(
        &mut self,
        backend: &mut dyn ComputeBackend,
        quality: &QualitySettings,
    ) -> Result<(), PipelineError> {
        if self.resources.is_some() {
            log::warn!("initialize called on an already-initialized pipeline");
            return Ok(());
        }

        let mut resources = FrameResources {
            directional: DirectionalLightManager::new(&mut self.registry),
            spot: SpotLightManager::new(&mut self.registry),
            point: PointLightManager::new(&mut self.registry),
            volumes: VolumeManager::new(&mut self.registry),
            textures: TextureSet::new(),
        };
        resources.textures.set_resolution(backend, quality.volumetric_resolution);
        resources.textures.set_probe_resolution(backend, quality.probe_resolution);

        // warm the empty placeholders so a frame with nothing visible
        // still binds valid buffers
        if let Err(e) = Self::warm_placeholders(backend, &mut resources) {
            log::error!("pipeline initialization aborted: {e}");
            Self::release_resources(backend, &mut resources, &mut self.registry);
            return Err(PipelineError::InitializationFailed(e.to_string()));
        }

        self.resources = Some(resources);
        self.frame_index = 0;
        log::info!("volumetric pipeline initialized");
        Ok(())
    }

    fn warm_placeholders(
        backend: &mut dyn ComputeBackend,
        resources: &mut FrameResources,
    ) -> Result<(), BackendError> {
        resources.directional.bind_handle(backend)?;
        resources.spot.bind_handle(backend)?;
        resources.point.bind_handle(backend)?;
        resources.volumes.bind_handle(backend)?;
        Ok(())
    }

    /// Run the full per-frame sequence
    ///
    /// Any error inside the enhancement sequence is contained: the frame
    /// falls back to a pass-through copy, persistent buffers stay
    /// untouched, and `Ok` is returned with `passthrough` set in the
    /// stats. The only hard error is calling this while Uninitialized.
    pub fn render_frame(
        &mut self,
        backend: &mut dyn ComputeBackend,
        camera: &CameraState,
        quality: &QualitySettings,
        environment: &EnvironmentSettings,
    ) -> Result<FrameStats, PipelineError> {
        let Some(resources) = self.resources.as_mut() else {
            return Err(PipelineError::NotInitialized);
        };
        let frame_number = self.frame_index + 1;

        // sequence start: deferred removals become effective, managers
        // sync their cullers
        self.registry.apply_deferred();
        resources.directional.refresh(&mut self.registry);
        resources.spot.refresh(&mut self.registry);
        resources.point.refresh(&mut self.registry);
        resources.volumes.refresh(&mut self.registry);

        // culling against the far-range-overridden frustum
        let frustum = Frustum::from_camera(camera, quality.far_range);
        resources.directional.cull(&self.registry, &frustum);
        resources.spot.cull(&self.registry, &frustum);
        resources.point.cull(&self.registry, &frustum);
        resources.volumes.cull(&self.registry, &frustum);

        // a resolution change releases dependents before any access
        resources.textures.set_resolution(backend, quality.volumetric_resolution);
        resources.textures.set_probe_resolution(backend, quality.probe_resolution);

        let candidates = KindCandidates {
            directional: resources.directional.has_candidates(),
            spot: resources.spot.has_candidates(),
            point: resources.point.has_candidates(),
            volumes: resources.volumes.has_candidates(),
        };
        let flags = compute_flags(quality, environment, &self.registry, candidates, frame_number);
        let kernel_id = resolve_kernel_id(camera, flags, quality.cascades);

        let passthrough = match Self::dispatch_sequence(
            backend,
            resources,
            &self.registry,
            quality,
            flags,
            kernel_id,
        ) {
            Ok(()) => false,
            Err(e) => {
                log::error!("frame {frame_number}: sequence failed, showing base frame unmodified: {e}");
                if let Err(blit) = backend.copy_passthrough() {
                    log::error!("frame {frame_number}: pass-through copy failed: {blit}");
                }
                true
            }
        };

        resources.textures.swap();
        self.frame_index = frame_number;
        self.last_flags = flags;

        Ok(FrameStats {
            frame_index: frame_number,
            flags,
            kernel_id,
            visible_directional: resources.directional.visible_count(),
            visible_spot: resources.spot.visible_count(),
            visible_point: resources.point.visible_count(),
            visible_volumes: resources.volumes.visible_count(),
            passthrough,
        })
    }

    /// The fallible portion of the frame: buffer reconciliation, record
    /// collection, and the fixed dispatch sequence
    fn dispatch_sequence(
        backend: &mut dyn ComputeBackend,
        resources: &mut FrameResources,
        registry: &CommonDataRegistry,
        quality: &QualitySettings,
        flags: FeatureFlags,
        kernel_id: u32,
    ) -> Result<(), PipelineError> {
        resources.directional.setup_buffers(backend)?;
        resources.spot.setup_buffers(backend)?;
        resources.point.setup_buffers(backend)?;
        resources.volumes.setup_buffers(backend)?;

        resources.directional.collect(backend, registry)?;
        resources.spot.collect(backend, registry)?;
        resources.point.collect(backend, registry)?;
        resources.volumes.collect(backend, registry)?;

        let buffers = [
            resources.directional.bind_handle(backend)?,
            resources.spot.bind_handle(backend)?,
            resources.point.bind_handle(backend)?,
            resources.volumes.bind_handle(backend)?,
        ];

        fn require(
            label: &'static str,
            handle: Option<TextureHandle>,
        ) -> Result<TextureHandle, PipelineError> {
            handle.ok_or(PipelineError::TextureUnavailable(label))
        }

        let mut textures = Vec::with_capacity(7);
        textures.push(require("volumetric_data", resources.textures.current_volumetric(backend))?);
        textures.push(require(
            "volumetric_data_history",
            resources.textures.previous_volumetric(backend),
        )?);
        textures.push(require("accumulated_fog", resources.textures.current_fog(backend))?);
        textures.push(require(
            "accumulated_fog_history",
            resources.textures.previous_fog(backend),
        )?);
        if flags.contains(FeatureFlags::OCCLUSION_CULLING) {
            textures.push(require("occlusion_depth", resources.textures.occlusion_depth(backend))?);
            textures.push(require(
                "occlusion_slice_count",
                resources.textures.occlusion_slice_count(backend),
            )?);
        }
        if flags.contains(FeatureFlags::LIGHT_PROBES) {
            textures.push(require(
                "light_probe_coefficients",
                resources.textures.probe_coefficients(backend),
            )?);
        }

        let args = DispatchArgs {
            kernel_id,
            extent: quality.volumetric_resolution,
            buffers: &buffers,
            textures: &textures,
        };

        if flags.contains(FeatureFlags::OCCLUSION_CULLING) {
            backend.dispatch(PassKind::OcclusionPrepass, &args)?;
        }
        backend.dispatch(PassKind::Visibility, &args)?;
        backend.dispatch(PassKind::Contribution, &args)?;
        backend.dispatch(PassKind::Accumulation, &args)?;
        if flags.contains(FeatureFlags::DENOISE) {
            backend.dispatch(PassKind::Denoise, &args)?;
        }
        if flags.contains(FeatureFlags::BLUR) {
            backend.dispatch(PassKind::Blur, &args)?;
        }
        backend.dispatch(PassKind::Composite, &args)?;
        Ok(())
    }

    /// Release everything and return to Uninitialized
    ///
    /// Releases in reverse dependency order and tolerates partial
    /// initialization; uninitializing an uninitialized pipeline is a
    /// no-op apart from clearing the registry.
    pub fn uninitialize(&mut self, backend: &mut dyn ComputeBackend) {
        if let Some(mut resources) = self.resources.take() {
            Self::release_resources(backend, &mut resources, &mut self.registry);
            log::info!("volumetric pipeline uninitialized");
        }
        self.registry.clear();
        self.frame_index = 0;
        self.last_flags = FeatureFlags::empty();
    }

    fn release_resources(
        backend: &mut dyn ComputeBackend,
        resources: &mut FrameResources,
        registry: &mut CommonDataRegistry,
    ) {
        resources.textures.release_all(backend);
        resources.volumes.dispose(backend, registry);
        resources.point.dispose(backend, registry);
        resources.spot.dispose(backend, registry);
        resources.directional.dispose(backend, registry);
    }
}

impl Default for VolumetricPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{BoundingSphere, Vec3};
    use crate::gpu::HeadlessBackend;
    use crate::lights::{DirectionalLight, FogVolume};

    fn origin_camera() -> CameraState {
        CameraState::perspective(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 1.0),
            60.0,
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }

    fn quality_with_range(far_range: f32) -> QualitySettings {
        QualitySettings { far_range, ..Default::default() }
    }

    fn initialized(backend: &mut HeadlessBackend, quality: &QualitySettings) -> VolumetricPipeline {
        let mut pipeline = VolumetricPipeline::new();
        pipeline.initialize(backend, quality).unwrap();
        pipeline
    }

    #[test]
    fn test_empty_scene_dispatches_with_placeholders() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);

        let stats = pipeline
            .render_frame(&mut backend, &origin_camera(), &quality, &EnvironmentSettings::default())
            .unwrap();

        assert_eq!(stats.visible_directional, 0);
        assert_eq!(stats.visible_spot, 0);
        assert_eq!(stats.visible_point, 0);
        assert_eq!(stats.visible_volumes, 0);
        assert!(!stats.flags.intersects(
            FeatureFlags::DIRECTIONAL_LIGHTS
                | FeatureFlags::SPOT_LIGHTS
                | FeatureFlags::POINT_LIGHTS
                | FeatureFlags::VOLUMES
        ));
        assert!(!stats.passthrough);

        // the fixed sequence still ran, with all four placeholder buffers bound
        assert!(!backend.dispatches().is_empty());
        for record in backend.dispatches() {
            assert_eq!(record.buffers.len(), 4);
        }
    }

    #[test]
    fn test_directional_shadow_flags_and_cascades() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);

        pipeline.registry_mut().register_directional(
            DirectionalLight::new(Vec3::new(0.0, -1.0, 0.2), Vec3::new(1.0, 1.0, 1.0), 1.0)
                .with_shadows(1.0),
        );

        let stats = pipeline
            .render_frame(&mut backend, &origin_camera(), &quality, &EnvironmentSettings::default())
            .unwrap();

        assert_eq!(stats.visible_directional, 1);
        assert!(stats.flags.contains(FeatureFlags::DIRECTIONAL_LIGHTS));
        assert!(stats.flags.contains(FeatureFlags::DIRECTIONAL_SHADOWS));
        // default quality configures four cascades
        assert!(stats.flags.contains(FeatureFlags::DIRECTIONAL_CASCADES_FOUR));
    }

    #[test]
    fn test_volume_visibility_shrinks_buffer() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);
        let camera = origin_camera();
        let environment = EnvironmentSettings::default();

        // three volumes in front of the camera, two behind
        let mut visible_ids = Vec::new();
        for z in [10.0_f32, 20.0, 30.0] {
            visible_ids.push(pipeline.registry_mut().register_volume(FogVolume::new(
                BoundingSphere::new(Vec3::new(0.0, 0.0, z), 1.0),
                0.5,
            )));
        }
        for z in [-10.0_f32, -20.0] {
            pipeline.registry_mut().register_volume(FogVolume::new(
                BoundingSphere::new(Vec3::new(0.0, 0.0, z), 1.0),
                0.5,
            ));
        }

        let stats = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert_eq!(stats.visible_volumes, 3);

        pipeline.registry_mut().unregister_volume(visible_ids[0]);
        pipeline.registry_mut().unregister_volume(visible_ids[1]);

        let stats = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert_eq!(stats.visible_volumes, 1);
    }

    #[test]
    fn test_temporal_engages_on_second_frame() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        assert!(quality.temporal_reprojection);
        assert!(quality.temporal_blend_factor > 0.0);

        let mut pipeline = initialized(&mut backend, &quality);
        let camera = origin_camera();
        let environment = EnvironmentSettings::default();

        let first = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert_eq!(first.frame_index, 1);
        assert!(!first.flags.contains(FeatureFlags::TEMPORAL_REPROJECTION));

        let second = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert_eq!(second.frame_index, 2);
        assert!(second.flags.contains(FeatureFlags::TEMPORAL_REPROJECTION));
    }

    #[test]
    fn test_double_initialize_is_guarded_noop() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);

        let buffers_before = backend.live_buffer_count();
        pipeline.initialize(&mut backend, &quality).unwrap();
        assert_eq!(backend.live_buffer_count(), buffers_before);
    }

    #[test]
    fn test_render_before_initialize_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut pipeline = VolumetricPipeline::new();
        let result = pipeline.render_frame(
            &mut backend,
            &origin_camera(),
            &QualitySettings::default(),
            &EnvironmentSettings::default(),
        );
        assert!(matches!(result, Err(PipelineError::NotInitialized)));
    }

    #[test]
    fn test_dispatch_failure_falls_back_to_passthrough() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);
        let camera = origin_camera();
        let environment = EnvironmentSettings::default();

        backend.set_fail_dispatch(true);
        let stats = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert!(stats.passthrough);
        assert_eq!(backend.passthrough_count(), 1);
        // the frame still counts
        assert_eq!(stats.frame_index, 1);

        // the next frame recovers with no lingering damage
        backend.set_fail_dispatch(false);
        let stats = pipeline
            .render_frame(&mut backend, &camera, &quality, &environment)
            .unwrap();
        assert!(!stats.passthrough);
        assert_eq!(stats.frame_index, 2);
        assert_eq!(backend.passthrough_count(), 1);
    }

    #[test]
    fn test_uninitialize_releases_everything() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        let mut pipeline = initialized(&mut backend, &quality);

        pipeline.registry_mut().register_volume(FogVolume::new(
            BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0),
            0.5,
        ));
        pipeline
            .render_frame(
                &mut backend,
                &origin_camera(),
                &quality,
                &EnvironmentSettings::default(),
            )
            .unwrap();

        pipeline.uninitialize(&mut backend);
        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(backend.live_texture_count(), 0);
        assert!(!pipeline.is_initialized());
        assert_eq!(pipeline.frame_index(), 0);

        // tolerant of repeated and never-initialized teardown
        pipeline.uninitialize(&mut backend);
    }

    #[test]
    fn test_kernel_id_reflects_occlusion_and_cascades() {
        let mut backend = HeadlessBackend::new();
        let quality = quality_with_range(100.0);
        assert!(quality.occlusion_culling);
        let mut pipeline = initialized(&mut backend, &quality);

        let stats = pipeline
            .render_frame(
                &mut backend,
                &origin_camera(),
                &quality,
                &EnvironmentSettings::default(),
            )
            .unwrap();
        // four cascades (base 2) plus the occlusion offset
        assert_eq!(stats.kernel_id, 8);
        for record in backend.dispatches() {
            assert_eq!(record.kernel_id, 8);
        }
    }
}
