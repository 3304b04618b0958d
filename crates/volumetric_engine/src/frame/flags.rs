//! Feature flag evaluation and kernel id resolution
//!
//! The bitmask is recomputed from scratch every frame by a pure function
//! of the quality settings, environment state, and the managers'
//! candidate signals. Evaluation order is fixed and dependency-respecting:
//! a dependent bit is only ever considered after its prerequisite bit, so
//! a set dependent bit always implies its prerequisite is set.

use bitflags::bitflags;

use crate::core::config::{CascadeCount, EnvironmentSettings, QualitySettings};
use crate::culling::{CameraState, StereoMode};
use crate::registry::{CommonDataRegistry, EntityKind};

bitflags! {
    /// Per-frame mask of enabled optional stages
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FeatureFlags: u32 {
        /// Depth-based occlusion culling pre-pass runs this frame
        const OCCLUSION_CULLING = 1 << 0;
        /// Blend with the previous frame's data
        const TEMPORAL_REPROJECTION = 1 << 1;
        /// Evaluate fog volume contributions
        const VOLUMES = 1 << 2;
        /// At least one visible-candidate volume samples animated noise
        const VOLUMES_NOISE = 1 << 3;
        /// At least one visible-candidate volume samples a density texture
        const VOLUMES_TEXTURES = 1 << 4;
        /// Evaluate the ambient lighting contribution
        const AMBIENT_LIGHTING = 1 << 5;
        /// Sample light-probe spherical harmonic coefficients
        const LIGHT_PROBES = 1 << 6;
        /// Evaluate directional lights
        const DIRECTIONAL_LIGHTS = 1 << 7;
        /// Evaluate directional shadow attenuation
        const DIRECTIONAL_SHADOWS = 1 << 8;
        /// Sample directional cookie textures
        const DIRECTIONAL_COOKIES = 1 << 9;
        /// Directional shadows use one cascade
        const DIRECTIONAL_CASCADES_ONE = 1 << 10;
        /// Directional shadows use two cascades
        const DIRECTIONAL_CASCADES_TWO = 1 << 11;
        /// Directional shadows use four cascades
        const DIRECTIONAL_CASCADES_FOUR = 1 << 12;
        /// Evaluate spot lights
        const SPOT_LIGHTS = 1 << 13;
        /// Evaluate spot shadow attenuation
        const SPOT_SHADOWS = 1 << 14;
        /// Sample spot cookie textures
        const SPOT_COOKIES = 1 << 15;
        /// Evaluate point lights
        const POINT_LIGHTS = 1 << 16;
        /// Evaluate point shadow attenuation
        const POINT_SHADOWS = 1 << 17;
        /// Sample point cookie textures
        const POINT_COOKIES = 1 << 18;
        /// Experimental denoise pass over the accumulated result
        const DENOISE = 1 << 19;
        /// Experimental blur pass over the accumulated result
        const BLUR = 1 << 20;
    }
}

impl FeatureFlags {
    /// Whether every bit of `query` is set
    pub fn has_flags(self, query: Self) -> bool {
        self.contains(query)
    }
}

/// Candidate signals sampled from the per-kind managers
///
/// "Has candidates" means at least one entity of the kind is registered,
/// before any per-camera visibility testing.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindCandidates {
    /// At least one directional light is registered
    pub directional: bool,
    /// At least one spot light is registered
    pub spot: bool,
    /// At least one point light is registered
    pub point: bool,
    /// At least one fog volume is registered
    pub volumes: bool,
}

/// Recompute the feature mask for one frame
///
/// Evaluation order is part of the contract: base flags first, then
/// volumes and their sub-masks, then ambient and probe flags, then each
/// light kind followed by its shadow/cookie flags, then the experimental
/// stages. Temporal reprojection only engages from the second frame on,
/// and only with a non-zero blend factor.
pub fn compute_flags(
    quality: &QualitySettings,
    environment: &EnvironmentSettings,
    registry: &CommonDataRegistry,
    candidates: KindCandidates,
    frame_index: u64,
) -> FeatureFlags {
    let mut flags = FeatureFlags::empty();

    if quality.occlusion_culling {
        flags |= FeatureFlags::OCCLUSION_CULLING;
    }
    if quality.temporal_reprojection && frame_index > 1 && quality.temporal_blend_factor != 0.0 {
        flags |= FeatureFlags::TEMPORAL_REPROJECTION;
    }

    if quality.enable_volumes && candidates.volumes {
        flags |= FeatureFlags::VOLUMES;
        if registry.has_noise_volume() {
            flags |= FeatureFlags::VOLUMES_NOISE;
        }
        if registry.has_texture_volume() {
            flags |= FeatureFlags::VOLUMES_TEXTURES;
        }
    }

    if quality.enable_ambient_lighting && environment.ambient_intensity > 0.0 {
        flags |= FeatureFlags::AMBIENT_LIGHTING;
    }
    if quality.enable_light_probes {
        flags |= FeatureFlags::LIGHT_PROBES;
    }

    if candidates.directional {
        flags |= FeatureFlags::DIRECTIONAL_LIGHTS;
        if quality.enable_shadows && registry.has_shadow_caster(EntityKind::DirectionalLight) {
            flags |= FeatureFlags::DIRECTIONAL_SHADOWS;
            flags |= match quality.cascades {
                CascadeCount::One => FeatureFlags::DIRECTIONAL_CASCADES_ONE,
                CascadeCount::Two => FeatureFlags::DIRECTIONAL_CASCADES_TWO,
                CascadeCount::Four => FeatureFlags::DIRECTIONAL_CASCADES_FOUR,
            };
        }
        if quality.enable_cookies && registry.has_cookie_caster(EntityKind::DirectionalLight) {
            flags |= FeatureFlags::DIRECTIONAL_COOKIES;
        }
    }

    if candidates.spot {
        flags |= FeatureFlags::SPOT_LIGHTS;
        if quality.enable_shadows && registry.has_shadow_caster(EntityKind::SpotLight) {
            flags |= FeatureFlags::SPOT_SHADOWS;
        }
        if quality.enable_cookies && registry.has_cookie_caster(EntityKind::SpotLight) {
            flags |= FeatureFlags::SPOT_COOKIES;
        }
    }

    if candidates.point {
        flags |= FeatureFlags::POINT_LIGHTS;
        if quality.enable_shadows && registry.has_shadow_caster(EntityKind::PointLight) {
            flags |= FeatureFlags::POINT_SHADOWS;
        }
        if quality.enable_cookies && registry.has_cookie_caster(EntityKind::PointLight) {
            flags |= FeatureFlags::POINT_COOKIES;
        }
    }

    if quality.experimental_denoise {
        flags |= FeatureFlags::DENOISE;
    }
    if quality.experimental_blur {
        flags |= FeatureFlags::BLUR;
    }

    flags
}

/// Offset added to the kernel id for single-pass stereo variants
const STEREO_OFFSET: u32 = 3;
/// Offset added to the kernel id for occlusion-culling variants
const OCCLUSION_OFFSET: u32 = 6;

/// Resolve the kernel variant id for this frame's dispatches
///
/// Deterministic table over cascade count, stereo mode, projection kind
/// and the occlusion bit. The base id selects the cascade path (0, 1 or
/// 2 for one, two or four cascades); an orthographic camera always takes
/// the one-cascade path. Single-pass stereo and occlusion culling each
/// add a fixed offset, giving twelve variants in total. Variant
/// selection is hoisted here because the dispatch cannot cheaply branch
/// on all four axes internally.
pub fn resolve_kernel_id(
    camera: &CameraState,
    flags: FeatureFlags,
    cascades: CascadeCount,
) -> u32 {
    let mut id = if camera.is_orthographic() {
        0
    } else {
        match cascades {
            CascadeCount::One => 0,
            CascadeCount::Two => 1,
            CascadeCount::Four => 2,
        }
    };
    if camera.stereo == StereoMode::SinglePass {
        id += STEREO_OFFSET;
    }
    if flags.contains(FeatureFlags::OCCLUSION_CULLING) {
        id += OCCLUSION_OFFSET;
    }
    id
}
