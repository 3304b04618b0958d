//! Light and fog volume descriptors
//!
//! Pure-data descriptors registered by external components. Each carries
//! the bounding sphere its owner keeps in sync with the world transform;
//! the per-kind managers serialize visible descriptors into the packed
//! records of [`packed`].

pub mod managers;
pub mod packed;

use crate::foundation::math::{BoundingSphere, Mat4, Vec3};

/// Directional light (like sunlight)
///
/// Directional lights have no spatial extent; their bounding sphere is
/// unbounded so they always survive culling.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    /// Normalized light direction
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light-space to world-space transform
    pub light_to_world: Mat4,
    /// Whether the light casts volumetric shadows
    pub casts_shadows: bool,
    /// Shadow attenuation strength in [0, 1]
    pub shadow_strength: f32,
    /// Cookie texture index (-1 when none)
    pub cookie_index: i32,
    /// Bounding sphere used for culling
    pub bounding_sphere: BoundingSphere,
}

impl DirectionalLight {
    /// Create a directional light
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            intensity,
            light_to_world: Mat4::identity(),
            casts_shadows: false,
            shadow_strength: 1.0,
            cookie_index: -1,
            bounding_sphere: BoundingSphere::unbounded(),
        }
    }

    /// Enable volumetric shadows
    pub fn with_shadows(mut self, strength: f32) -> Self {
        self.casts_shadows = true;
        self.shadow_strength = strength;
        self
    }
}

/// Spot light (like a flashlight)
#[derive(Debug, Clone)]
pub struct SpotLight {
    /// Light position
    pub position: Vec3,
    /// Normalized light direction
    pub direction: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range
    pub range: f32,
    /// Outer cone angle in radians
    pub cone_angle: f32,
    /// World-space to light-space transform
    pub world_to_light: Mat4,
    /// Whether the light casts volumetric shadows
    pub casts_shadows: bool,
    /// Shadow attenuation strength in [0, 1]
    pub shadow_strength: f32,
    /// Cookie texture index (-1 when none)
    pub cookie_index: i32,
    /// Bounding sphere used for culling
    pub bounding_sphere: BoundingSphere,
}

impl SpotLight {
    /// Create a spot light
    ///
    /// The bounding sphere conservatively covers the whole cone: centered
    /// at the apex with the range as radius.
    pub fn new(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        cone_angle: f32,
    ) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            color,
            intensity,
            range,
            cone_angle,
            world_to_light: Mat4::identity(),
            casts_shadows: false,
            shadow_strength: 1.0,
            cookie_index: -1,
            bounding_sphere: BoundingSphere::new(position, range),
        }
    }

    /// Enable volumetric shadows
    pub fn with_shadows(mut self, strength: f32) -> Self {
        self.casts_shadows = true;
        self.shadow_strength = strength;
        self
    }
}

/// Point light (like a lightbulb)
#[derive(Debug, Clone)]
pub struct PointLight {
    /// Light position
    pub position: Vec3,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range
    pub range: f32,
    /// World-space to light-space transform (for shadow/cookie sampling)
    pub world_to_light: Mat4,
    /// Whether the light casts volumetric shadows
    pub casts_shadows: bool,
    /// Shadow attenuation strength in [0, 1]
    pub shadow_strength: f32,
    /// Cookie texture index (-1 when none)
    pub cookie_index: i32,
    /// Bounding sphere used for culling
    pub bounding_sphere: BoundingSphere,
}

impl PointLight {
    /// Create a point light
    pub fn new(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            range,
            world_to_light: Mat4::identity(),
            casts_shadows: false,
            shadow_strength: 1.0,
            cookie_index: -1,
            bounding_sphere: BoundingSphere::new(position, range),
        }
    }

    /// Enable volumetric shadows
    pub fn with_shadows(mut self, strength: f32) -> Self {
        self.casts_shadows = true;
        self.shadow_strength = strength;
        self
    }
}

/// Fog volume contributing density inside its bounds
#[derive(Debug, Clone)]
pub struct FogVolume {
    /// World-space to volume-space transform
    pub world_to_volume: Mat4,
    /// Density added inside the volume
    pub density: f32,
    /// Distance over which density falls off toward the bounds
    pub falloff_distance: f32,
    /// Whether the volume samples animated noise
    pub noise_enabled: bool,
    /// Noise animation speed
    pub noise_speed: f32,
    /// Density texture index (-1 when none)
    pub texture_index: i32,
    /// Bounding sphere used for culling
    pub bounding_sphere: BoundingSphere,
}

impl FogVolume {
    /// Create a fog volume from its culling sphere and density
    pub fn new(bounding_sphere: BoundingSphere, density: f32) -> Self {
        Self {
            world_to_volume: Mat4::identity(),
            density,
            falloff_distance: 1.0,
            noise_enabled: false,
            noise_speed: 1.0,
            texture_index: -1,
            bounding_sphere,
        }
    }

    /// Enable animated noise sampling
    pub fn with_noise(mut self, speed: f32) -> Self {
        self.noise_enabled = true;
        self.noise_speed = speed;
        self
    }
}
