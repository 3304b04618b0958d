//! Packed parameter records
//!
//! Fixed-size value records serialized per visible entity and uploaded
//! densely in visible-set order. Field order is the wire contract with
//! the compute kernels: scalars and vectors occupy vec4 lanes and 4x4
//! matrices travel as four consecutive vec4 rows. Byte size is exactly
//! the sum of the field widths.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::mat4_to_rows;

use super::{DirectionalLight, FogVolume, PointLight, SpotLight};

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Packed directional light parameters (176 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightRecord {
    /// rgb color + intensity
    pub color: [f32; 4],
    /// xyz direction + cookie index
    pub direction: [f32; 4],
    /// light-space to world-space transform, four rows
    pub light_to_world: [[f32; 4]; 4],
    /// world-space to light-space transform, four rows
    pub world_to_light: [[f32; 4]; 4],
    /// shadows enabled, shadow strength, unused, unused
    pub shadow_params: [f32; 4],
}

impl DirectionalLightRecord {
    /// Serialize one directional light
    pub fn pack(light: &DirectionalLight) -> Self {
        let world_to_light = light
            .light_to_world
            .try_inverse()
            .unwrap_or_else(crate::foundation::math::Mat4::identity);
        Self {
            color: [light.color.x, light.color.y, light.color.z, light.intensity],
            direction: [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                light.cookie_index as f32,
            ],
            light_to_world: mat4_to_rows(&light.light_to_world),
            world_to_light: mat4_to_rows(&world_to_light),
            shadow_params: [flag(light.casts_shadows), light.shadow_strength, 0.0, 0.0],
        }
    }
}

/// Packed spot light parameters (128 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightRecord {
    /// rgb color + intensity
    pub color: [f32; 4],
    /// xyz position + range
    pub position: [f32; 4],
    /// xyz direction + cosine of the outer cone angle
    pub direction: [f32; 4],
    /// world-space to light-space transform, four rows
    pub world_to_light: [[f32; 4]; 4],
    /// shadows enabled, shadow strength, cookie index, unused
    pub shadow_params: [f32; 4],
}

impl SpotLightRecord {
    /// Serialize one spot light
    pub fn pack(light: &SpotLight) -> Self {
        Self {
            color: [light.color.x, light.color.y, light.color.z, light.intensity],
            position: [light.position.x, light.position.y, light.position.z, light.range],
            direction: [
                light.direction.x,
                light.direction.y,
                light.direction.z,
                (light.cone_angle * 0.5).cos(),
            ],
            world_to_light: mat4_to_rows(&light.world_to_light),
            shadow_params: [
                flag(light.casts_shadows),
                light.shadow_strength,
                light.cookie_index as f32,
                0.0,
            ],
        }
    }
}

/// Packed point light parameters (112 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightRecord {
    /// rgb color + intensity
    pub color: [f32; 4],
    /// xyz position + range
    pub position: [f32; 4],
    /// world-space to light-space transform, four rows
    pub world_to_light: [[f32; 4]; 4],
    /// shadows enabled, shadow strength, cookie index, unused
    pub shadow_params: [f32; 4],
}

impl PointLightRecord {
    /// Serialize one point light
    pub fn pack(light: &PointLight) -> Self {
        Self {
            color: [light.color.x, light.color.y, light.color.z, light.intensity],
            position: [light.position.x, light.position.y, light.position.z, light.range],
            world_to_light: mat4_to_rows(&light.world_to_light),
            shadow_params: [
                flag(light.casts_shadows),
                light.shadow_strength,
                light.cookie_index as f32,
                0.0,
            ],
        }
    }
}

/// Packed fog volume parameters (96 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VolumeRecord {
    /// world-space to volume-space transform, four rows
    pub world_to_volume: [[f32; 4]; 4],
    /// density, falloff distance, unused, unused
    pub falloff: [f32; 4],
    /// noise enabled, noise speed, texture index, unused
    pub noise: [f32; 4],
}

impl VolumeRecord {
    /// Serialize one fog volume
    pub fn pack(volume: &FogVolume) -> Self {
        Self {
            world_to_volume: mat4_to_rows(&volume.world_to_volume),
            falloff: [volume.density, volume.falloff_distance, 0.0, 0.0],
            noise: [
                flag(volume.noise_enabled),
                volume.noise_speed,
                volume.texture_index as f32,
                0.0,
            ],
        }
    }
}
