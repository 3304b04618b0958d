//! Configuration system
//!
//! Quality and environment settings are external read-only structured
//! input, consumed at the start of each frame's flag evaluation. Both
//! support TOML and RON files through the [`Config`] trait.

pub use serde::{Deserialize, Serialize};

use crate::gpu::Extent3d;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Number of directional shadow cascades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeCount {
    /// Single cascade
    One,
    /// Two cascades
    Two,
    /// Four cascades
    Four,
}

impl CascadeCount {
    /// Cascade count as an integer
    pub fn count(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }
}

/// Quality settings consumed by flag evaluation and resource sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Resolution of the volumetric intermediate textures
    pub volumetric_resolution: Extent3d,
    /// Extent of the light-probe coefficient texture
    pub probe_resolution: Extent3d,
    /// Far range override used as the culling frustum's far plane
    pub far_range: f32,
    /// Directional shadow cascade count
    pub cascades: CascadeCount,
    /// Run the depth-based occlusion culling pre-pass
    pub occlusion_culling: bool,
    /// Blend current frame data with the previous frame's
    pub temporal_reprojection: bool,
    /// Weight of the previous frame in the temporal blend (0 disables)
    pub temporal_blend_factor: f32,
    /// Evaluate fog volume contributions
    pub enable_volumes: bool,
    /// Evaluate ambient lighting contribution
    pub enable_ambient_lighting: bool,
    /// Sample light-probe coefficients
    pub enable_light_probes: bool,
    /// Evaluate shadow attenuation for casting lights
    pub enable_shadows: bool,
    /// Sample light cookie textures
    pub enable_cookies: bool,
    /// Experimental: denoise pass over the accumulated result
    pub experimental_denoise: bool,
    /// Experimental: blur pass over the accumulated result
    pub experimental_blur: bool,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            volumetric_resolution: Extent3d::new(160, 90, 64),
            probe_resolution: crate::gpu::textures::DEFAULT_PROBE_EXTENT,
            far_range: 128.0,
            cascades: CascadeCount::Four,
            occlusion_culling: true,
            temporal_reprojection: true,
            temporal_blend_factor: 0.9,
            enable_volumes: true,
            enable_ambient_lighting: true,
            enable_light_probes: false,
            enable_shadows: true,
            enable_cookies: true,
            experimental_denoise: false,
            experimental_blur: false,
        }
    }
}

impl Config for QualitySettings {}

/// Environment state sampled at the start of each frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSettings {
    /// Global ambient light intensity (0 disables the ambient stage)
    pub ambient_intensity: f32,
    /// Base fog density applied before volume contributions
    pub base_density: f32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.2,
            base_density: 0.05,
        }
    }
}

impl Config for EnvironmentSettings {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_settings_toml_round_trip() {
        let settings = QualitySettings {
            far_range: 250.0,
            cascades: CascadeCount::Two,
            temporal_blend_factor: 0.75,
            ..Default::default()
        };

        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: QualitySettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed.far_range, 250.0);
        assert_eq!(parsed.cascades, CascadeCount::Two);
        assert_eq!(parsed.temporal_blend_factor, 0.75);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let result = QualitySettings::default().save_to_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_cascade_counts() {
        assert_eq!(CascadeCount::One.count(), 1);
        assert_eq!(CascadeCount::Two.count(), 2);
        assert_eq!(CascadeCount::Four.count(), 4);
    }
}
