//! Double-buffered texture set
//!
//! Owns the lazily-allocated intermediate textures of the pipeline. The
//! reprojection-capable textures are pairs with a role index: `swap`
//! exchanges which member is "current" and which is "previous" in O(1)
//! without touching contents. Setting a new resolution eagerly releases
//! every resolution-dependent texture so nothing renders into a
//! stale-sized target.

use super::backend::{ComputeBackend, Extent3d, TextureDim, TextureHandle};

/// Default extent of the light-probe coefficient texture
///
/// Nine coefficients of a second-order spherical harmonic per row.
pub const DEFAULT_PROBE_EXTENT: Extent3d = Extent3d { width: 9, height: 1, depth: 1 };

/// A texture allocated on first access once its extent is known
#[derive(Debug)]
struct LazyTexture {
    label: &'static str,
    dim: TextureDim,
    handle: Option<TextureHandle>,
}

impl LazyTexture {
    fn new(label: &'static str, dim: TextureDim) -> Self {
        Self { label, dim, handle: None }
    }

    /// Get the handle, allocating on first access
    ///
    /// Returns `None` (after logging a diagnostic) when no extent has been
    /// set yet or the backend refuses the allocation. Never panics.
    fn get_or_create(
        &mut self,
        backend: &mut dyn ComputeBackend,
        extent: Option<Extent3d>,
    ) -> Option<TextureHandle> {
        if let Some(handle) = self.handle {
            return Some(handle);
        }
        let Some(extent) = extent else {
            log::warn!("{}: accessed before a resolution was set", self.label);
            return None;
        };
        match backend.create_texture(self.label, self.dim, extent) {
            Ok(handle) => {
                log::debug!("{}: allocated at {extent:?}", self.label);
                self.handle = Some(handle);
                Some(handle)
            }
            Err(e) => {
                log::error!("{}: allocation failed: {e}", self.label);
                None
            }
        }
    }

    fn release(&mut self, backend: &mut dyn ComputeBackend) {
        if let Some(handle) = self.handle.take() {
            backend.destroy_texture(handle);
        }
    }
}

/// A ping-pong pair of textures with an explicit role index
#[derive(Debug)]
struct TexturePair {
    textures: [LazyTexture; 2],
    role: usize,
}

impl TexturePair {
    fn new(current_label: &'static str, history_label: &'static str, dim: TextureDim) -> Self {
        Self {
            textures: [LazyTexture::new(current_label, dim), LazyTexture::new(history_label, dim)],
            role: 0,
        }
    }

    fn current(
        &mut self,
        backend: &mut dyn ComputeBackend,
        extent: Option<Extent3d>,
    ) -> Option<TextureHandle> {
        self.textures[self.role].get_or_create(backend, extent)
    }

    fn previous(
        &mut self,
        backend: &mut dyn ComputeBackend,
        extent: Option<Extent3d>,
    ) -> Option<TextureHandle> {
        self.textures[1 - self.role].get_or_create(backend, extent)
    }

    /// Exchange roles without copying contents
    fn swap(&mut self) {
        self.role = 1 - self.role;
    }

    fn release(&mut self, backend: &mut dyn ComputeBackend) {
        for texture in &mut self.textures {
            texture.release(backend);
        }
    }
}

/// Owns every intermediate texture of the pipeline
#[derive(Debug)]
pub struct TextureSet {
    resolution: Option<Extent3d>,
    probe_resolution: Extent3d,
    volumetric: TexturePair,
    fog: TexturePair,
    occlusion_depth: LazyTexture,
    occlusion_slices: LazyTexture,
    probe_coefficients: LazyTexture,
}

impl TextureSet {
    /// Create a texture set with no resolution configured
    pub fn new() -> Self {
        Self {
            resolution: None,
            probe_resolution: DEFAULT_PROBE_EXTENT,
            volumetric: TexturePair::new("volumetric_data", "volumetric_data_history", TextureDim::D3),
            fog: TexturePair::new("accumulated_fog", "accumulated_fog_history", TextureDim::D3),
            occlusion_depth: LazyTexture::new("occlusion_depth", TextureDim::D2),
            occlusion_slices: LazyTexture::new("occlusion_slice_count", TextureDim::D2),
            probe_coefficients: LazyTexture::new("light_probe_coefficients", TextureDim::D2),
        }
    }

    /// Configured volumetric resolution, if set
    pub fn resolution(&self) -> Option<Extent3d> {
        self.resolution
    }

    /// Set the volumetric resolution
    ///
    /// A changed resolution eagerly releases every resolution-dependent
    /// texture; they reallocate lazily at the new size on next access. The
    /// probe coefficient texture has its own extent and is unaffected.
    pub fn set_resolution(&mut self, backend: &mut dyn ComputeBackend, extent: Extent3d) {
        if self.resolution == Some(extent) {
            return;
        }
        log::debug!("texture set resolution -> {extent:?}");
        self.resolution = Some(extent);
        self.volumetric.release(backend);
        self.fog.release(backend);
        self.occlusion_depth.release(backend);
        self.occlusion_slices.release(backend);
    }

    /// Set the light-probe coefficient extent
    pub fn set_probe_resolution(&mut self, backend: &mut dyn ComputeBackend, extent: Extent3d) {
        if self.probe_resolution == extent {
            return;
        }
        self.probe_resolution = extent;
        self.probe_coefficients.release(backend);
    }

    /// Main volumetric data texture written this frame
    pub fn current_volumetric(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        self.volumetric.current(backend, self.resolution)
    }

    /// Previous frame's volumetric data, read during temporal blending
    pub fn previous_volumetric(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        self.volumetric.previous(backend, self.resolution)
    }

    /// Accumulated fog texture written this frame
    pub fn current_fog(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        self.fog.current(backend, self.resolution)
    }

    /// Previous frame's accumulated fog
    pub fn previous_fog(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        self.fog.previous(backend, self.resolution)
    }

    /// Depth texture used by the occlusion pre-pass
    pub fn occlusion_depth(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        let extent = self.resolution.map(|e| Extent3d::flat(e.width, e.height));
        self.occlusion_depth.get_or_create(backend, extent)
    }

    /// Per-column visible slice count texture from the occlusion pre-pass
    pub fn occlusion_slice_count(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        let extent = self.resolution.map(|e| Extent3d::flat(e.width, e.height));
        self.occlusion_slices.get_or_create(backend, extent)
    }

    /// Light-probe spherical harmonic coefficients
    pub fn probe_coefficients(&mut self, backend: &mut dyn ComputeBackend) -> Option<TextureHandle> {
        let extent = Some(self.probe_resolution);
        self.probe_coefficients.get_or_create(backend, extent)
    }

    /// Flip the role of every reprojection pair
    ///
    /// Called once per frame after the write stage. Valid even when the
    /// write stage was skipped: roles exchange, contents are untouched.
    pub fn swap(&mut self) {
        self.volumetric.swap();
        self.fog.swap();
    }

    /// Release every owned texture
    ///
    /// Idempotent; invoked on disposal and resolution changes.
    pub fn release_all(&mut self, backend: &mut dyn ComputeBackend) {
        self.volumetric.release(backend);
        self.fog.release(backend);
        self.occlusion_depth.release(backend);
        self.occlusion_slices.release(backend);
        self.probe_coefficients.release(backend);
    }
}

impl Default for TextureSet {
    fn default() -> Self {
        Self::new()
    }
}
