//! Compute backend abstraction
//!
//! This module defines the trait the external compute-execution
//! collaborator must implement. The pipeline only ever sees opaque
//! handles; buffer contents cross the boundary as tightly packed byte
//! slices and kernels are selected by a small integer id resolved per
//! frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle to a GPU buffer owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

/// Handle to a GPU texture owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Integer extent of a 2D or 3D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent3d {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Depth in texels (1 for 2D textures)
    pub depth: u32,
}

impl Extent3d {
    /// Create a 3D extent
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self { width, height, depth }
    }

    /// Create a 2D extent (depth of 1)
    pub fn flat(width: u32, height: u32) -> Self {
        Self { width, height, depth: 1 }
    }
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureDim {
    /// Two-dimensional texture
    D2,
    /// Three-dimensional texture
    D3,
}

/// Fixed compute stages dispatched by the frame orchestrator
///
/// The sequence is fixed per frame: occlusion pre-pass, visibility,
/// data contribution, accumulation, then the optional denoise/blur
/// stages and the final composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Depth-based occlusion pre-pass (optional)
    OcclusionPrepass,
    /// Per-cell visibility pass
    Visibility,
    /// Light and volume data contribution pass
    Contribution,
    /// Front-to-back accumulation pass
    Accumulation,
    /// Experimental denoise pass (optional)
    Denoise,
    /// Experimental blur pass (optional)
    Blur,
    /// Final composite onto the output frame
    Composite,
}

/// Errors reported by a compute backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// A resource allocation failed
    #[error("allocation of {size} bytes for '{label}' failed: {reason}")]
    AllocationFailed {
        /// Diagnostic label of the resource
        label: String,
        /// Requested size in bytes
        size: usize,
        /// Backend-specific failure reason
        reason: String,
    },

    /// A buffer handle did not refer to a live buffer
    #[error("unknown buffer handle {0:?}")]
    UnknownBuffer(BufferHandle),

    /// A texture handle did not refer to a live texture
    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    /// A buffer write exceeded the buffer's capacity
    #[error("write of {len} bytes exceeds buffer capacity of {capacity} bytes")]
    WriteOutOfBounds {
        /// Bytes written
        len: usize,
        /// Buffer capacity in bytes
        capacity: usize,
    },

    /// A compute dispatch failed
    #[error("dispatch of {pass:?} failed: {reason}")]
    DispatchFailed {
        /// Stage that failed
        pass: PassKind,
        /// Backend-specific failure reason
        reason: String,
    },
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Resources bound to a single compute dispatch
#[derive(Debug, Clone)]
pub struct DispatchArgs<'a> {
    /// Resolved kernel variant id
    pub kernel_id: u32,
    /// Work extent of the dispatch
    pub extent: Extent3d,
    /// Packed parameter buffers in documented binding order
    /// (directional lights, spot lights, point lights, volumes)
    pub buffers: &'a [BufferHandle],
    /// Textures in documented binding order
    pub textures: &'a [TextureHandle],
}

/// External compute-execution collaborator
///
/// Dispatches are fire-and-forget from the pipeline's perspective: the
/// backend must guarantee a dispatch completes, or is safely enqueued,
/// before its outputs are read or swapped.
pub trait ComputeBackend {
    /// Create a buffer of exactly `size` bytes and return its handle
    fn create_buffer(&mut self, label: &str, size: usize) -> BackendResult<BufferHandle>;

    /// Upload `data` into the buffer in a single batch
    fn write_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> BackendResult<()>;

    /// Release a buffer; releasing an already-released handle is a no-op
    fn destroy_buffer(&mut self, handle: BufferHandle);

    /// Create a texture and return its handle
    fn create_texture(
        &mut self,
        label: &str,
        dim: TextureDim,
        extent: Extent3d,
    ) -> BackendResult<TextureHandle>;

    /// Release a texture; releasing an already-released handle is a no-op
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Dispatch one compute stage with the given bindings
    fn dispatch(&mut self, pass: PassKind, args: &DispatchArgs<'_>) -> BackendResult<()>;

    /// Copy the untouched input frame to the output unmodified
    ///
    /// Invoked by the orchestrator as the per-frame fallback path when the
    /// enhancement sequence fails mid-frame.
    fn copy_passthrough(&mut self) -> BackendResult<()>;
}
