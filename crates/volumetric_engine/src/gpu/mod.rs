//! GPU resource boundary
//!
//! Everything the pipeline hands to the GPU goes through the
//! [`ComputeBackend`] trait using opaque handles; the concrete compute
//! kernels live outside this crate. This module owns the resource
//! lifecycle: exact-capacity record buffers and the double-buffered
//! texture set used for temporal reprojection.

pub mod backend;
pub mod buffer;
pub mod headless;
pub mod textures;

pub use backend::{
    BackendError, BackendResult, BufferHandle, ComputeBackend, DispatchArgs, Extent3d, PassKind,
    TextureDim, TextureHandle,
};
pub use buffer::{BufferState, RecordBuffer};
pub use headless::HeadlessBackend;
pub use textures::TextureSet;
