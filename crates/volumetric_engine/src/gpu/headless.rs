//! Headless compute backend
//!
//! A backend that owns no real GPU device: it tracks live allocations and
//! records every dispatch. Used by the demo application and throughout the
//! test suite; a driver-backed backend implements the same trait outside
//! this crate.

use std::collections::HashMap;

use super::backend::{
    BackendError, BackendResult, BufferHandle, ComputeBackend, DispatchArgs, Extent3d, PassKind,
    TextureDim, TextureHandle,
};

/// Record of one dispatch observed by the headless backend
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    /// Stage dispatched
    pub pass: PassKind,
    /// Kernel variant bound to the dispatch
    pub kernel_id: u32,
    /// Buffers bound to the dispatch
    pub buffers: Vec<BufferHandle>,
    /// Textures bound to the dispatch
    pub textures: Vec<TextureHandle>,
}

/// Headless, allocation-tracking compute backend
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    buffers: HashMap<BufferHandle, (String, usize)>,
    textures: HashMap<TextureHandle, (String, TextureDim, Extent3d)>,
    dispatches: Vec<DispatchRecord>,
    passthrough_count: usize,
    fail_dispatch: bool,
}

impl HeadlessBackend {
    /// Create an empty headless backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of currently live textures
    pub fn live_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Capacity in bytes of a live buffer, if the handle is live
    pub fn buffer_capacity(&self, handle: BufferHandle) -> Option<usize> {
        self.buffers.get(&handle).map(|(_, size)| *size)
    }

    /// Extent of a live texture, if the handle is live
    pub fn texture_extent(&self, handle: TextureHandle) -> Option<Extent3d> {
        self.textures.get(&handle).map(|(_, _, extent)| *extent)
    }

    /// All dispatches recorded so far, in submission order
    pub fn dispatches(&self) -> &[DispatchRecord] {
        &self.dispatches
    }

    /// Number of pass-through copies requested so far
    pub fn passthrough_count(&self) -> usize {
        self.passthrough_count
    }

    /// Forget recorded dispatches (allocations stay live)
    pub fn clear_recording(&mut self) {
        self.dispatches.clear();
        self.passthrough_count = 0;
    }

    /// Make every subsequent dispatch fail
    ///
    /// Test knob emulating a transient driver error.
    pub fn set_fail_dispatch(&mut self, fail: bool) {
        self.fail_dispatch = fail;
    }

    fn alloc_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl ComputeBackend for HeadlessBackend {
    fn create_buffer(&mut self, label: &str, size: usize) -> BackendResult<BufferHandle> {
        let handle = BufferHandle(self.alloc_handle());
        self.buffers.insert(handle, (label.to_owned(), size));
        log::trace!("headless: created buffer '{label}' ({size} bytes) -> {handle:?}");
        Ok(handle)
    }

    fn write_buffer(&mut self, handle: BufferHandle, data: &[u8]) -> BackendResult<()> {
        let (_, capacity) = self
            .buffers
            .get(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        if data.len() > *capacity {
            return Err(BackendError::WriteOutOfBounds {
                len: data.len(),
                capacity: *capacity,
            });
        }
        Ok(())
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        if self.buffers.remove(&handle).is_some() {
            log::trace!("headless: destroyed buffer {handle:?}");
        }
    }

    fn create_texture(
        &mut self,
        label: &str,
        dim: TextureDim,
        extent: Extent3d,
    ) -> BackendResult<TextureHandle> {
        let handle = TextureHandle(self.alloc_handle());
        self.textures.insert(handle, (label.to_owned(), dim, extent));
        log::trace!("headless: created texture '{label}' ({extent:?}) -> {handle:?}");
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_some() {
            log::trace!("headless: destroyed texture {handle:?}");
        }
    }

    fn dispatch(&mut self, pass: PassKind, args: &DispatchArgs<'_>) -> BackendResult<()> {
        if self.fail_dispatch {
            return Err(BackendError::DispatchFailed {
                pass,
                reason: "simulated driver failure".to_owned(),
            });
        }
        for handle in args.buffers {
            if !self.buffers.contains_key(handle) {
                return Err(BackendError::UnknownBuffer(*handle));
            }
        }
        for handle in args.textures {
            if !self.textures.contains_key(handle) {
                return Err(BackendError::UnknownTexture(*handle));
            }
        }
        self.dispatches.push(DispatchRecord {
            pass,
            kernel_id: args.kernel_id,
            buffers: args.buffers.to_vec(),
            textures: args.textures.to_vec(),
        });
        Ok(())
    }

    fn copy_passthrough(&mut self) -> BackendResult<()> {
        self.passthrough_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.create_buffer("test", 64).unwrap();
        assert_eq!(backend.live_buffer_count(), 1);
        assert_eq!(backend.buffer_capacity(handle), Some(64));

        backend.write_buffer(handle, &[0u8; 64]).unwrap();
        assert!(matches!(
            backend.write_buffer(handle, &[0u8; 65]),
            Err(BackendError::WriteOutOfBounds { .. })
        ));

        backend.destroy_buffer(handle);
        assert_eq!(backend.live_buffer_count(), 0);
        // releasing an already-released handle is a no-op
        backend.destroy_buffer(handle);
    }

    #[test]
    fn test_dispatch_validates_handles() {
        let mut backend = HeadlessBackend::new();
        let stale = BufferHandle(999);
        let args = DispatchArgs {
            kernel_id: 0,
            extent: Extent3d::flat(4, 4),
            buffers: &[stale],
            textures: &[],
        };
        assert!(matches!(
            backend.dispatch(PassKind::Visibility, &args),
            Err(BackendError::UnknownBuffer(_))
        ));
    }
}
