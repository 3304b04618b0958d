//! Exact-capacity GPU record buffers
//!
//! Each per-kind data manager owns one [`RecordBuffer`]: a buffer whose
//! capacity always equals the current visible count. Capacity changes go
//! through release-then-reallocate, never an in-place resize, and a zero
//! count substitutes a once-allocated size-1 placeholder at bind time
//! (shader binding rules require a live buffer on all targets).

use std::marker::PhantomData;

use bytemuck::Pod;

use super::backend::{BackendResult, BufferHandle, ComputeBackend};

/// Allocation state of a record buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No GPU buffer is allocated
    Unallocated,
    /// A GPU buffer holding exactly `capacity` records is allocated
    Allocated {
        /// Backend handle of the buffer
        handle: BufferHandle,
        /// Capacity in records
        capacity: usize,
    },
}

/// GPU buffer holding a dense array of packed parameter records
#[derive(Debug)]
pub struct RecordBuffer<T: Pod> {
    label: &'static str,
    state: BufferState,
    placeholder: Option<BufferHandle>,
    _marker: PhantomData<T>,
}

impl<T: Pod> RecordBuffer<T> {
    /// Create an unallocated record buffer
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: BufferState::Unallocated,
            placeholder: None,
            _marker: PhantomData,
        }
    }

    /// Current capacity in records (0 when unallocated)
    pub fn capacity(&self) -> usize {
        match self.state {
            BufferState::Allocated { capacity, .. } => capacity,
            BufferState::Unallocated => 0,
        }
    }

    /// Whether a sized buffer is currently allocated
    pub fn is_allocated(&self) -> bool {
        matches!(self.state, BufferState::Allocated { .. })
    }

    /// Make the buffer hold exactly `count` records
    ///
    /// No-op when the capacity already matches. On mismatch the old buffer
    /// is released and a new one allocated at the exact size; a count of
    /// zero leaves the buffer unallocated.
    pub fn ensure_capacity(
        &mut self,
        backend: &mut dyn ComputeBackend,
        count: usize,
    ) -> BackendResult<()> {
        match self.state {
            BufferState::Allocated { capacity, .. } if capacity == count => return Ok(()),
            BufferState::Allocated { handle, capacity } => {
                log::debug!(
                    "{}: releasing buffer of {capacity} records for reallocation to {count}",
                    self.label
                );
                backend.destroy_buffer(handle);
                self.state = BufferState::Unallocated;
            }
            BufferState::Unallocated => {}
        }

        if count > 0 {
            let handle = backend.create_buffer(self.label, count * std::mem::size_of::<T>())?;
            self.state = BufferState::Allocated { handle, capacity: count };
        }
        Ok(())
    }

    /// Upload all records in one batch
    ///
    /// `records` must have been sized by a preceding `ensure_capacity`
    /// call; an empty slice uploads nothing.
    pub fn upload(&mut self, backend: &mut dyn ComputeBackend, records: &[T]) -> BackendResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        match self.state {
            BufferState::Allocated { handle, .. } => {
                backend.write_buffer(handle, bytemuck::cast_slice(records))
            }
            BufferState::Unallocated => {
                log::warn!("{}: upload of {} records with no buffer allocated", self.label, records.len());
                Ok(())
            }
        }
    }

    /// Handle to bind for dispatch
    ///
    /// Returns the sized buffer when allocated; otherwise the size-1
    /// placeholder, allocating it on first use and reusing it afterwards.
    pub fn bind_handle(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<BufferHandle> {
        match self.state {
            BufferState::Allocated { handle, .. } => Ok(handle),
            BufferState::Unallocated => {
                if let Some(handle) = self.placeholder {
                    return Ok(handle);
                }
                let handle = backend.create_buffer(self.label, std::mem::size_of::<T>())?;
                log::debug!("{}: allocated size-1 placeholder buffer", self.label);
                self.placeholder = Some(handle);
                Ok(handle)
            }
        }
    }

    /// Release the sized buffer and the placeholder
    ///
    /// Idempotent; the buffer returns to the unallocated state.
    pub fn release(&mut self, backend: &mut dyn ComputeBackend) {
        if let BufferState::Allocated { handle, .. } = self.state {
            backend.destroy_buffer(handle);
            self.state = BufferState::Unallocated;
        }
        if let Some(handle) = self.placeholder.take() {
            backend.destroy_buffer(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::headless::HeadlessBackend;

    #[repr(C)]
    #[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct TestRecord {
        values: [f32; 4],
    }

    #[test]
    fn test_capacity_matches_requested_count() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = RecordBuffer::<TestRecord>::new("test_records");

        buffer.ensure_capacity(&mut backend, 3).unwrap();
        assert_eq!(buffer.capacity(), 3);
        assert_eq!(backend.live_buffer_count(), 1);

        // same count keeps the same allocation
        buffer.ensure_capacity(&mut backend, 3).unwrap();
        assert_eq!(backend.live_buffer_count(), 1);
    }

    #[test]
    fn test_shrink_releases_then_reallocates() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = RecordBuffer::<TestRecord>::new("test_records");

        buffer.ensure_capacity(&mut backend, 3).unwrap();
        let first = buffer.bind_handle(&mut backend).unwrap();

        buffer.ensure_capacity(&mut backend, 1).unwrap();
        assert_eq!(buffer.capacity(), 1);
        let second = buffer.bind_handle(&mut backend).unwrap();

        assert_ne!(first, second);
        assert_eq!(backend.buffer_capacity(first), None);
        assert_eq!(
            backend.buffer_capacity(second),
            Some(std::mem::size_of::<TestRecord>())
        );
    }

    #[test]
    fn test_zero_count_binds_reused_placeholder() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = RecordBuffer::<TestRecord>::new("test_records");

        buffer.ensure_capacity(&mut backend, 0).unwrap();
        assert!(!buffer.is_allocated());

        let placeholder = buffer.bind_handle(&mut backend).unwrap();
        assert_eq!(
            backend.buffer_capacity(placeholder),
            Some(std::mem::size_of::<TestRecord>())
        );

        // the placeholder is allocated once and reused
        assert_eq!(buffer.bind_handle(&mut backend).unwrap(), placeholder);
        assert_eq!(backend.live_buffer_count(), 1);
    }

    #[test]
    fn test_upload_full_batch() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = RecordBuffer::<TestRecord>::new("test_records");

        let records = vec![TestRecord { values: [1.0; 4] }; 2];
        buffer.ensure_capacity(&mut backend, records.len()).unwrap();
        buffer.upload(&mut backend, &records).unwrap();
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut buffer = RecordBuffer::<TestRecord>::new("test_records");

        buffer.ensure_capacity(&mut backend, 2).unwrap();
        buffer.bind_handle(&mut backend).unwrap();
        buffer.release(&mut backend);
        buffer.release(&mut backend);

        assert_eq!(backend.live_buffer_count(), 0);
        assert_eq!(buffer.capacity(), 0);
    }
}
