//! Per-kind data managers
//!
//! One manager per entity kind. Each owns a frustum culler fed by the
//! registry's change events and a GPU record buffer whose capacity always
//! equals the current visible count. Per frame: `refresh` syncs the
//! culler, `cull` recomputes visibility, `setup_buffers` reconciles
//! capacity, and `collect` packs and uploads every visible record in one
//! batch. A changed entity is reflected only after the next full cycle;
//! there are no partial updates.

use crate::culling::{Frustum, FrustumCuller};
use crate::gpu::{BackendResult, BufferHandle, ComputeBackend, RecordBuffer};
use crate::registry::{
    CommonDataRegistry, DirectionalLightId, EntityId, FogVolumeId, PointLightId, RegistryEvent,
    SpotLightId, SubscriptionToken,
};

use super::packed::{DirectionalLightRecord, PointLightRecord, SpotLightRecord, VolumeRecord};

/// Manages GPU data for visible directional lights
#[derive(Debug)]
pub struct DirectionalLightManager {
    culler: FrustumCuller<DirectionalLightId>,
    buffer: RecordBuffer<DirectionalLightRecord>,
    staging: Vec<DirectionalLightRecord>,
    token: Option<SubscriptionToken>,
}

impl DirectionalLightManager {
    /// Create a manager attached to a registry
    ///
    /// Subscribes to change events and seeds the culler with the
    /// already-registered lights.
    pub fn new(registry: &mut CommonDataRegistry) -> Self {
        let token = registry.subscribe();
        let mut culler = FrustumCuller::new();
        for id in registry.directional_ids() {
            culler.register(id);
        }
        Self {
            culler,
            buffer: RecordBuffer::new("directional_light_records"),
            staging: Vec::new(),
            token: Some(token),
        }
    }

    /// Apply registry change events to the culler
    pub fn refresh(&mut self, registry: &mut CommonDataRegistry) {
        let Some(token) = self.token else { return };
        for event in registry.drain_events(token) {
            match event {
                RegistryEvent::Added(EntityId::Directional(id)) => self.culler.register(id),
                RegistryEvent::Removed(EntityId::Directional(id)) => self.culler.unregister(id),
                _ => {}
            }
        }
    }

    /// Recompute the visible set for this frame
    pub fn cull(&mut self, registry: &CommonDataRegistry, frustum: &Frustum) {
        self.culler
            .update(frustum, |id| registry.directional(id).map(|l| l.bounding_sphere));
    }

    /// Reconcile buffer capacity with the visible count
    pub fn setup_buffers(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<()> {
        self.buffer.ensure_capacity(backend, self.culler.visible_count())
    }

    /// Pack every visible light and upload in one batch
    pub fn collect(
        &mut self,
        backend: &mut dyn ComputeBackend,
        registry: &CommonDataRegistry,
    ) -> BackendResult<()> {
        self.staging.clear();
        for &id in self.culler.visible() {
            if let Some(light) = registry.directional(id) {
                self.staging.push(DirectionalLightRecord::pack(light));
            }
        }
        self.buffer.upload(backend, &self.staging)
    }

    /// Handle to bind for dispatch (placeholder when nothing is visible)
    pub fn bind_handle(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<BufferHandle> {
        self.buffer.bind_handle(backend)
    }

    /// Whether any light of this kind is registered
    pub fn has_candidates(&self) -> bool {
        self.culler.has_candidates()
    }

    /// Visible count from the last cull
    pub fn visible_count(&self) -> usize {
        self.culler.visible_count()
    }

    /// Current buffer capacity in records
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Release GPU resources and detach from the registry
    pub fn dispose(&mut self, backend: &mut dyn ComputeBackend, registry: &mut CommonDataRegistry) {
        self.buffer.release(backend);
        if let Some(token) = self.token.take() {
            registry.unsubscribe(token);
        }
        self.culler.clear();
    }
}

/// Manages GPU data for visible spot lights
#[derive(Debug)]
pub struct SpotLightManager {
    culler: FrustumCuller<SpotLightId>,
    buffer: RecordBuffer<SpotLightRecord>,
    staging: Vec<SpotLightRecord>,
    token: Option<SubscriptionToken>,
}

impl SpotLightManager {
    /// Create a manager attached to a registry
    pub fn new(registry: &mut CommonDataRegistry) -> Self {
        let token = registry.subscribe();
        let mut culler = FrustumCuller::new();
        for id in registry.spot_ids() {
            culler.register(id);
        }
        Self {
            culler,
            buffer: RecordBuffer::new("spot_light_records"),
            staging: Vec::new(),
            token: Some(token),
        }
    }

    /// Apply registry change events to the culler
    pub fn refresh(&mut self, registry: &mut CommonDataRegistry) {
        let Some(token) = self.token else { return };
        for event in registry.drain_events(token) {
            match event {
                RegistryEvent::Added(EntityId::Spot(id)) => self.culler.register(id),
                RegistryEvent::Removed(EntityId::Spot(id)) => self.culler.unregister(id),
                _ => {}
            }
        }
    }

    /// Recompute the visible set for this frame
    pub fn cull(&mut self, registry: &CommonDataRegistry, frustum: &Frustum) {
        self.culler
            .update(frustum, |id| registry.spot(id).map(|l| l.bounding_sphere));
    }

    /// Reconcile buffer capacity with the visible count
    pub fn setup_buffers(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<()> {
        self.buffer.ensure_capacity(backend, self.culler.visible_count())
    }

    /// Pack every visible light and upload in one batch
    pub fn collect(
        &mut self,
        backend: &mut dyn ComputeBackend,
        registry: &CommonDataRegistry,
    ) -> BackendResult<()> {
        self.staging.clear();
        for &id in self.culler.visible() {
            if let Some(light) = registry.spot(id) {
                self.staging.push(SpotLightRecord::pack(light));
            }
        }
        self.buffer.upload(backend, &self.staging)
    }

    /// Handle to bind for dispatch (placeholder when nothing is visible)
    pub fn bind_handle(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<BufferHandle> {
        self.buffer.bind_handle(backend)
    }

    /// Whether any light of this kind is registered
    pub fn has_candidates(&self) -> bool {
        self.culler.has_candidates()
    }

    /// Visible count from the last cull
    pub fn visible_count(&self) -> usize {
        self.culler.visible_count()
    }

    /// Current buffer capacity in records
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Release GPU resources and detach from the registry
    pub fn dispose(&mut self, backend: &mut dyn ComputeBackend, registry: &mut CommonDataRegistry) {
        self.buffer.release(backend);
        if let Some(token) = self.token.take() {
            registry.unsubscribe(token);
        }
        self.culler.clear();
    }
}

/// Manages GPU data for visible point lights
#[derive(Debug)]
pub struct PointLightManager {
    culler: FrustumCuller<PointLightId>,
    buffer: RecordBuffer<PointLightRecord>,
    staging: Vec<PointLightRecord>,
    token: Option<SubscriptionToken>,
}

impl PointLightManager {
    /// Create a manager attached to a registry
    pub fn new(registry: &mut CommonDataRegistry) -> Self {
        let token = registry.subscribe();
        let mut culler = FrustumCuller::new();
        for id in registry.point_ids() {
            culler.register(id);
        }
        Self {
            culler,
            buffer: RecordBuffer::new("point_light_records"),
            staging: Vec::new(),
            token: Some(token),
        }
    }

    /// Apply registry change events to the culler
    pub fn refresh(&mut self, registry: &mut CommonDataRegistry) {
        let Some(token) = self.token else { return };
        for event in registry.drain_events(token) {
            match event {
                RegistryEvent::Added(EntityId::Point(id)) => self.culler.register(id),
                RegistryEvent::Removed(EntityId::Point(id)) => self.culler.unregister(id),
                _ => {}
            }
        }
    }

    /// Recompute the visible set for this frame
    pub fn cull(&mut self, registry: &CommonDataRegistry, frustum: &Frustum) {
        self.culler
            .update(frustum, |id| registry.point(id).map(|l| l.bounding_sphere));
    }

    /// Reconcile buffer capacity with the visible count
    pub fn setup_buffers(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<()> {
        self.buffer.ensure_capacity(backend, self.culler.visible_count())
    }

    /// Pack every visible light and upload in one batch
    pub fn collect(
        &mut self,
        backend: &mut dyn ComputeBackend,
        registry: &CommonDataRegistry,
    ) -> BackendResult<()> {
        self.staging.clear();
        for &id in self.culler.visible() {
            if let Some(light) = registry.point(id) {
                self.staging.push(PointLightRecord::pack(light));
            }
        }
        self.buffer.upload(backend, &self.staging)
    }

    /// Handle to bind for dispatch (placeholder when nothing is visible)
    pub fn bind_handle(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<BufferHandle> {
        self.buffer.bind_handle(backend)
    }

    /// Whether any light of this kind is registered
    pub fn has_candidates(&self) -> bool {
        self.culler.has_candidates()
    }

    /// Visible count from the last cull
    pub fn visible_count(&self) -> usize {
        self.culler.visible_count()
    }

    /// Current buffer capacity in records
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Release GPU resources and detach from the registry
    pub fn dispose(&mut self, backend: &mut dyn ComputeBackend, registry: &mut CommonDataRegistry) {
        self.buffer.release(backend);
        if let Some(token) = self.token.take() {
            registry.unsubscribe(token);
        }
        self.culler.clear();
    }
}

/// Manages GPU data for visible fog volumes
#[derive(Debug)]
pub struct VolumeManager {
    culler: FrustumCuller<FogVolumeId>,
    buffer: RecordBuffer<VolumeRecord>,
    staging: Vec<VolumeRecord>,
    token: Option<SubscriptionToken>,
}

impl VolumeManager {
    /// Create a manager attached to a registry
    pub fn new(registry: &mut CommonDataRegistry) -> Self {
        let token = registry.subscribe();
        let mut culler = FrustumCuller::new();
        for id in registry.volume_ids() {
            culler.register(id);
        }
        Self {
            culler,
            buffer: RecordBuffer::new("fog_volume_records"),
            staging: Vec::new(),
            token: Some(token),
        }
    }

    /// Apply registry change events to the culler
    pub fn refresh(&mut self, registry: &mut CommonDataRegistry) {
        let Some(token) = self.token else { return };
        for event in registry.drain_events(token) {
            match event {
                RegistryEvent::Added(EntityId::Volume(id)) => self.culler.register(id),
                RegistryEvent::Removed(EntityId::Volume(id)) => self.culler.unregister(id),
                _ => {}
            }
        }
    }

    /// Recompute the visible set for this frame
    pub fn cull(&mut self, registry: &CommonDataRegistry, frustum: &Frustum) {
        self.culler
            .update(frustum, |id| registry.volume(id).map(|v| v.bounding_sphere));
    }

    /// Reconcile buffer capacity with the visible count
    pub fn setup_buffers(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<()> {
        self.buffer.ensure_capacity(backend, self.culler.visible_count())
    }

    /// Pack every visible volume and upload in one batch
    pub fn collect(
        &mut self,
        backend: &mut dyn ComputeBackend,
        registry: &CommonDataRegistry,
    ) -> BackendResult<()> {
        self.staging.clear();
        for &id in self.culler.visible() {
            if let Some(volume) = registry.volume(id) {
                self.staging.push(VolumeRecord::pack(volume));
            }
        }
        self.buffer.upload(backend, &self.staging)
    }

    /// Handle to bind for dispatch (placeholder when nothing is visible)
    pub fn bind_handle(&mut self, backend: &mut dyn ComputeBackend) -> BackendResult<BufferHandle> {
        self.buffer.bind_handle(backend)
    }

    /// Whether any volume is registered
    pub fn has_candidates(&self) -> bool {
        self.culler.has_candidates()
    }

    /// Visible count from the last cull
    pub fn visible_count(&self) -> usize {
        self.culler.visible_count()
    }

    /// Current buffer capacity in records
    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Release GPU resources and detach from the registry
    pub fn dispose(&mut self, backend: &mut dyn ComputeBackend, registry: &mut CommonDataRegistry) {
        self.buffer.release(backend);
        if let Some(token) = self.token.take() {
            registry.unsubscribe(token);
        }
        self.culler.clear();
    }
}
