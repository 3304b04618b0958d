//! Common data registry
//!
//! Explicitly owned registration context for lights and fog volumes.
//! External components register on enable and unregister on disable; the
//! registry raises change events that per-kind data managers consume
//! through per-subscriber queues, so managers can attach their cullers
//! without the registry knowing about cullers.
//!
//! Unregistration is deferred: external unregister calls only enqueue the
//! removal, and [`CommonDataRegistry::apply_deferred`] applies the queue at
//! the next frame's sequence start. A visible-set array computed during a
//! frame therefore never has an entity removed out from under it.

use std::collections::VecDeque;

use slotmap::{new_key_type, SlotMap};

use crate::lights::{DirectionalLight, FogVolume, PointLight, SpotLight};

new_key_type! {
    /// Id of a registered directional light
    pub struct DirectionalLightId;
    /// Id of a registered spot light
    pub struct SpotLightId;
    /// Id of a registered point light
    pub struct PointLightId;
    /// Id of a registered fog volume
    pub struct FogVolumeId;
    /// Disposable subscription token returned by [`CommonDataRegistry::subscribe`]
    pub struct SubscriptionToken;
}

/// Kind of a registered entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Directional light
    DirectionalLight,
    /// Spot light
    SpotLight,
    /// Point light
    PointLight,
    /// Fog volume
    FogVolume,
}

/// Kind-tagged id of a registered entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityId {
    /// A directional light
    Directional(DirectionalLightId),
    /// A spot light
    Spot(SpotLightId),
    /// A point light
    Point(PointLightId),
    /// A fog volume
    Volume(FogVolumeId),
}

impl EntityId {
    /// Kind of the identified entity
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Directional(_) => EntityKind::DirectionalLight,
            Self::Spot(_) => EntityKind::SpotLight,
            Self::Point(_) => EntityKind::PointLight,
            Self::Volume(_) => EntityKind::FogVolume,
        }
    }
}

/// Change event delivered to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// An entity was registered
    Added(EntityId),
    /// An entity's deferred removal was applied
    Removed(EntityId),
}

/// Registry of all lights and volumes available to one pipeline context
///
/// Explicitly constructed and owned by its pipeline; multiple independent
/// instances never cross-talk.
#[derive(Debug, Default)]
pub struct CommonDataRegistry {
    directional: SlotMap<DirectionalLightId, DirectionalLight>,
    spot: SlotMap<SpotLightId, SpotLight>,
    point: SlotMap<PointLightId, PointLight>,
    volumes: SlotMap<FogVolumeId, FogVolume>,
    subscribers: SlotMap<SubscriptionToken, VecDeque<RegistryEvent>>,
    pending_removals: Vec<EntityId>,
}

impl CommonDataRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // --- subscriptions ---

    /// Subscribe to change events
    ///
    /// Events accumulate per subscriber until drained. The token must be
    /// released with [`Self::unsubscribe`] in the subscriber's teardown
    /// path.
    pub fn subscribe(&mut self) -> SubscriptionToken {
        self.subscribers.insert(VecDeque::new())
    }

    /// Dispose a subscription; idempotent
    pub fn unsubscribe(&mut self, token: SubscriptionToken) {
        self.subscribers.remove(token);
    }

    /// Drain all pending events for a subscriber
    pub fn drain_events(&mut self, token: SubscriptionToken) -> Vec<RegistryEvent> {
        self.subscribers
            .get_mut(token)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    fn publish(&mut self, event: RegistryEvent) {
        for (_, queue) in &mut self.subscribers {
            queue.push_back(event);
        }
    }

    // --- registration ---

    /// Register a directional light
    pub fn register_directional(&mut self, light: DirectionalLight) -> DirectionalLightId {
        let id = self.directional.insert(light);
        self.publish(RegistryEvent::Added(EntityId::Directional(id)));
        id
    }

    /// Register a spot light
    pub fn register_spot(&mut self, light: SpotLight) -> SpotLightId {
        let id = self.spot.insert(light);
        self.publish(RegistryEvent::Added(EntityId::Spot(id)));
        id
    }

    /// Register a point light
    pub fn register_point(&mut self, light: PointLight) -> PointLightId {
        let id = self.point.insert(light);
        self.publish(RegistryEvent::Added(EntityId::Point(id)));
        id
    }

    /// Register a fog volume
    pub fn register_volume(&mut self, volume: FogVolume) -> FogVolumeId {
        let id = self.volumes.insert(volume);
        self.publish(RegistryEvent::Added(EntityId::Volume(id)));
        id
    }

    /// Queue removal of a directional light; idempotent
    pub fn unregister_directional(&mut self, id: DirectionalLightId) {
        self.queue_removal(EntityId::Directional(id), self.directional.contains_key(id));
    }

    /// Queue removal of a spot light; idempotent
    pub fn unregister_spot(&mut self, id: SpotLightId) {
        self.queue_removal(EntityId::Spot(id), self.spot.contains_key(id));
    }

    /// Queue removal of a point light; idempotent
    pub fn unregister_point(&mut self, id: PointLightId) {
        self.queue_removal(EntityId::Point(id), self.point.contains_key(id));
    }

    /// Queue removal of a fog volume; idempotent
    pub fn unregister_volume(&mut self, id: FogVolumeId) {
        self.queue_removal(EntityId::Volume(id), self.volumes.contains_key(id));
    }

    fn queue_removal(&mut self, id: EntityId, live: bool) {
        if live && !self.pending_removals.contains(&id) {
            self.pending_removals.push(id);
        }
    }

    /// Apply all queued removals
    ///
    /// Invoked by the orchestrator at the start of each frame's sequence,
    /// before any culler iterates. Publishes a `Removed` event for each
    /// entity actually removed.
    pub fn apply_deferred(&mut self) {
        let pending = std::mem::take(&mut self.pending_removals);
        for id in pending {
            let removed = match id {
                EntityId::Directional(key) => self.directional.remove(key).is_some(),
                EntityId::Spot(key) => self.spot.remove(key).is_some(),
                EntityId::Point(key) => self.point.remove(key).is_some(),
                EntityId::Volume(key) => self.volumes.remove(key).is_some(),
            };
            if removed {
                self.publish(RegistryEvent::Removed(id));
            }
        }
    }

    // --- descriptor access ---

    /// Look up a directional light
    pub fn directional(&self, id: DirectionalLightId) -> Option<&DirectionalLight> {
        self.directional.get(id)
    }

    /// Look up a spot light
    pub fn spot(&self, id: SpotLightId) -> Option<&SpotLight> {
        self.spot.get(id)
    }

    /// Look up a point light
    pub fn point(&self, id: PointLightId) -> Option<&PointLight> {
        self.point.get(id)
    }

    /// Look up a fog volume
    pub fn volume(&self, id: FogVolumeId) -> Option<&FogVolume> {
        self.volumes.get(id)
    }

    /// Replace a directional light's descriptor (owner transform update)
    pub fn update_directional(&mut self, id: DirectionalLightId, light: DirectionalLight) -> bool {
        match self.directional.get_mut(id) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => false,
        }
    }

    /// Replace a spot light's descriptor
    pub fn update_spot(&mut self, id: SpotLightId, light: SpotLight) -> bool {
        match self.spot.get_mut(id) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => false,
        }
    }

    /// Replace a point light's descriptor
    pub fn update_point(&mut self, id: PointLightId, light: PointLight) -> bool {
        match self.point.get_mut(id) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => false,
        }
    }

    /// Replace a fog volume's descriptor
    pub fn update_volume(&mut self, id: FogVolumeId, volume: FogVolume) -> bool {
        match self.volumes.get_mut(id) {
            Some(slot) => {
                *slot = volume;
                true
            }
            None => false,
        }
    }

    /// Ids of all registered directional lights
    pub fn directional_ids(&self) -> impl Iterator<Item = DirectionalLightId> + '_ {
        self.directional.keys()
    }

    /// Ids of all registered spot lights
    pub fn spot_ids(&self) -> impl Iterator<Item = SpotLightId> + '_ {
        self.spot.keys()
    }

    /// Ids of all registered point lights
    pub fn point_ids(&self) -> impl Iterator<Item = PointLightId> + '_ {
        self.point.keys()
    }

    /// Ids of all registered fog volumes
    pub fn volume_ids(&self) -> impl Iterator<Item = FogVolumeId> + '_ {
        self.volumes.keys()
    }

    // --- aggregated queries ---

    /// Number of registered entities of a kind
    pub fn registered_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::DirectionalLight => self.directional.len(),
            EntityKind::SpotLight => self.spot.len(),
            EntityKind::PointLight => self.point.len(),
            EntityKind::FogVolume => self.volumes.len(),
        }
    }

    /// Whether any registered light of `kind` casts shadows
    ///
    /// Linear scan of the kind's list; registration changes are rare
    /// relative to per-frame queries.
    pub fn has_shadow_caster(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::DirectionalLight => {
                self.directional.values().any(|l| l.casts_shadows)
            }
            EntityKind::SpotLight => self.spot.values().any(|l| l.casts_shadows),
            EntityKind::PointLight => self.point.values().any(|l| l.casts_shadows),
            EntityKind::FogVolume => false,
        }
    }

    /// Whether any registered light of `kind` projects a cookie texture
    pub fn has_cookie_caster(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::DirectionalLight => {
                self.directional.values().any(|l| l.cookie_index >= 0)
            }
            EntityKind::SpotLight => self.spot.values().any(|l| l.cookie_index >= 0),
            EntityKind::PointLight => self.point.values().any(|l| l.cookie_index >= 0),
            EntityKind::FogVolume => false,
        }
    }

    /// Whether any registered volume samples animated noise
    pub fn has_noise_volume(&self) -> bool {
        self.volumes.values().any(|v| v.noise_enabled)
    }

    /// Whether any registered volume samples a density texture
    pub fn has_texture_volume(&self) -> bool {
        self.volumes.values().any(|v| v.texture_index >= 0)
    }

    /// Tear the registry down: clear all lists and subscriber queues
    pub fn clear(&mut self) {
        self.directional.clear();
        self.spot.clear();
        self.point.clear();
        self.volumes.clear();
        self.subscribers.clear();
        self.pending_removals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{BoundingSphere, Vec3};

    fn point_light() -> PointLight {
        PointLight::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)
    }

    #[test]
    fn test_register_publishes_to_subscribers() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();

        let id = registry.register_point(point_light());
        let events = registry.drain_events(token);
        assert_eq!(events, vec![RegistryEvent::Added(EntityId::Point(id))]);

        // drained queues are empty
        assert!(registry.drain_events(token).is_empty());
    }

    #[test]
    fn test_unregister_is_deferred_until_applied() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();
        let id = registry.register_point(point_light());
        registry.drain_events(token);

        registry.unregister_point(id);
        // still resolvable until the next sequence start
        assert!(registry.point(id).is_some());
        assert!(registry.drain_events(token).is_empty());

        registry.apply_deferred();
        assert!(registry.point(id).is_none());
        assert_eq!(
            registry.drain_events(token),
            vec![RegistryEvent::Removed(EntityId::Point(id))]
        );
    }

    #[test]
    fn test_double_unregister_has_no_additional_effect() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();
        let id = registry.register_point(point_light());
        registry.drain_events(token);

        registry.unregister_point(id);
        registry.unregister_point(id);
        registry.apply_deferred();
        assert_eq!(registry.drain_events(token).len(), 1);

        // unregistering an already-removed id is a no-op
        registry.unregister_point(id);
        registry.apply_deferred();
        assert!(registry.drain_events(token).is_empty());
    }

    #[test]
    fn test_shadow_caster_query() {
        let mut registry = CommonDataRegistry::new();
        assert!(!registry.has_shadow_caster(EntityKind::PointLight));

        let mut light = point_light();
        light.casts_shadows = true;
        registry.register_point(light);
        assert!(registry.has_shadow_caster(EntityKind::PointLight));
        assert!(!registry.has_shadow_caster(EntityKind::SpotLight));
    }

    #[test]
    fn test_update_replaces_descriptor_in_place() {
        let mut registry = CommonDataRegistry::new();
        let id = registry.register_point(point_light());

        // owner moves the light and refreshes its bounding sphere
        let mut moved = point_light();
        moved.position = Vec3::new(0.0, 0.0, -5.0);
        moved.bounding_sphere = BoundingSphere::new(moved.position, moved.range);
        assert!(registry.update_point(id, moved));
        assert_eq!(registry.point(id).map(|l| l.position.z), Some(-5.0));

        // updating a removed id reports failure
        registry.unregister_point(id);
        registry.apply_deferred();
        assert!(!registry.update_point(id, point_light()));
    }

    #[test]
    fn test_event_ids_carry_their_kind() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();
        registry.register_point(point_light());
        registry.register_volume(FogVolume::new(
            BoundingSphere::new(Vec3::zeros(), 1.0),
            0.5,
        ));

        let kinds: Vec<_> = registry
            .drain_events(token)
            .iter()
            .map(|event| match event {
                RegistryEvent::Added(id) | RegistryEvent::Removed(id) => id.kind(),
            })
            .collect();
        assert_eq!(kinds, vec![EntityKind::PointLight, EntityKind::FogVolume]);
    }

    #[test]
    fn test_unsubscribed_token_receives_nothing() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();
        registry.unsubscribe(token);

        registry.register_point(point_light());
        assert!(registry.drain_events(token).is_empty());
    }

    #[test]
    fn test_clear_tears_down_everything() {
        let mut registry = CommonDataRegistry::new();
        let token = registry.subscribe();
        let id = registry.register_point(point_light());
        registry.unregister_point(id);

        registry.clear();
        assert_eq!(registry.registered_count(EntityKind::PointLight), 0);
        assert!(registry.drain_events(token).is_empty());
        // a queued removal must not resurface
        registry.apply_deferred();
    }
}
