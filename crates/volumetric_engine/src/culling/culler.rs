//! Generic frustum culler
//!
//! Tracks a registered set of boundable entities by key and recomputes,
//! once per frame, the subset overlapping the camera frustum. The visible
//! set preserves registration order and is never persisted across frames.

use crate::foundation::math::BoundingSphere;

use super::frustum::Frustum;

/// Tracks registered entities and their per-frame visible subset
///
/// `K` is a cheap copyable key (typically a slotmap id); the entity's
/// bounding sphere is looked up at cull time so the owner's latest
/// transform is always honored.
#[derive(Debug)]
pub struct FrustumCuller<K: Eq + Copy> {
    tracked: Vec<K>,
    visible: Vec<K>,
}

impl<K: Eq + Copy> FrustumCuller<K> {
    /// Create an empty culler
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Track an entity; re-registering an already-tracked key is a no-op
    pub fn register(&mut self, key: K) {
        if !self.tracked.contains(&key) {
            self.tracked.push(key);
        }
    }

    /// Stop tracking an entity; idempotent
    ///
    /// Also drops the key from the last computed visible set so stale
    /// entries can never be observed after removal.
    pub fn unregister(&mut self, key: K) {
        self.tracked.retain(|&k| k != key);
        self.visible.retain(|&k| k != key);
    }

    /// Recompute the visible set against a frustum
    ///
    /// `sphere_of` resolves a tracked key to its current bounding sphere;
    /// keys it cannot resolve are skipped. Order of the visible set is the
    /// registration order, unsorted by distance.
    pub fn update<F>(&mut self, frustum: &Frustum, mut sphere_of: F)
    where
        F: FnMut(K) -> Option<BoundingSphere>,
    {
        self.visible.clear();
        for &key in &self.tracked {
            if let Some(sphere) = sphere_of(key) {
                if frustum.intersects_sphere(&sphere) {
                    self.visible.push(key);
                }
            }
        }
    }

    /// Visible set from the last update (empty before any update)
    pub fn visible(&self) -> &[K] {
        &self.visible
    }

    /// Number of visible entities from the last update
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Whether the last update found any visible entity
    pub fn has_visible(&self) -> bool {
        !self.visible.is_empty()
    }

    /// Number of tracked entities
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Whether any entity is tracked (candidates exist)
    pub fn has_candidates(&self) -> bool {
        !self.tracked.is_empty()
    }

    /// Drop all tracked entities and the visible set
    pub fn clear(&mut self) {
        self.tracked.clear();
        self.visible.clear();
    }
}

impl<K: Eq + Copy> Default for FrustumCuller<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling::camera::CameraState;
    use crate::foundation::math::Vec3;

    fn forward_frustum() -> Frustum {
        let camera = CameraState::perspective(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, 1.0),
            60.0,
            16.0 / 9.0,
            0.1,
            1000.0,
        );
        Frustum::from_camera(&camera, 100.0)
    }

    fn sphere_at_z(z: f32) -> BoundingSphere {
        BoundingSphere::new(Vec3::new(0.0, 0.0, z), 1.0)
    }

    #[test]
    fn test_visible_before_update_is_empty() {
        let mut culler = FrustumCuller::new();
        culler.register(1_u32);
        assert!(culler.visible().is_empty());
        assert_eq!(culler.visible_count(), 0);
        assert!(!culler.has_visible());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut culler = FrustumCuller::new();
        culler.register(7_u32);
        culler.register(7_u32);
        assert_eq!(culler.tracked_count(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut culler = FrustumCuller::new();
        culler.register(7_u32);
        culler.unregister(7_u32);
        culler.unregister(7_u32);
        assert_eq!(culler.tracked_count(), 0);
    }

    #[test]
    fn test_visible_preserves_registration_order() {
        let mut culler = FrustumCuller::new();
        for key in [3_u32, 1, 2] {
            culler.register(key);
        }
        let frustum = forward_frustum();
        culler.update(&frustum, |_| Some(sphere_at_z(10.0)));
        assert_eq!(culler.visible(), &[3, 1, 2]);
    }

    #[test]
    fn test_visible_never_exceeds_tracked() {
        let mut culler = FrustumCuller::new();
        for key in 0_u32..5 {
            culler.register(key);
        }
        let frustum = forward_frustum();
        // keys 0..3 in front, 3..5 behind
        culler.update(&frustum, |key| {
            Some(sphere_at_z(if key < 3 { 10.0 } else { -10.0 }))
        });
        assert_eq!(culler.visible_count(), 3);
        assert!(culler.visible_count() <= culler.tracked_count());
    }

    #[test]
    fn test_unregister_drops_from_visible_set() {
        let mut culler = FrustumCuller::new();
        culler.register(1_u32);
        culler.register(2_u32);
        let frustum = forward_frustum();
        culler.update(&frustum, |_| Some(sphere_at_z(10.0)));
        assert_eq!(culler.visible_count(), 2);

        culler.unregister(1);
        assert_eq!(culler.visible(), &[2]);
    }

    #[test]
    fn test_unresolvable_keys_are_skipped() {
        let mut culler = FrustumCuller::new();
        culler.register(1_u32);
        culler.register(2_u32);
        let frustum = forward_frustum();
        culler.update(&frustum, |key| (key == 2).then(|| sphere_at_z(10.0)));
        assert_eq!(culler.visible(), &[2]);
    }
}
