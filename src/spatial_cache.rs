//! Spatial cache of live entity positions.
//!
//! Mirrors the grid for the entities the zone tracks, so that "every live
//! entity" can be walked without scanning every cell. The grid stays the
//! source of truth; this is updated alongside it on every place, move and
//! removal.

use std::collections::HashMap;

use hecs::Entity;

#[derive(Debug, Clone, Default)]
pub struct SpatialCache {
    /// Entity -> last known (row, col)
    entity_positions: HashMap<Entity, (i32, i32)>,
}

impl SpatialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an entity.
    pub fn register_entity(&mut self, entity: Entity, position: (i32, i32)) {
        self.entity_positions.insert(entity, position);
    }

    /// Update an entity's position. Untracked entities are ignored.
    pub fn update_position(&mut self, entity: Entity, new_pos: (i32, i32)) {
        if let Some(pos) = self.entity_positions.get_mut(&entity) {
            *pos = new_pos;
        }
    }

    /// Stop tracking an entity (death or despawn).
    pub fn remove_entity(&mut self, entity: Entity) -> Option<(i32, i32)> {
        self.entity_positions.remove(&entity)
    }

    #[inline]
    pub fn position(&self, entity: Entity) -> Option<(i32, i32)> {
        self.entity_positions.get(&entity).copied()
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_positions.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.entity_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, (i32, i32))> + '_ {
        self.entity_positions.iter().map(|(e, pos)| (*e, *pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn test_register_update_remove() {
        let mut world = World::new();
        let entity = world.spawn(());
        let mut cache = SpatialCache::new();

        cache.register_entity(entity, (1, 1));
        cache.update_position(entity, (1, 2));
        assert_eq!(cache.position(entity), Some((1, 2)));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.remove_entity(entity), Some((1, 2)));
        assert!(!cache.contains(entity));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_update_ignores_untracked() {
        let mut world = World::new();
        let entity = world.spawn(());
        let mut cache = SpatialCache::new();
        cache.update_position(entity, (3, 3));
        assert_eq!(cache.position(entity), None);
    }
}
