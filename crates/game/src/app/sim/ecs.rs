use std::collections::HashMap;

pub use engine::{EntityId as Entity, EntityIdAllocator};

/// Dense component storage with O(1) lookup, insert and remove.
///
/// Components live in a packed `Vec` parallel to the owning entities, with a
/// hash index on the side. Removal swaps the last element into the hole, so
/// iteration order changes on remove and is otherwise insertion order.
pub struct ComponentStore<T> {
    entities: Vec<Entity>,
    components: Vec<T>,
    index: HashMap<Entity, usize>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        ComponentStore {
            entities: Vec::new(),
            components: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> ComponentStore<T> {
    /// Inserts a component for `entity`. Panics if the entity already has one;
    /// double inserts are always a logic error in the simulation.
    pub fn emplace(&mut self, entity: Entity, component: T) -> &mut T {
        assert!(
            !self.index.contains_key(&entity),
            "duplicate component insert for entity {}",
            entity.0
        );
        let slot = self.components.len();
        self.index.insert(entity, slot);
        self.entities.push(entity);
        self.components.push(component);
        &mut self.components[slot]
    }

    /// Inserts or overwrites, for components that legitimately get reassigned
    /// (tint colors mostly).
    pub fn upsert(&mut self, entity: Entity, component: T) {
        match self.index.get(&entity) {
            Some(&slot) => self.components[slot] = component,
            None => {
                self.emplace(entity, component);
            }
        }
    }

    pub fn has(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    pub fn get(&self, entity: Entity) -> &T {
        match self.index.get(&entity) {
            Some(&slot) => &self.components[slot],
            None => panic!("no component for entity {}", entity.0),
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        match self.index.get(&entity) {
            Some(&slot) => &mut self.components[slot],
            None => panic!("no component for entity {}", entity.0),
        }
    }

    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.index.get(&entity).map(|&slot| &self.components[slot])
    }

    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.index.get(&entity) {
            Some(&slot) => Some(&mut self.components[slot]),
            None => None,
        }
    }

    /// Removes the component if present; unknown entities are a no-op.
    /// The last element is swapped into the vacated slot.
    pub fn remove(&mut self, entity: Entity) {
        let Some(slot) = self.index.remove(&entity) else {
            return;
        };
        self.entities.swap_remove(slot);
        self.components.swap_remove(slot);
        if slot < self.entities.len() {
            self.index.insert(self.entities[slot], slot);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.components.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn components(&self) -> &[T] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    pub fn entry(&self, slot: usize) -> (Entity, &T) {
        (self.entities[slot], &self.components[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.components.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities
            .iter()
            .copied()
            .zip(self.components.iter_mut())
    }
}

/// Contacts found by the physics pass, consumed once per frame.
///
/// Every overlap is recorded twice, `(a, b)` and `(b, a)`, so resolution
/// rules only ever need to inspect their first slot. Duplicates are allowed
/// by design; the log is a queue, not a set.
#[derive(Default)]
pub struct CollisionLog {
    pairs: Vec<(Entity, Entity)>,
}

impl CollisionLog {
    pub fn push(&mut self, entity: Entity, other: Entity) {
        self.pairs.push((entity, other));
    }

    pub fn pairs(&self) -> &[(Entity, Entity)] {
        &self.pairs
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<Entity> {
        let mut alloc = EntityIdAllocator::default();
        (0..n).map(|_| alloc.allocate()).collect()
    }

    #[test]
    fn emplace_then_get_round_trips() {
        let e = ids(2);
        let mut store: ComponentStore<i32> = ComponentStore::default();
        store.emplace(e[0], 7);
        store.emplace(e[1], 9);

        assert!(store.has(e[0]));
        assert_eq!(*store.get(e[0]), 7);
        assert_eq!(*store.get(e[1]), 9);
        assert_eq!(store.len(), 2);
    }

    #[test]
    #[should_panic(expected = "duplicate component insert")]
    fn emplace_twice_panics() {
        let e = ids(1);
        let mut store: ComponentStore<i32> = ComponentStore::default();
        store.emplace(e[0], 1);
        store.emplace(e[0], 2);
    }

    #[test]
    fn remove_swaps_last_into_hole() {
        let e = ids(4);
        let mut store: ComponentStore<i32> = ComponentStore::default();
        for (i, &entity) in e.iter().enumerate() {
            store.emplace(entity, i as i32);
        }

        store.remove(e[1]);

        // The last element moved into slot 1; everything stays reachable.
        assert_eq!(store.entities(), &[e[0], e[3], e[2]]);
        assert_eq!(*store.get(e[3]), 3);
        assert_eq!(*store.get(e[2]), 2);
        assert!(!store.has(e[1]));
    }

    #[test]
    fn remove_of_absent_entity_is_noop() {
        let e = ids(2);
        let mut store: ComponentStore<i32> = ComponentStore::default();
        store.emplace(e[0], 5);
        store.remove(e[1]);
        assert_eq!(store.len(), 1);
        assert_eq!(*store.get(e[0]), 5);
    }

    #[test]
    fn upsert_overwrites_in_place() {
        let e = ids(1);
        let mut store: ComponentStore<i32> = ComponentStore::default();
        store.upsert(e[0], 1);
        store.upsert(e[0], 2);
        assert_eq!(store.len(), 1);
        assert_eq!(*store.get(e[0]), 2);
    }

    #[test]
    fn collision_log_keeps_duplicates() {
        let e = ids(2);
        let mut log = CollisionLog::default();
        log.push(e[0], e[1]);
        log.push(e[1], e[0]);
        log.push(e[0], e[1]);
        assert_eq!(log.len(), 3);
        log.clear();
        assert!(log.is_empty());
    }
}
