//! Entity storage with generational handles
//!
//! Entities are appended for the lifetime of a level and thrown away all
//! at once on reload. `EntityId` carries a generation so a handle kept
//! across a reload can never alias an entity from the new level: `clear`
//! bumps every slot's generation and lookups re-validate it.

use super::entity::Entity;

/// A unique handle to an entity in the store.
///
/// Two handles with the same index but different generations refer to
/// entities from different level loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// A null/invalid handle, used for "collided with nothing".
    pub const NULL: EntityId = EntityId {
        index: u32::MAX,
        generation: 0,
    };

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        EntityId::NULL
    }
}

/// Growable arena of entities. Spawning appends; there is no per-entity
/// free, only the wholesale `clear` at level reload.
pub struct EntityStore {
    entities: Vec<Entity>,
    /// One generation counter per slot; persists across clears
    generations: Vec<u32>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            generations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Append an entity, returning its handle.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let index = self.entities.len() as u32;
        if (index as usize) >= self.generations.len() {
            self.generations.push(0);
        }
        self.entities.push(entity);
        EntityId {
            index,
            generation: self.generations[index as usize],
        }
    }

    /// Drop every entity and invalidate all outstanding handles.
    pub fn clear(&mut self) {
        for generation in &mut self.generations[..self.entities.len()] {
            *generation += 1;
        }
        self.entities.clear();
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index as usize;
        !id.is_null() && idx < self.entities.len() && self.generations[idx] == id.generation
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        if self.is_alive(id) {
            Some(&self.entities[id.index as usize])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if self.is_alive(id) {
            Some(&mut self.entities[id.index as usize])
        } else {
            None
        }
    }

    /// Handle for the entity at `index`, in spawn order.
    pub fn id_at(&self, index: usize) -> Option<EntityId> {
        if index < self.entities.len() {
            Some(EntityId {
                index: index as u32,
                generation: self.generations[index],
            })
        } else {
            None
        }
    }

    /// Entity at `index` without a handle check (iteration helper).
    pub fn at(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
