//! A typed table of entities, one per entity type.
//!
//! Entities are registered once while a document is being loaded. After that the registry is
//! sealed and only looked up. Each entity gets a dense index in registration order, which is
//! what [`EntityId`] wraps, so that entities can refer to each other without references.

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use ahash::AHashMap;

use crate::error::InvariantError;

/// Something that can live in a [`Registry`].
pub trait Entity {
    /// Human-readable name of the entity type, used in reports and errors.
    const KIND: &'static str;

    /// The name under which this entity is registered. It is unique within its registry.
    fn name(&self) -> &str;
}

/// The index of an entity in its [`Registry`].
pub struct EntityId<T> {
    idx: usize,
    kind: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    fn new(idx: usize) -> Self {
        EntityId { idx, kind: PhantomData }
    }

    pub fn index(self) -> usize {
        self.idx
    }
}

// These are implemented by hand because deriving them would require `T` to implement them too.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.idx == other.idx
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.idx.cmp(&other.idx)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.idx.hash(state);
    }
}

impl<T: Entity> Debug for EntityId<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", T::KIND, self.idx)
    }
}

#[derive(Debug)]
pub struct Registry<T> {
    entities: Vec<T>,
    names: AHashMap<String, usize>,
    sealed: bool,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry { entities: Vec::new(), names: AHashMap::default(), sealed: false }
    }
}

impl<T: Entity> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity and return its id.
    /// Fails if the registry is sealed or if another entity already has the same name.
    pub fn register(&mut self, entity: T) -> Result<EntityId<T>, InvariantError> {
        if self.sealed {
            return Err(InvariantError::Sealed { kind: T::KIND, name: entity.name().to_string() });
        }
        if self.names.contains_key(entity.name()) {
            return Err(InvariantError::DuplicateName {
                kind: T::KIND,
                name: entity.name().to_string(),
            });
        }
        let idx = self.entities.len();
        self.names.insert(entity.name().to_string(), idx);
        self.entities.push(entity);
        Ok(EntityId::new(idx))
    }

    pub fn lookup(&self, name: &str) -> Option<EntityId<T>> {
        self.names.get(name).copied().map(EntityId::new)
    }

    /// Look up an entity by name and return the entity itself.
    pub fn lookup_entity(&self, name: &str) -> Option<&T> {
        self.names.get(name).map(|&idx| &self.entities[idx])
    }

    pub fn get(&self, id: EntityId<T>) -> &T {
        &self.entities[id.idx]
    }

    pub fn get_mut(&mut self, id: EntityId<T>) -> &mut T {
        &mut self.entities[id.idx]
    }

    pub fn by_index(&self, idx: usize) -> Option<&T> {
        self.entities.get(idx)
    }

    /// Iterate over the entities with their ids, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId<T>, &T)> {
        self.entities.iter().enumerate().map(|(idx, entity)| (EntityId::new(idx), entity))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId<T>, &mut T)> {
        self.entities.iter_mut().enumerate().map(|(idx, entity)| (EntityId::new(idx), entity))
    }

    /// All the entities, in registration order.
    pub fn all(&self) -> &[T] {
        &self.entities
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId<T>> {
        (0..self.entities.len()).map(EntityId::new)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Stop accepting new entities. This cannot be undone.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}
