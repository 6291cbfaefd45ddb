//! The boundary between the engine and the simulation it controls.
//!
//! Every [`Agent`] carries an [`EntityId`] naming the entity it drives (a car,
//! a creature, a test harness). The engine never owns those entities; it asks
//! the host through [`AgentHost`] whenever it needs one created, scored,
//! sensed or moved. Hosts that want a ready-made store can keep their entities
//! in an [`EntityRegistry`].

use std::collections::HashSet;

use slotmap::{new_key_type, SlotMap};

use crate::agent::Agent;

new_key_type! {
    /// Handle of a controlled entity living in the host.
    pub struct EntityId;
}

/// Services the host provides to the engine.
pub trait AgentHost {
    /// Create a fresh entity for the initial population.
    fn create(&mut self) -> EntityId;

    /// Create the entity for an agent cloned or bred from `parent`'s agent.
    ///
    /// `parent` may no longer be live: species champions are kept across
    /// generations, so their handles can name entities the host has already
    /// released (e.g. through [`EntityRegistry::retain_only`]). Treat it as a
    /// lineage hint, not as a key that must resolve.
    fn replicate(&mut self, _parent: EntityId) -> EntityId {
        self.create()
    }

    /// Fitness of an agent once it has finished.
    fn fitness(&self, agent: &Agent) -> f64;

    /// Sensory inputs of an entity for the current tick.
    fn sense(&self, entity: EntityId) -> Vec<f64>;

    /// Apply an agent's decision to its entity.
    ///
    /// The host updates `agent.score` and calls [`Agent::finish`] when its own
    /// termination rule fires.
    fn act(&mut self, entity: EntityId, outputs: &[f64], agent: &mut Agent);
}

/// Handle-indexed store of host entities.
#[derive(Debug, Clone)]
pub struct EntityRegistry<E> {
    entities: SlotMap<EntityId, E>,
}

impl<E> Default for EntityRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EntityRegistry<E> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
        }
    }

    /// Store an entity and return its handle.
    pub fn insert(&mut self, entity: E) -> EntityId {
        self.entities.insert(entity)
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.entities.get(id)
    }

    /// Look up an entity mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        self.entities.get_mut(id)
    }

    /// Remove an entity.
    pub fn remove(&mut self, id: EntityId) -> Option<E> {
        self.entities.remove(id)
    }

    /// Drop every entity whose handle is not in `keep`.
    ///
    /// Call after a generational boundary with the new population's handles
    /// to release the entities of the rejected generation.
    pub fn retain_only<I>(&mut self, keep: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        let keep: HashSet<EntityId> = keep.into_iter().collect();
        self.entities.retain(|id, _| keep.contains(&id));
    }

    /// Number of stored entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over handles and entities.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &E)> {
        self.entities.iter()
    }
}
