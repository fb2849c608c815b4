//! Entities and the generational arena that owns them.
//!
//! Every gameplay object is an [`Entity`]: a kinematic body plus a closed
//! set of kind-specific states. Cross-references between entities are
//! [`EntityId`] handles into the level's arena, never owning pointers; a
//! handle to a removed entity simply dereferences to `None`.

use glam::IVec2;

use crate::geom::Rect;
use crate::sim::body::Body;
use crate::sim::bullet::Bullet;
use crate::sim::creature::Creature;
use crate::sim::guy::Guy;
use crate::sim::player::Player;
use crate::sim::scenery::{Decor, Torch, Trigger, Waterfall};

/// Handle to an entity slot. Stale handles (the slot was freed or reused)
/// fail the generation check on dereference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

#[cfg(test)]
impl EntityId {
    /// Fabricate a handle for roster tests that never dereference it.
    pub(crate) fn for_test(index: u32) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

/// Runtime type tag for entity queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTag {
    Player,
    Guy,
    Creature,
    Bullet,
    Column,
    Torch,
    Decor,
    Waterfall,
    Trigger,
}

/// Kind-specific entity state.
#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(Player),
    Guy(Guy),
    Creature(Creature),
    Bullet(Bullet),
    Column,
    Torch(Torch),
    /// Inert decoration pinned to the tile grid
    Decor(Decor),
    Waterfall(Waterfall),
    Trigger(Trigger),
}

impl EntityKind {
    pub fn tag(&self) -> KindTag {
        match self {
            EntityKind::Player(_) => KindTag::Player,
            EntityKind::Guy(_) => KindTag::Guy,
            EntityKind::Creature(_) => KindTag::Creature,
            EntityKind::Bullet(_) => KindTag::Bullet,
            EntityKind::Column => KindTag::Column,
            EntityKind::Torch(_) => KindTag::Torch,
            EntityKind::Decor(_) => KindTag::Decor,
            EntityKind::Waterfall(_) => KindTag::Waterfall,
            EntityKind::Trigger(_) => KindTag::Trigger,
        }
    }
}

/// One simulated object.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    /// Terminal marker: removed from the level at the end of the current
    /// update pass, never mid-pass.
    pub done: bool,
    /// Animation clock, seconds
    pub anim_time: f32,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, pos: IVec2, size: IVec2, kind: EntityKind) -> Self {
        Self {
            id,
            body: Body::new(pos, size),
            done: false,
            anim_time: 0.0,
            kind,
        }
    }

    pub fn rect(&self) -> Rect {
        self.body.rect
    }

    pub fn is_touching(&self, other: &Entity) -> bool {
        self.body.is_touching(&other.body)
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            EntityKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_guy(&self) -> Option<&Guy> {
        match &self.kind {
            EntityKind::Guy(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_guy_mut(&mut self) -> Option<&mut Guy> {
        match &mut self.kind {
            EntityKind::Guy(g) => Some(g),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Generational slot arena. Slots of removed entities are reused with a
/// bumped generation so old handles cannot alias new entities.
#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocate a slot and build the entity with its final id.
    pub fn insert_with(&mut self, make: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let id = EntityId {
            index,
            generation: slot.generation,
        };
        slot.entity = Some(make(id));
        self.len += 1;
        id
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        let slot = self.slots.get(id.index as usize)?;
        (slot.generation == id.generation).then_some(slot)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slot(id)?.entity.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.as_mut()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|s| s.entity.is_some())
    }

    /// Take the entity out of its slot (for the duration of its update);
    /// the slot stays reserved until [`Arena::restore`].
    pub fn take(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entity.take()
    }

    /// Put a taken entity back into its reserved slot.
    pub fn restore(&mut self, entity: Entity) {
        let index = entity.id.index as usize;
        debug_assert!(self.slots[index].generation == entity.id.generation);
        debug_assert!(self.slots[index].entity.is_none());
        self.slots[index].entity = Some(entity);
    }

    /// Free the slot, invalidating every outstanding handle to it.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let entity = slot.entity.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(id: EntityId) -> Entity {
        Entity::new(id, IVec2::ZERO, IVec2::new(16, 16), EntityKind::Column)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut arena = Arena::new();
        let id = arena.insert_with(dummy);
        assert!(arena.contains(id));
        assert_eq!(arena.get(id).unwrap().id, id);

        let removed = arena.remove(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(arena.get(id).is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut arena = Arena::new();
        let old = arena.insert_with(dummy);
        arena.remove(old);

        // The slot is reused, but the old handle stays dead.
        let new = arena.insert_with(dummy);
        assert_ne!(old, new);
        assert!(arena.get(old).is_none());
        assert!(arena.get(new).is_some());
        assert!(arena.remove(old).is_none());
    }

    #[test]
    fn test_take_and_restore() {
        let mut arena = Arena::new();
        let id = arena.insert_with(dummy);

        let ent = arena.take(id).unwrap();
        assert!(arena.get(id).is_none());
        arena.restore(ent);
        assert!(arena.get(id).is_some());
        assert_eq!(arena.len(), 1);
    }
}
