//! Entity arena
//!
//! Entities are stored by index. Each mention keeps the index of the entity
//! it currently belongs to; a merge moves the members of one entity into the
//! other and rewrites their indexes, leaving the absorbed slot empty.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use coref_core::{Animacy, Attributes, DocumentGraph, Gender, NodeId, Number, Person, Span};

/// Index of an entity inside an [`EntityArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone)]
struct Slot {
    /// Span of the founding mention
    key: Span,
    /// Members sorted by (span, id)
    members: Vec<(Span, NodeId)>,
}

/// Per-document entity partition
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    slots: Vec<Slot>,
    membership: HashMap<NodeId, EntityId>,
    by_span: HashMap<Span, NodeId>,
}

impl EntityArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a singleton entity for a mention
    ///
    /// A mention that already has an entity keeps it.
    pub fn seed(&mut self, mention: NodeId, span: Span) -> EntityId {
        if let Some(&entity) = self.membership.get(&mention) {
            return entity;
        }
        let entity = EntityId(self.slots.len());
        self.slots.push(Slot {
            key: span,
            members: vec![(span, mention)],
        });
        self.membership.insert(mention, entity);
        self.by_span.entry(span).or_insert(mention);
        entity
    }

    /// Current entity of a mention
    pub fn entity_of(&self, mention: NodeId) -> Option<EntityId> {
        self.membership.get(&mention).copied()
    }

    /// Mention seeded with exactly this span
    pub fn mention_at(&self, span: Span) -> Option<NodeId> {
        self.by_span.get(&span).copied()
    }

    pub fn same_entity(&self, a: NodeId, b: NodeId) -> bool {
        match (self.entity_of(a), self.entity_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Members of an entity in document order
    pub fn members(&self, entity: EntityId) -> Vec<NodeId> {
        self.slots
            .get(entity.0)
            .map(|slot| slot.members.iter().map(|(_, id)| *id).collect())
            .unwrap_or_default()
    }

    pub fn size(&self, entity: EntityId) -> usize {
        self.slots.get(entity.0).map_or(0, |slot| slot.members.len())
    }

    /// First member in document order
    pub fn first_mention(&self, entity: EntityId) -> Option<NodeId> {
        self.slots
            .get(entity.0)
            .and_then(|slot| slot.members.first())
            .map(|(_, id)| *id)
    }

    /// Merge two entities and return the surviving one
    ///
    /// The entity with the earlier key survives.
    pub fn merge(&mut self, a: EntityId, b: EntityId) -> EntityId {
        if a == b {
            return a;
        }
        let (keep, absorb) = if (self.slots[a.0].key, a) <= (self.slots[b.0].key, b) {
            (a, b)
        } else {
            (b, a)
        };
        let moved = std::mem::take(&mut self.slots[absorb.0].members);
        for (_, mention) in &moved {
            self.membership.insert(*mention, keep);
        }
        let members = &mut self.slots[keep.0].members;
        members.extend(moved);
        members.sort();
        keep
    }

    /// Number of non-empty entities
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.members.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of mentions in the arena
    pub fn mention_count(&self) -> usize {
        self.membership.len()
    }

    /// Complete partition ordered by entity key
    pub fn partition(&self) -> Vec<Vec<NodeId>> {
        let mut live: Vec<(Span, usize)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.members.is_empty())
            .map(|(index, slot)| (slot.key, index))
            .collect();
        live.sort();
        live.into_iter()
            .map(|(_, index)| self.members(EntityId(index)))
            .collect()
    }

    // ========================================================================
    // Aggregate properties
    // ========================================================================

    fn collect<T: Ord + Default>(
        &self,
        graph: &dyn DocumentGraph,
        entity: EntityId,
        value: impl Fn(&Attributes) -> T,
    ) -> BTreeSet<T> {
        self.members(entity)
            .into_iter()
            .map(|m| value(&graph.node(m).attrs))
            .filter(|v| *v != T::default())
            .collect()
    }

    /// Known genders held by any member
    pub fn genders(&self, graph: &dyn DocumentGraph, entity: EntityId) -> BTreeSet<Gender> {
        self.collect(graph, entity, |a| a.gender)
    }

    /// Known numbers held by any member
    pub fn numbers(&self, graph: &dyn DocumentGraph, entity: EntityId) -> BTreeSet<Number> {
        self.collect(graph, entity, |a| a.number)
    }

    /// Known persons held by any member
    pub fn persons(&self, graph: &dyn DocumentGraph, entity: EntityId) -> BTreeSet<Person> {
        self.collect(graph, entity, |a| a.person)
    }

    /// Known animacy values held by any member
    pub fn animacies(&self, graph: &dyn DocumentGraph, entity: EntityId) -> BTreeSet<Animacy> {
        self.collect(graph, entity, |a| a.animacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_and_merge() {
        let mut arena = EntityArena::new();
        let a = arena.seed(NodeId(1), Span::new(0, 0));
        let b = arena.seed(NodeId(2), Span::new(4, 5));
        let c = arena.seed(NodeId(3), Span::new(9, 9));
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.seed(NodeId(1), Span::new(0, 0)), a);

        let kept = arena.merge(c, a);
        assert_eq!(kept, a);
        assert!(arena.same_entity(NodeId(1), NodeId(3)));
        assert!(!arena.same_entity(NodeId(1), NodeId(2)));
        assert_eq!(arena.members(a), vec![NodeId(1), NodeId(3)]);
        assert_eq!(arena.members(c), Vec::<NodeId>::new());
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.mention_count(), 3);
        assert_eq!(
            arena.partition(),
            vec![vec![NodeId(1), NodeId(3)], vec![NodeId(2)]]
        );
        assert_eq!(arena.entity_of(NodeId(2)), Some(b));
        assert_eq!(arena.mention_at(Span::new(4, 5)), Some(NodeId(2)));
        assert_eq!(arena.mention_at(Span::new(4, 4)), None);
    }

    #[test]
    fn test_merge_with_itself() {
        let mut arena = EntityArena::new();
        let a = arena.seed(NodeId(1), Span::new(0, 0));
        assert_eq!(arena.merge(a, a), a);
        assert_eq!(arena.size(a), 1);
    }

    #[test]
    fn test_first_mention_follows_document_order() {
        let mut arena = EntityArena::new();
        let late = arena.seed(NodeId(1), Span::new(7, 7));
        let early = arena.seed(NodeId(2), Span::new(2, 3));
        let kept = arena.merge(late, early);
        assert_eq!(kept, early);
        assert_eq!(arena.first_mention(kept), Some(NodeId(2)));
    }
}
