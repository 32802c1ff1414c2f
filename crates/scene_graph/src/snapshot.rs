//! Immutable scene exports and change records.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentKind, ComponentValue};
use crate::entity::EntityId;

/// One entity of a [`SceneSnapshot`] with its components in attachment order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub components: Vec<ComponentValue>,
}

impl EntitySnapshot {
    #[must_use]
    pub fn component(&self, kind: ComponentKind) -> Option<&ComponentValue> {
        self.components.iter().find(|c| c.kind() == kind)
    }
}

/// An immutable, order-preserving enumeration of every
/// `(entity, component)` pair of a scene graph.
///
/// Snapshots are only produced by [`SceneGraph::snapshot`](crate::SceneGraph::snapshot),
/// so they always satisfy the graph invariants: no empty entities, no
/// duplicate entity ids and at most one component per kind per entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    entities: Vec<EntitySnapshot>,
}

impl SceneSnapshot {
    pub(crate) fn from_entities(entities: Vec<EntitySnapshot>) -> Self {
        Self { entities }
    }

    #[must_use]
    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| &e.id == id)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate every `(entity, component)` pair in snapshot order.
    pub fn components(&self) -> impl Iterator<Item = (&EntityId, &ComponentValue)> {
        self.entities
            .iter()
            .flat_map(|e| e.components.iter().map(move |c| (&e.id, c)))
    }

    /// Every referenced asset id, deduplicated, in first-seen order.
    #[must_use]
    pub fn asset_ids(&self) -> Vec<String> {
        self.collect_assets(|_| true)
    }

    /// Asset ids referenced by shape components only, deduplicated.
    #[must_use]
    pub fn shape_asset_ids(&self) -> Vec<String> {
        self.collect_assets(|c| c.kind().is_shape())
    }

    fn collect_assets(&self, filter: impl Fn(&ComponentValue) -> bool) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (_, component) in self.components() {
            if !filter(component) {
                continue;
            }
            if let Some(id) = component.asset_id()
                && !ids.iter().any(|known| known == id)
            {
                ids.push(id.to_string());
            }
        }
        ids
    }

    /// A copy with entities sorted by id and components sorted by kind.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut entities = self.entities.clone();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        for entity in &mut entities {
            entity.components.sort_by_key(ComponentValue::kind);
        }
        Self { entities }
    }

    /// Structural equality modulo entity and component ordering.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

/// A single mutation: set (`Some`) or remove (`None`) one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub entity: EntityId,
    pub kind: ComponentKind,
    pub value: Option<ComponentValue>,
}

impl Change {
    #[must_use]
    pub fn set(entity: impl Into<EntityId>, value: ComponentValue) -> Self {
        Self {
            entity: entity.into(),
            kind: value.kind(),
            value: Some(value),
        }
    }

    #[must_use]
    pub fn remove(entity: impl Into<EntityId>, kind: ComponentKind) -> Self {
        Self {
            entity: entity.into(),
            kind,
            value: None,
        }
    }
}
