//! The canonical scene store.
//!
//! [`SceneGraph`] is owned by exactly one task for the lifetime of a scene
//! session. Every mutation, whether it comes from the editor, the renderer
//! or a save request, goes through [`SceneGraph::apply_change`], which
//! either applies completely or leaves the graph untouched.

use indexmap::IndexMap;
use serde_json::Value;

use crate::component::{ComponentKind, ComponentValue};
use crate::entity::EntityId;
use crate::error::SceneError;
use crate::snapshot::{Change, EntitySnapshot, SceneSnapshot};

/// What a successful mutation did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// A component was attached (creating the entity if needed).
    Inserted,
    /// An existing component was replaced by a different value.
    Replaced,
    /// A component was detached (removing the entity if it was the last one).
    Removed,
    /// The graph already held this exact state.
    Unchanged,
}

impl ChangeOutcome {
    #[must_use]
    pub fn is_noop(self) -> bool {
        self == Self::Unchanged
    }
}

type Components = IndexMap<ComponentKind, ComponentValue>;

/// Entity/component storage with insertion-ordered entities and components.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    entities: IndexMap<EntityId, Components>,
}

impl SceneGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Self {
        let entities = snapshot
            .entities()
            .iter()
            .map(|e| {
                let components = e.components.iter().map(|c| (c.kind(), c.clone())).collect();
                (e.id.clone(), components)
            })
            .collect();
        Self { entities }
    }

    // -- Mutation --

    /// Set (`Some`) or remove (`None`) the `kind` component of `entity`.
    ///
    /// Setting a component on an unknown entity creates it; removing the last
    /// component of an entity removes the entity. Applying the value already
    /// stored is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedMutation`] for an invalid entity id, a
    /// value whose kind differs from `kind`, or a payload failing validation.
    pub fn apply_change(
        &mut self,
        entity: &EntityId,
        kind: ComponentKind,
        value: Option<ComponentValue>,
    ) -> Result<ChangeOutcome, SceneError> {
        if !entity.is_valid() {
            return Err(SceneError::malformed(entity, "empty entity id"));
        }

        let Some(value) = value else {
            return Ok(self.remove_component(entity, kind));
        };

        if value.kind() != kind {
            return Err(SceneError::malformed(
                entity,
                format!("{} payload supplied for {kind} component", value.kind()),
            ));
        }
        value
            .validate()
            .map_err(|reason| SceneError::malformed(entity, reason))?;

        let components = self.entities.entry(entity.clone()).or_default();
        match components.get_mut(&kind) {
            Some(existing) if *existing == value => Ok(ChangeOutcome::Unchanged),
            Some(existing) => {
                *existing = value;
                Ok(ChangeOutcome::Replaced)
            }
            None => {
                components.insert(kind, value);
                Ok(ChangeOutcome::Inserted)
            }
        }
    }

    /// Apply a [`Change`] record.
    ///
    /// # Errors
    ///
    /// See [`SceneGraph::apply_change`].
    pub fn apply(&mut self, change: &Change) -> Result<ChangeOutcome, SceneError> {
        self.apply_change(&change.entity, change.kind, change.value.clone())
    }

    /// Decode and apply an untyped mutation: a numeric type code and a JSON
    /// payload (`None` removes the component).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedMutation`] for unknown type codes and
    /// payloads that do not decode; the graph is left unchanged.
    pub fn apply_raw(
        &mut self,
        entity: &EntityId,
        type_code: u32,
        value: Option<Value>,
    ) -> Result<ChangeOutcome, SceneError> {
        let kind =
            ComponentKind::from_code(type_code).map_err(|e| SceneError::malformed(entity, e))?;
        let value = value
            .map(|v| ComponentValue::from_json(kind, v))
            .transpose()
            .map_err(|e| SceneError::malformed(entity, e))?;
        self.apply_change(entity, kind, value)
    }

    fn remove_component(&mut self, entity: &EntityId, kind: ComponentKind) -> ChangeOutcome {
        let Some(components) = self.entities.get_mut(entity) else {
            return ChangeOutcome::Unchanged;
        };
        if components.shift_remove(&kind).is_none() {
            return ChangeOutcome::Unchanged;
        }
        if components.is_empty() {
            self.entities.shift_remove(entity);
        }
        ChangeOutcome::Removed
    }

    /// Delete an entity and all of its components.
    ///
    /// Returns the removal changes that were applied, one per component, so
    /// callers can mirror the deletion elsewhere.
    pub fn remove_entity(&mut self, entity: &EntityId) -> Vec<Change> {
        self.entities
            .shift_remove(entity)
            .map(|components| {
                components
                    .into_keys()
                    .map(|kind| Change::remove(entity.clone(), kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remove every entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    // -- Reads --

    #[must_use]
    pub fn get(&self, entity: &EntityId, kind: ComponentKind) -> Option<&ComponentValue> {
        self.entities.get(entity).and_then(|c| c.get(&kind))
    }

    #[must_use]
    pub fn contains_entity(&self, entity: &EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.entities.values().map(IndexMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Export the whole graph, preserving entity and component order.
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot {
        let entities = self
            .entities
            .iter()
            .map(|(id, components)| EntitySnapshot {
                id: id.clone(),
                components: components.values().cloned().collect(),
            })
            .collect();
        SceneSnapshot::from_entities(entities)
    }

    // -- Diffing --

    /// The changes that turn this graph into `target`.
    ///
    /// Sets come first, in target order; removals of components and entities
    /// absent from `target` follow, in graph order.
    #[must_use]
    pub fn diff(&self, target: &SceneSnapshot) -> Vec<Change> {
        let mut changes = Vec::new();

        for entity in target.entities() {
            for value in &entity.components {
                if self.get(&entity.id, value.kind()) != Some(value) {
                    changes.push(Change::set(entity.id.clone(), value.clone()));
                }
            }
        }

        for (id, components) in &self.entities {
            let wanted = target.entity(id);
            for kind in components.keys() {
                if wanted.and_then(|e| e.component(*kind)).is_none() {
                    changes.push(Change::remove(id.clone(), *kind));
                }
            }
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use scene_math::{Transform3D, Vec3};
    use serde_json::json;

    use super::*;
    use crate::component::Name;

    fn e(id: &str) -> EntityId {
        EntityId::new(id)
    }

    fn transform(x: f32) -> ComponentValue {
        ComponentValue::Transform(Transform3D::from_position(Vec3::new(x, 0.0, 0.0)))
    }

    fn name(value: &str) -> ComponentValue {
        ComponentValue::Name(Name {
            value: value.to_string(),
        })
    }

    #[test]
    fn test_insert_creates_entity() {
        let mut graph = SceneGraph::new();
        let outcome = graph
            .apply_change(&e("E1"), ComponentKind::Transform, Some(transform(0.0)))
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Inserted);
        assert!(graph.contains_entity(&e("E1")));
        assert_eq!(graph.component_count(), 1);
    }

    #[test]
    fn test_replace_is_last_write_wins() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        let outcome = graph.apply(&Change::set("E1", transform(2.0))).unwrap();
        assert_eq!(outcome, ChangeOutcome::Replaced);
        assert_eq!(graph.get(&e("E1"), ComponentKind::Transform), Some(&transform(2.0)));
        assert_eq!(graph.component_count(), 1);
    }

    #[test]
    fn test_idempotent_mutation() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        let before = graph.snapshot();
        let outcome = graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        assert!(outcome.is_noop());
        assert_eq!(graph.snapshot(), before);
    }

    #[test]
    fn test_removing_last_component_removes_entity() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        graph.apply(&Change::set("E1", name("door"))).unwrap();
        graph
            .apply(&Change::remove("E1", ComponentKind::Transform))
            .unwrap();
        assert!(graph.contains_entity(&e("E1")));
        let outcome = graph.apply(&Change::remove("E1", ComponentKind::Name)).unwrap();
        assert_eq!(outcome, ChangeOutcome::Removed);
        assert!(!graph.contains_entity(&e("E1")));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut graph = SceneGraph::new();
        let outcome = graph.apply(&Change::remove("E9", ComponentKind::Name)).unwrap();
        assert!(outcome.is_noop());
    }

    #[test]
    fn test_kind_mismatch_is_rejected_atomically() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        let before = graph.snapshot();
        let err = graph
            .apply_change(&e("E1"), ComponentKind::Transform, Some(name("x")))
            .unwrap_err();
        assert!(matches!(err, SceneError::MalformedMutation { .. }));
        assert_eq!(graph.snapshot(), before);
    }

    #[test]
    fn test_empty_entity_id_rejected() {
        let mut graph = SceneGraph::new();
        assert!(graph.apply(&Change::set("", transform(0.0))).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_apply_raw_unknown_type() {
        let mut graph = SceneGraph::new();
        let err = graph
            .apply_raw(&e("E1"), 4242, Some(json!({})))
            .unwrap_err();
        assert!(matches!(err, SceneError::MalformedMutation { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_apply_raw_malformed_payload() {
        let mut graph = SceneGraph::new();
        let code = ComponentKind::GltfShape.code();
        assert!(graph.apply_raw(&e("E1"), code, Some(json!({ "src": 3 }))).is_err());
        assert!(graph.is_empty());
        graph
            .apply_raw(&e("E1"), code, Some(json!({ "assetId": "abc" })))
            .unwrap();
        assert_eq!(
            graph.get(&e("E1"), ComponentKind::GltfShape),
            Some(&ComponentValue::gltf("abc"))
        );
        graph.apply_raw(&e("E1"), code, None).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("B", name("b"))).unwrap();
        graph.apply(&Change::set("A", name("a"))).unwrap();
        graph.apply(&Change::set("B", transform(1.0))).unwrap();
        let snapshot = graph.snapshot();
        let ids: Vec<_> = snapshot.entities().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["B", "A"]);
        let kinds: Vec<_> = snapshot.entities()[0]
            .components
            .iter()
            .map(ComponentValue::kind)
            .collect();
        assert_eq!(kinds, [ComponentKind::Name, ComponentKind::Transform]);
    }

    #[test]
    fn test_remove_entity_reports_changes() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        graph.apply(&Change::set("E1", name("x"))).unwrap();
        let removed = graph.remove_entity(&e("E1"));
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|c| c.value.is_none()));
        assert!(graph.is_empty());
        assert!(graph.remove_entity(&e("E1")).is_empty());
    }

    #[test]
    fn test_diff_reaches_target() {
        let mut current = SceneGraph::new();
        current.apply(&Change::set("E1", transform(1.0))).unwrap();
        current.apply(&Change::set("E1", name("keep"))).unwrap();
        current.apply(&Change::set("E2", name("gone"))).unwrap();

        let mut wanted = SceneGraph::new();
        wanted.apply(&Change::set("E1", transform(5.0))).unwrap();
        wanted.apply(&Change::set("E1", name("keep"))).unwrap();
        wanted.apply(&Change::set("E3", ComponentValue::gltf("abc"))).unwrap();
        let target = wanted.snapshot();

        let changes = current.diff(&target);
        // E1 transform replaced, E3 inserted, E2 removed; E1 name untouched.
        assert_eq!(changes.len(), 3);
        for change in &changes {
            current.apply(change).unwrap();
        }
        assert!(current.snapshot().equivalent(&target));
        assert!(current.diff(&target).is_empty());
    }

    #[test]
    fn test_from_snapshot_roundtrip() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", transform(1.0))).unwrap();
        graph.apply(&Change::set("E2", ComponentValue::gltf("abc"))).unwrap();
        let snapshot = graph.snapshot();
        assert_eq!(SceneGraph::from_snapshot(&snapshot).snapshot(), snapshot);
    }

    #[test]
    fn test_asset_ids_deduplicated() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", ComponentValue::gltf("abc"))).unwrap();
        graph.apply(&Change::set("E2", ComponentValue::gltf("abc"))).unwrap();
        graph
            .apply(&Change::set(
                "E3",
                ComponentValue::Script(crate::component::Script {
                    asset_id: "door".to_string(),
                    values: json!({}),
                }),
            ))
            .unwrap();
        let snapshot = graph.snapshot();
        assert_eq!(snapshot.asset_ids(), ["abc", "door"]);
        assert_eq!(snapshot.shape_asset_ids(), ["abc"]);
    }
}
