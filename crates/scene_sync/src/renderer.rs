//! Renderer synchronisation.
//!
//! The [`RendererSyncActor`] is the only path between the scene graph and
//! the renderer. Outbound, it pushes the full state once (followed by a
//! single `InitDone`) and then incremental changes. Inbound, it applies
//! renderer edits to the graph.
//!
//! The renderer may echo back the values it was sent. Every pushed value is
//! remembered in a per-`(entity, kind)` queue; an inbound event carrying a
//! remembered value is an echo (or a stale echo of an older push) and is
//! dropped, so a push never round-trips into a second mutation.
//!
//! Renderer events arrive in order, so an inbound edit that matches no
//! remembered value means the renderer is past every earlier push for that
//! component: its queue is forgotten and the edit wins.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use scene_graph::{Change, ComponentKind, ComponentValue, EntityId, SceneGraph};
use indexmap::IndexSet;
use scene_net::{RendererCommand, RendererEvent, RendererOutbox};
use tracing::{debug, info};

use crate::error::SyncError;

/// Pushed values remembered per component before the oldest is forgotten.
const MAX_PENDING_PER_COMPONENT: usize = 32;

/// Locally removed entities awaiting their echo before the oldest is
/// forgotten.
const MAX_PENDING_ENTITY_REMOVALS: usize = 256;

/// What [`RendererSyncActor::handle_event`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The event mutated the graph with these changes (possibly none).
    Applied(Vec<Change>),
    /// The event echoed a value this actor pushed.
    EchoSuppressed,
    /// The event arrived before the initial push completed.
    Ignored,
}

type PendingKey = (EntityId, ComponentKind);

pub struct RendererSyncActor {
    outbox: Arc<dyn RendererOutbox>,
    pending: HashMap<PendingKey, VecDeque<Option<ComponentValue>>>,
    pending_entity_removals: IndexSet<EntityId>,
    initialized: bool,
}

impl RendererSyncActor {
    #[must_use]
    pub fn new(outbox: Arc<dyn RendererOutbox>) -> Self {
        Self {
            outbox,
            pending: HashMap::new(),
            pending_entity_removals: IndexSet::new(),
            initialized: false,
        }
    }

    /// Whether `InitDone` has been sent.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Push every component of `graph` to the renderer, then `InitDone`.
    ///
    /// Returns the number of components pushed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyInitialized`] on a second call, or a
    /// network error if the renderer link fails (in which case `InitDone`
    /// has not been sent and the push may be retried).
    pub async fn push_initial(&mut self, graph: &SceneGraph) -> Result<usize, SyncError> {
        if self.initialized {
            return Err(SyncError::AlreadyInitialized);
        }
        let snapshot = graph.snapshot();
        let mut pushed = 0;
        for (entity, value) in snapshot.components() {
            self.send_update(entity, value.clone()).await?;
            pushed += 1;
        }
        self.outbox.send(RendererCommand::InitDone).await?;
        self.initialized = true;
        info!(entities = snapshot.entity_count(), components = pushed, "initial state pushed");
        Ok(pushed)
    }

    /// Push already-applied `changes` to the renderer.
    ///
    /// Changes made before the initial push are skipped: the initial push
    /// reads them from the graph.
    ///
    /// # Errors
    ///
    /// Returns a network error if the renderer link fails.
    pub async fn push_changes(&mut self, graph: &SceneGraph, changes: &[Change]) -> Result<(), SyncError> {
        if !self.initialized {
            debug!(count = changes.len(), "renderer not initialised, deferring changes");
            return Ok(());
        }
        let mut removed_entities: Vec<&EntityId> = Vec::new();
        for change in changes {
            match &change.value {
                Some(value) => self.send_update(&change.entity, value.clone()).await?,
                None if graph.contains_entity(&change.entity) => {
                    self.remember(change.entity.clone(), change.kind, None);
                    self.outbox
                        .send(RendererCommand::RemoveComponent {
                            entity: change.entity.clone(),
                            kind: change.kind,
                        })
                        .await?;
                }
                None => {
                    if !removed_entities.contains(&&change.entity) {
                        removed_entities.push(&change.entity);
                    }
                }
            }
        }
        for entity in removed_entities {
            self.pending.retain(|(e, _), _| e != entity);
            self.remember_removal(entity.clone());
            self.outbox
                .send(RendererCommand::RemoveEntity {
                    entity: entity.clone(),
                })
                .await?;
        }
        Ok(())
    }

    /// Apply local `changes` to `graph` and push the effective ones.
    ///
    /// Returns the changes that actually mutated the graph.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Scene`] for an invalid change (earlier changes in
    /// the batch stay applied), or a network error from the push.
    pub async fn apply_local(
        &mut self,
        graph: &mut SceneGraph,
        changes: &[Change],
    ) -> Result<Vec<Change>, SyncError> {
        let mut effective = Vec::with_capacity(changes.len());
        for change in changes {
            if !graph.apply(change)?.is_noop() {
                effective.push(change.clone());
            }
        }
        self.push_changes(graph, &effective).await?;
        Ok(effective)
    }

    /// Apply one renderer-originated event to `graph`.
    ///
    /// Concurrent edits resolve last-writer-wins in arrival order: whichever
    /// mutation reaches the graph last is kept.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Scene`] if the event carries an invalid value;
    /// the graph is left unchanged.
    pub fn handle_event(
        &mut self,
        graph: &mut SceneGraph,
        event: RendererEvent,
    ) -> Result<EventOutcome, SyncError> {
        if !self.initialized {
            debug!(?event, "renderer event before init, ignoring");
            return Ok(EventOutcome::Ignored);
        }
        match event {
            // Entities only exist through their components.
            RendererEvent::EntityCreated { .. } => Ok(EventOutcome::Applied(Vec::new())),
            RendererEvent::EntityRemoved { entity } => {
                if self.pending_entity_removals.shift_remove(&entity) {
                    return Ok(EventOutcome::EchoSuppressed);
                }
                self.pending.retain(|(e, _), _| e != &entity);
                Ok(EventOutcome::Applied(graph.remove_entity(&entity)))
            }
            RendererEvent::ComponentUpdated { entity, value } => {
                self.apply_remote(graph, entity, value.kind(), Some(value))
            }
            RendererEvent::ComponentRemoved { entity, kind } => {
                self.apply_remote(graph, entity, kind, None)
            }
        }
    }

    fn apply_remote(
        &mut self,
        graph: &mut SceneGraph,
        entity: EntityId,
        kind: ComponentKind,
        value: Option<ComponentValue>,
    ) -> Result<EventOutcome, SyncError> {
        if self.take_echo(&entity, kind, value.as_ref()) {
            debug!(%entity, %kind, "echo suppressed");
            return Ok(EventOutcome::EchoSuppressed);
        }
        let outcome = graph.apply_change(&entity, kind, value.clone())?;
        self.pending.remove(&(entity.clone(), kind));
        if value.is_some() {
            self.pending_entity_removals.shift_remove(&entity);
        }
        if outcome.is_noop() {
            return Ok(EventOutcome::Applied(Vec::new()));
        }
        debug!(%entity, %kind, ?outcome, "renderer change applied");
        Ok(EventOutcome::Applied(vec![Change { entity, kind, value }]))
    }

    async fn send_update(&mut self, entity: &EntityId, value: ComponentValue) -> Result<(), SyncError> {
        self.pending_entity_removals.shift_remove(entity);
        self.remember(entity.clone(), value.kind(), Some(value.clone()));
        self.outbox
            .send(RendererCommand::UpdateComponent {
                entity: entity.clone(),
                value,
            })
            .await?;
        Ok(())
    }

    fn remember(&mut self, entity: EntityId, kind: ComponentKind, value: Option<ComponentValue>) {
        let queue = self.pending.entry((entity, kind)).or_default();
        if queue.len() == MAX_PENDING_PER_COMPONENT {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    fn remember_removal(&mut self, entity: EntityId) {
        if self.pending_entity_removals.len() == MAX_PENDING_ENTITY_REMOVALS {
            self.pending_entity_removals.shift_remove_index(0);
        }
        self.pending_entity_removals.insert(entity);
    }

    /// If `value` was pushed for this component, forget it and every older
    /// push, and report an echo.
    fn take_echo(&mut self, entity: &EntityId, kind: ComponentKind, value: Option<&ComponentValue>) -> bool {
        let key = (entity.clone(), kind);
        let Some(queue) = self.pending.get_mut(&key) else {
            return false;
        };
        let Some(position) = queue.iter().position(|pushed| pushed.as_ref() == value) else {
            return false;
        };
        queue.drain(..=position);
        if queue.is_empty() {
            self.pending.remove(&key);
        }
        true
    }
}
