//! The scene session orchestrator.
//!
//! [`SceneKernel`] owns the [`SceneGraph`] and wires it to the sync actors
//! and the publish pipeline. Every public operation is total: failures are
//! logged and reported as `None`, `false` or a failed [`OperationResult`].

use std::sync::Arc;

use scene_format::{Manifest, SerializedSceneState};
use scene_graph::{SceneGraph, SceneSnapshot};
use scene_math::{CoordinateFrame, Parcel};
use scene_net::{OperationResult, RendererCommand, RendererEvent, RendererOutbox};
use scene_publish::{ContentStore, Placement, PublishPipeline, PublishRequest, PublishStage, stored};
use scene_sync::{
    EditorBackend, EditorSyncActor, EventOutcome, Identity, IdentityProvider, ProjectLocator,
    RendererSyncActor, RetryPolicy, SyncError,
};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::KernelError;

/// Per-session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub scene_id: String,
    pub placement: Placement,
    pub retry: RetryPolicy,
    pub download_concurrency: usize,
}

impl SessionSettings {
    #[must_use]
    pub fn new(scene_id: impl Into<String>, placement: Placement) -> Self {
        Self {
            scene_id: scene_id.into(),
            placement,
            retry: RetryPolicy::default(),
            download_concurrency: scene_publish::pipeline::DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }

    /// Frame implied by the session's own placement.
    #[must_use]
    pub fn frame(&self) -> CoordinateFrame {
        CoordinateFrame::for_placement(self.placement.base, self.placement.rotation)
    }
}

/// The external services a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn EditorBackend>,
    pub store: Arc<dyn ContentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub renderer: Arc<dyn RendererOutbox>,
}

/// Title, description and thumbnail written alongside a save.
struct ProjectInfo {
    title: String,
    description: String,
    thumbnail: Option<Vec<u8>>,
}

pub struct SceneKernel {
    settings: SessionSettings,
    graph: SceneGraph,
    renderer: RendererSyncActor,
    editor: EditorSyncActor,
    publisher: PublishPipeline,
    outbox: Arc<dyn RendererOutbox>,
    store: Arc<dyn ContentStore>,
    identity: Arc<dyn IdentityProvider>,
    /// The editor project this session saves into, once known.
    project: Option<Manifest>,
}

impl SceneKernel {
    #[must_use]
    pub fn new(settings: SessionSettings, collaborators: Collaborators) -> Self {
        let Collaborators {
            backend,
            store,
            identity,
            renderer,
        } = collaborators;
        let publisher = PublishPipeline::new(store.clone(), backend.clone(), identity.clone())
            .with_retry(settings.retry)
            .with_download_concurrency(settings.download_concurrency);
        Self {
            graph: SceneGraph::new(),
            renderer: RendererSyncActor::new(renderer.clone()),
            editor: EditorSyncActor::new(backend, settings.retry),
            publisher,
            outbox: renderer,
            store,
            identity,
            project: None,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[must_use]
    pub fn project(&self) -> Option<&Manifest> {
        self.project.as_ref()
    }

    #[must_use]
    pub fn publish_stage(&self) -> PublishStage {
        self.publisher.stage()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.renderer.is_initialized()
    }

    // -- Session lifecycle --

    /// Load the initial state and initialise the renderer.
    ///
    /// `is_empty` is the host's answer to whether this scene instance is
    /// empty; an empty scene skips the editor backend. A project that does
    /// not exist also yields an empty scene.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Bootstrap`] if the editor backend is
    /// unreachable or returns a malformed project, or a network error if
    /// the renderer link fails.
    pub async fn bootstrap(&mut self, is_empty: bool, project_id: Option<&str>) -> Result<(), KernelError> {
        if is_empty {
            info!(scene = self.settings.scene_id, "empty scene, skipping editor backend");
        } else {
            let locator = match project_id {
                Some(id) => ProjectLocator::ProjectId(id.to_string()),
                None => ProjectLocator::Coordinates(self.settings.placement.base),
            };
            let identity = self.identity.current_identity().await;
            match self
                .editor
                .fetch_initial_state(&locator, identity.as_ref(), &self.settings.frame())
                .await
            {
                Ok((manifest, snapshot)) => {
                    self.graph = SceneGraph::from_snapshot(&snapshot);
                    self.project = Some(manifest);
                }
                Err(SyncError::NotFound(what)) => {
                    warn!(what, "nothing to load, starting with an empty scene");
                }
                Err(e) => return Err(KernelError::Bootstrap(e)),
            }
        }

        self.renderer.push_initial(&self.graph).await?;
        if !self.graph.is_empty()
            && let Err(e) = self
                .editor
                .resolve_and_send_assets(&self.graph.snapshot(), self.outbox.as_ref())
                .await
        {
            warn!(error = %e, "initial asset delivery failed");
        }
        info!(
            scene = self.settings.scene_id,
            entities = self.graph.entity_count(),
            "scene session ready"
        );
        Ok(())
    }

    /// Apply one renderer-originated event.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Sync`] if the event carries an invalid value.
    pub fn handle_renderer_event(&mut self, event: RendererEvent) -> Result<EventOutcome, KernelError> {
        Ok(self.renderer.handle_event(&mut self.graph, event)?)
    }

    // -- Public operations --

    /// Load a project by id and return its scene in wire format.
    pub async fn get_project_manifest(&mut self, project_id: &str) -> Option<SerializedSceneState> {
        let locator = ProjectLocator::ProjectId(project_id.to_string());
        self.load_project(locator)
            .await
            .inspect_err(|e| warn!(project_id, error = %e, "getProjectManifest failed"))
            .ok()
    }

    /// Load the project created at `coords` and return its scene in wire
    /// format.
    pub async fn get_project_manifest_by_coordinates(&mut self, coords: Parcel) -> Option<SerializedSceneState> {
        self.load_project(ProjectLocator::Coordinates(coords))
            .await
            .inspect_err(|e| warn!(%coords, error = %e, "getProjectManifestByCoordinates failed"))
            .ok()
    }

    /// Create a new editor project at `coords` holding the current scene.
    pub async fn create_project_with_coords(&mut self, coords: Parcel) -> bool {
        let result = async {
            let identity = self.require_identity().await?;
            let snapshot = self.graph.snapshot();
            self.create_project(&identity, coords, &snapshot, None).await
        }
        .await;
        result
            .inspect_err(|e| warn!(%coords, error = %e, "createProjectWithCoords failed"))
            .is_ok()
    }

    /// Make `state` the current scene: apply the difference to the graph,
    /// push it to the renderer, and save it to the editor project.
    pub async fn save_scene_state(&mut self, state: &SerializedSceneState) -> OperationResult {
        match self.save(state, None).await {
            Ok(()) => OperationResult::success(),
            Err(e) => {
                warn!(error = %e, "saveSceneState failed");
                OperationResult::failure(e.to_string())
            }
        }
    }

    /// As [`save_scene_state`](Self::save_scene_state), also updating the
    /// project's title, description and thumbnail.
    pub async fn save_project_info(
        &mut self,
        state: &SerializedSceneState,
        title: &str,
        description: &str,
        thumbnail: Option<Vec<u8>>,
    ) -> bool {
        let info = ProjectInfo {
            title: title.to_string(),
            description: description.to_string(),
            thumbnail,
        };
        self.save(state, Some(info))
            .await
            .inspect_err(|e| warn!(error = %e, "saveProjectInfo failed"))
            .is_ok()
    }

    /// Publish `state` and notify the renderer of the outcome.
    pub async fn publish_scene_state(
        &mut self,
        scene_id: &str,
        title: &str,
        description: &str,
        thumbnail: Option<Vec<u8>>,
        state: &SerializedSceneState,
    ) -> OperationResult {
        if scene_id != self.settings.scene_id {
            warn!(requested = scene_id, session = self.settings.scene_id, "publishing another scene id");
        }
        let result = match state.to_snapshot() {
            Ok(snapshot) => {
                let request = PublishRequest {
                    title: title.to_string(),
                    description: description.to_string(),
                    thumbnail,
                    snapshot,
                    placement: self.settings.placement.clone(),
                    project: self.project.clone(),
                };
                self.publisher.publish(request).await
            }
            Err(e) => OperationResult::failure(format!("malformed scene state: {e}")),
        };

        if result.ok
            && let Some(manifest) = self.project.as_mut()
        {
            manifest.project.title = title.to_string();
            manifest.project.description = description.to_string();
        }
        if let Err(e) = self
            .outbox
            .send(RendererCommand::PublishResult(result.clone()))
            .await
        {
            warn!(error = %e, "failed to notify the renderer of the publish result");
        }
        result
    }

    /// The scene deployed as entity `scene_id`, or else the current
    /// project's saved scene.
    pub async fn get_stored_state(&mut self, scene_id: &str) -> Option<SerializedSceneState> {
        self.stored_state(scene_id)
            .await
            .inspect_err(|e| warn!(scene_id, error = %e, "getStoredState failed"))
            .ok()
            .flatten()
    }

    /// Turn the deployment active at the base parcel into a new editor
    /// project and make it the current scene.
    pub async fn create_project_from_state_definition(&mut self) -> Option<SerializedSceneState> {
        self.project_from_deployment()
            .await
            .inspect_err(|e| warn!(error = %e, "createProjectFromStateDefinition failed"))
            .ok()
            .flatten()
    }

    /// Resolve the assets referenced by `state` and deliver them to the
    /// renderer.
    pub async fn send_assets_to_renderer(&mut self, state: &SerializedSceneState) -> bool {
        let result = async {
            let snapshot = state.to_snapshot()?;
            let sent = self
                .editor
                .resolve_and_send_assets(&snapshot, self.outbox.as_ref())
                .await?;
            debug!(assets = sent, "assets sent to renderer");
            Ok::<_, KernelError>(())
        }
        .await;
        result
            .inspect_err(|e| warn!(error = %e, "sendAssetsToRenderer failed"))
            .is_ok()
    }

    // -- Internals --

    /// The frame of the current project, or of the session placement.
    fn frame(&self) -> CoordinateFrame {
        self.project
            .as_ref()
            .and_then(Manifest::frame)
            .unwrap_or_else(|| self.settings.frame())
    }

    async fn require_identity(&self) -> Result<Identity, KernelError> {
        self.identity
            .current_identity()
            .await
            .ok_or(KernelError::IdentityUnavailable)
    }

    async fn load_project(&mut self, locator: ProjectLocator) -> Result<SerializedSceneState, KernelError> {
        let identity = self.identity.current_identity().await;
        let (manifest, snapshot) = self
            .editor
            .fetch_initial_state(&locator, identity.as_ref(), &self.settings.frame())
            .await?;
        self.project = Some(manifest);
        Ok(SerializedSceneState::from_snapshot(&snapshot)?)
    }

    async fn create_project(
        &mut self,
        identity: &Identity,
        coords: Parcel,
        snapshot: &SceneSnapshot,
        title: Option<String>,
    ) -> Result<(), KernelError> {
        let mut manifest = Manifest::new_project(Uuid::new_v4().to_string(), &self.settings.scene_id, coords);
        manifest.project.rotation = self.settings.placement.rotation;
        if let Some(title) = title {
            manifest.project.title = title;
        }
        let frame = CoordinateFrame::for_placement(coords, manifest.project.rotation);
        manifest.set_scene(snapshot, &frame)?;
        self.editor.backend().create_project(&manifest, identity).await?;
        info!(project = manifest.project.id, %coords, "project created");
        self.project = Some(manifest);
        Ok(())
    }

    async fn save(&mut self, state: &SerializedSceneState, info: Option<ProjectInfo>) -> Result<(), KernelError> {
        let identity = self.require_identity().await?;
        let snapshot = state.to_snapshot()?;
        let changes = self.graph.diff(&snapshot);
        let applied = self.renderer.apply_local(&mut self.graph, &changes).await?;
        debug!(changes = applied.len(), "scene state applied");
        self.persist(&identity, info).await
    }

    /// Write the graph (and optional project info) to the editor project,
    /// creating the project at the base parcel if there is none yet.
    async fn persist(&mut self, identity: &Identity, info: Option<ProjectInfo>) -> Result<(), KernelError> {
        let snapshot = self.graph.snapshot();
        if self.project.is_none() {
            self.create_project(identity, self.settings.placement.base, &snapshot, None)
                .await?;
        }
        let frame = self.frame();
        let Some(manifest) = self.project.as_mut() else {
            return Ok(());
        };
        manifest.set_scene(&snapshot, &frame)?;
        let mut thumbnail = None;
        if let Some(info) = info {
            manifest.project.title = info.title;
            manifest.project.description = info.description;
            thumbnail = info.thumbnail;
        }

        let backend = self.editor.backend();
        backend.update_manifest(manifest, identity).await?;
        if let Some(image) = thumbnail {
            backend
                .update_thumbnail(&manifest.project.id, &image, identity)
                .await?;
        }
        Ok(())
    }

    async fn stored_state(&mut self, scene_id: &str) -> Result<Option<SerializedSceneState>, KernelError> {
        let retry = self.settings.retry;
        match stored::fetch_scene_entity(self.store.as_ref(), &retry, scene_id).await {
            Ok(Some(entity)) => {
                if let Some(snapshot) = stored::read_state_definition(self.store.as_ref(), &retry, &entity).await? {
                    return Ok(Some(SerializedSceneState::from_snapshot(&snapshot)?));
                }
            }
            Ok(None) => debug!(scene_id, "no deployment with this id"),
            Err(e) => warn!(scene_id, error = %e, "content store unavailable, using the editor project"),
        }

        let Some(project_id) = self.project.as_ref().map(|m| m.project.id.clone()) else {
            debug!(scene_id, "no current project to read from");
            return Ok(None);
        };
        Ok(Some(self.load_project(ProjectLocator::ProjectId(project_id)).await?))
    }

    async fn project_from_deployment(&mut self) -> Result<Option<SerializedSceneState>, KernelError> {
        let identity = self.require_identity().await?;
        let base = self.settings.placement.base;
        let retry = self.settings.retry;

        let Some(entity) = stored::fetch_active_scene(self.store.as_ref(), &retry, base).await? else {
            info!(%base, "no deployment at the base parcel");
            return Ok(None);
        };
        let Some(snapshot) = stored::read_state_definition(self.store.as_ref(), &retry, &entity).await? else {
            return Ok(None);
        };

        let changes = self.graph.diff(&snapshot);
        self.renderer.apply_local(&mut self.graph, &changes).await?;

        let title = entity
            .metadata
            .pointer("/display/title")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.create_project(&identity, base, &snapshot, title).await?;
        Ok(Some(SerializedSceneState::from_snapshot(&snapshot)?))
    }
}
