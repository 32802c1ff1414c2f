//! Editor backend synchronisation: initial state and asset resolution.

use std::sync::Arc;

use scene_format::{AssetDescriptor, Manifest};
use scene_graph::SceneSnapshot;
use scene_math::CoordinateFrame;
use scene_net::{RendererCommand, RendererOutbox};
use tracing::{info, warn};

use crate::backend::{EditorBackend, ProjectLocator};
use crate::error::SyncError;
use crate::identity::Identity;
use crate::retry::RetryPolicy;

/// Reads project state from the editor backend and turns it into scene
/// content. Reads are retried under the actor's [`RetryPolicy`].
pub struct EditorSyncActor {
    backend: Arc<dyn EditorBackend>,
    retry: RetryPolicy,
}

impl EditorSyncActor {
    #[must_use]
    pub fn new(backend: Arc<dyn EditorBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn EditorBackend> {
        &self.backend
    }

    /// Fetch a project manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if the backend has no such project, or
    /// [`SyncError::BackendUnavailable`] once the retry budget is spent.
    pub async fn fetch_manifest(
        &self,
        locator: &ProjectLocator,
        identity: Option<&Identity>,
    ) -> Result<Manifest, SyncError> {
        let fetched = self
            .retry
            .run("fetch_manifest", || self.backend.fetch_manifest(locator, identity))
            .await?;
        fetched.ok_or_else(|| SyncError::NotFound(locator.to_string()))
    }

    /// Fetch a project and decode its scene.
    ///
    /// The project's own placement defines the coordinate frame; `fallback`
    /// is used for projects created without coordinates. Components with
    /// unknown descriptors are dropped with a warning.
    ///
    /// # Errors
    ///
    /// As [`fetch_manifest`](Self::fetch_manifest), plus
    /// [`SyncError::Format`] if a known component is malformed.
    pub async fn fetch_initial_state(
        &self,
        locator: &ProjectLocator,
        identity: Option<&Identity>,
        fallback: &CoordinateFrame,
    ) -> Result<(Manifest, SceneSnapshot), SyncError> {
        let manifest = self.fetch_manifest(locator, identity).await?;
        let frame = manifest.frame().unwrap_or(*fallback);
        let import = manifest.to_snapshot(&frame)?;
        if !import.dropped.is_empty() {
            warn!(
                project = manifest.project.id,
                dropped = ?import.dropped,
                "manifest components without a scene kind were dropped"
            );
        }
        info!(
            project = manifest.project.id,
            entities = import.snapshot.entity_count(),
            "initial state fetched"
        );
        Ok((manifest, import.snapshot))
    }

    /// Resolve the descriptors of every asset referenced by a shape in
    /// `snapshot`, with one bulk metadata request.
    ///
    /// Ids the catalogue does not know are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::BackendUnavailable`] if the bulk request keeps
    /// failing.
    pub async fn resolve_assets(&self, snapshot: &SceneSnapshot) -> Result<Vec<AssetDescriptor>, SyncError> {
        let ids = snapshot.shape_asset_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut descriptors = self
            .retry
            .run("asset_metadata", || self.backend.asset_metadata(&ids))
            .await?;
        descriptors.retain(|d| ids.contains(&d.id));
        for id in &ids {
            if !descriptors.iter().any(|d| &d.id == id) {
                let err = SyncError::AssetResolution {
                    asset_id: id.clone(),
                    reason: "not in the asset catalogue".to_string(),
                };
                warn!(error = %err, "skipping asset");
            }
        }
        Ok(descriptors)
    }

    /// Resolve the scene's assets and deliver them to the renderer as one
    /// `SendAssets` message. Returns how many descriptors were sent.
    ///
    /// # Errors
    ///
    /// As [`resolve_assets`](Self::resolve_assets), plus network errors from
    /// the renderer link.
    pub async fn resolve_and_send_assets(
        &self,
        snapshot: &SceneSnapshot,
        outbox: &dyn RendererOutbox,
    ) -> Result<usize, SyncError> {
        let assets = self.resolve_assets(snapshot).await?;
        let count = assets.len();
        outbox.send(RendererCommand::SendAssets { assets }).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use scene_graph::{Change, ComponentValue, Name, SceneGraph};
    use scene_math::{LandRotation, Parcel, Transform3D, Vec3};
    use scene_net::ChannelOutbox;

    use super::*;
    use crate::memory::MemoryEditorBackend;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    fn asset(id: &str) -> AssetDescriptor {
        AssetDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            model: format!("{id}.glb"),
            category: String::new(),
            contents: BTreeMap::from([(format!("{id}.glb"), format!("hash-{id}"))]),
            script: None,
        }
    }

    fn scene() -> SceneSnapshot {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", ComponentValue::gltf("A"))).unwrap();
        graph.apply(&Change::set("E2", ComponentValue::gltf("A"))).unwrap();
        graph.apply(&Change::set("E3", ComponentValue::gltf("B"))).unwrap();
        graph
            .apply(&Change::set(
                "E3",
                ComponentValue::Name(Name {
                    value: "tree".to_string(),
                }),
            ))
            .unwrap();
        graph.snapshot()
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let backend = Arc::new(MemoryEditorBackend::new());
        let actor = EditorSyncActor::new(backend, fast_retry());
        let err = actor
            .fetch_manifest(&ProjectLocator::ProjectId("nope".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unavailable_backend_retries_then_fails() {
        let backend = Arc::new(MemoryEditorBackend::new());
        backend.set_unavailable(true);
        let actor = EditorSyncActor::new(backend.clone(), fast_retry());
        let err = actor
            .fetch_manifest(&ProjectLocator::ProjectId("p1".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::BackendUnavailable(_)));
        assert_eq!(backend.fetch_calls(), 3);
    }

    #[tokio::test]
    async fn test_initial_state_uses_project_frame() {
        let backend = Arc::new(MemoryEditorBackend::new());
        let mut graph = SceneGraph::new();
        let local = Transform3D::from_position(Vec3::new(1.0, 0.0, 2.0));
        graph
            .apply(&Change::set("E1", ComponentValue::Transform(local)))
            .unwrap();

        let coords = Parcel::new(2, -1);
        let mut manifest = Manifest::new_project("p1", "s1", coords);
        let frame = CoordinateFrame::for_placement(coords, LandRotation::North);
        manifest.set_scene(&graph.snapshot(), &frame).unwrap();
        backend.insert_manifest(manifest);

        let actor = EditorSyncActor::new(backend, fast_retry());
        let (_, snapshot) = actor
            .fetch_initial_state(
                &ProjectLocator::Coordinates(coords),
                None,
                &CoordinateFrame::IDENTITY,
            )
            .await
            .unwrap();
        let entity = snapshot.entity(&"E1".into()).unwrap();
        let Some(ComponentValue::Transform(t)) = entity.components.first() else {
            panic!("expected transform");
        };
        assert!(t.abs_diff_eq(&local, 1e-4));
    }

    #[tokio::test]
    async fn test_assets_deduplicated_and_missing_skipped() {
        let backend = Arc::new(MemoryEditorBackend::new());
        backend.insert_asset(asset("A"));
        let actor = EditorSyncActor::new(backend.clone(), fast_retry());

        let (outbox, mut rx) = ChannelOutbox::new();
        let sent = actor.resolve_and_send_assets(&scene(), &outbox).await.unwrap();
        assert_eq!(sent, 1);
        assert_eq!(backend.metadata_calls(), 1);

        let Ok(RendererCommand::SendAssets { assets }) = rx.try_recv() else {
            panic!("expected SendAssets");
        };
        assert_eq!(assets, vec![asset("A")]);
    }

    #[tokio::test]
    async fn test_no_shapes_no_request() {
        let backend = Arc::new(MemoryEditorBackend::new());
        let actor = EditorSyncActor::new(backend.clone(), fast_retry());
        let assets = actor.resolve_assets(&SceneSnapshot::default()).await.unwrap();
        assert!(assets.is_empty());
        assert_eq!(backend.metadata_calls(), 0);
    }
}
