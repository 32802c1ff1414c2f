//! The publish state machine.
//!
//! ```text
//! Idle → AssetsResolved → BundleBuilt → EntitySigned → Uploaded → Done
//!   └──────────────┴──────────────┴─────────────┴──────────┴──→ Failed
//! ```
//!
//! Each attempt runs the stages once, in order. Any failure is terminal for
//! the attempt and nothing is deployed unless every earlier stage succeeded.
//! Only reads are retried; the deployment itself is submitted once.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use futures::stream;
use scene_format::{AssetDescriptor, FormatError, Manifest};
use scene_graph::SceneSnapshot;
use scene_net::OperationResult;
use scene_sync::{EditorBackend, Identity, IdentityProvider, RetryPolicy, SyncError};
use tracing::{debug, error, info, warn};

use crate::bundle::DeploymentBundle;
use crate::entity::SCENE_ENTITY_TYPE;
use crate::error::PublishError;
use crate::metadata::{Placement, SceneMetadata};
use crate::store::{ContentStore, Deployment};

/// Default number of asset files downloaded concurrently.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    Idle,
    AssetsResolved,
    BundleBuilt,
    EntitySigned,
    Uploaded,
    Done,
    Failed,
}

/// Everything one publish attempt needs.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<Vec<u8>>,
    pub snapshot: SceneSnapshot,
    pub placement: Placement,
    /// The editor project to bring in line after a successful deployment.
    pub project: Option<Manifest>,
}

/// Summary of a successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub entity_id: String,
    pub files: usize,
}

pub struct PublishPipeline {
    store: Arc<dyn ContentStore>,
    backend: Arc<dyn EditorBackend>,
    identity: Arc<dyn IdentityProvider>,
    retry: RetryPolicy,
    download_concurrency: usize,
    stage: PublishStage,
}

impl PublishPipeline {
    #[must_use]
    pub fn new(
        store: Arc<dyn ContentStore>,
        backend: Arc<dyn EditorBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store,
            backend,
            identity,
            retry: RetryPolicy::default(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            stage: PublishStage::Idle,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency.max(1);
        self
    }

    /// Stage reached by the last attempt.
    #[must_use]
    pub fn stage(&self) -> PublishStage {
        self.stage
    }

    /// Run one attempt and report its outcome. Never fails: every error is
    /// folded into the returned [`OperationResult`].
    pub async fn publish(&mut self, request: PublishRequest) -> OperationResult {
        match self.run(request).await {
            Ok(report) => {
                info!(entity_id = report.entity_id, files = report.files, "scene published");
                OperationResult::success()
            }
            Err(e) => {
                self.stage = PublishStage::Failed;
                error!(error = %e, "publish failed");
                OperationResult::failure(e.to_string())
            }
        }
    }

    /// Run one attempt.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing stage.
    pub async fn run(&mut self, request: PublishRequest) -> Result<PublishReport, PublishError> {
        self.stage = PublishStage::Idle;

        let assets = self.resolve_assets(&request.snapshot).await?;
        let downloads = self.download_assets(&assets).await?;
        self.advance(PublishStage::AssetsResolved);

        let metadata = SceneMetadata::new(
            &request.title,
            &request.description,
            request.thumbnail.is_some(),
            &request.placement,
            request.project.as_ref().map(|m| &m.project),
        );
        let bundle = DeploymentBundle::assemble(
            &request.snapshot,
            &metadata,
            request.thumbnail.as_deref(),
            &assets,
            downloads,
        )?;
        let built = self.store.build_entity(
            SCENE_ENTITY_TYPE,
            &request.placement.pointers(),
            now_millis(),
            bundle.files(),
            serde_json::to_value(&metadata).map_err(|e| PublishError::Build(e.to_string()))?,
        )?;
        self.advance(PublishStage::BundleBuilt);

        let identity = self
            .identity
            .current_identity()
            .await
            .ok_or(PublishError::IdentityUnavailable)?;
        let signature = self
            .identity
            .sign(&identity, built.id())
            .await
            .map_err(|e| PublishError::Signing(e.to_string()))?;
        self.advance(PublishStage::EntitySigned);

        let deployment = Deployment::new(built, signature);
        self.store.deploy_entity(&deployment).await?;
        self.advance(PublishStage::Uploaded);

        self.sync_project(&request, &identity).await;
        self.advance(PublishStage::Done);

        Ok(PublishReport {
            entity_id: deployment.entity_id,
            files: bundle.len(),
        })
    }

    fn advance(&mut self, next: PublishStage) {
        debug!(from = ?self.stage, to = ?next, "publish stage");
        self.stage = next;
    }

    /// Descriptors of every asset the scene references. Unlike renderer
    /// delivery, a single unknown asset aborts the publish.
    async fn resolve_assets(
        &self,
        snapshot: &SceneSnapshot,
    ) -> Result<BTreeMap<String, AssetDescriptor>, PublishError> {
        let ids = snapshot.asset_ids();
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let descriptors = self
            .retry
            .run("asset_metadata", || self.backend.asset_metadata(&ids))
            .await?;
        let mut assets: BTreeMap<String, AssetDescriptor> =
            descriptors.into_iter().map(|d| (d.id.clone(), d)).collect();
        assets.retain(|id, _| ids.contains(id));
        if let Some(missing) = ids.iter().find(|id| !assets.contains_key(*id)) {
            return Err(PublishError::AssetResolution {
                asset_id: missing.clone(),
                reason: "not in the asset catalogue".to_string(),
            });
        }
        Ok(assets)
    }

    /// Download every asset file with bounded, unordered concurrency. The
    /// first failure ends the batch; in-flight siblings are dropped.
    async fn download_assets(
        &self,
        assets: &BTreeMap<String, AssetDescriptor>,
    ) -> Result<BTreeMap<String, Vec<u8>>, PublishError> {
        let jobs = assets
            .values()
            .flat_map(|asset| {
                asset
                    .contents
                    .iter()
                    .map(|(relative, hash)| asset.deployment_path(relative).map(|path| (path, hash.clone())))
            })
            .collect::<Result<Vec<(String, String)>, FormatError>>()?;
        debug!(files = jobs.len(), "downloading asset files");

        let store = &self.store;
        let retry = self.retry;
        let mut downloads = stream::iter(jobs)
            .map(|(path, hash)| async move {
                match retry
                    .run("download_content", || store.download_content(&hash))
                    .await
                {
                    Ok(bytes) => Ok((path, bytes)),
                    Err(e) => Err(PublishError::Download {
                        path,
                        hash,
                        reason: e.to_string(),
                    }),
                }
            })
            .buffer_unordered(self.download_concurrency);

        let mut files = BTreeMap::new();
        while let Some(result) = downloads.next().await {
            let (path, bytes) = result?;
            files.insert(path, bytes);
        }
        Ok(files)
    }

    /// Bring the editor project's title, description and thumbnail in line
    /// with the deployment. Failures are logged; the deployment stands.
    async fn sync_project(&self, request: &PublishRequest, identity: &Identity) {
        let Some(project) = &request.project else {
            return;
        };
        let mut manifest = project.clone();
        manifest.project.title.clone_from(&request.title);
        manifest.project.description.clone_from(&request.description);
        if let Err(e) = self.backend.update_manifest(&manifest, identity).await {
            warn_secondary(&manifest.project.id, "manifest", &e);
        }
        if let Some(thumbnail) = &request.thumbnail
            && let Err(e) = self
                .backend
                .update_thumbnail(&manifest.project.id, thumbnail, identity)
                .await
        {
            warn_secondary(&manifest.project.id, "thumbnail", &e);
        }
    }
}

fn warn_secondary(project: &str, what: &str, e: &SyncError) {
    warn!(project, what, error = %e, "project update after deployment failed");
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
