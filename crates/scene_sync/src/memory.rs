//! In-memory collaborators, for local runs and tests.
//!
//! Each one can be switched into a failing mode to exercise the error paths
//! of the actors and pipelines built on top of them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use scene_format::{AssetDescriptor, Manifest};

use crate::backend::{EditorBackend, ProjectLocator};
use crate::error::SyncError;
use crate::identity::{Identity, IdentityProvider, Signature};

/// An [`EditorBackend`] holding manifests, thumbnails and asset metadata in
/// memory.
#[derive(Default)]
pub struct MemoryEditorBackend {
    manifests: DashMap<String, Manifest>,
    thumbnails: DashMap<String, Vec<u8>>,
    assets: DashMap<String, AssetDescriptor>,
    unavailable: AtomicBool,
    reject_writes: AtomicBool,
    fetch_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    manifest_updates: AtomicUsize,
}

impl MemoryEditorBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_manifest(&self, manifest: Manifest) {
        self.manifests.insert(manifest.project.id.clone(), manifest);
    }

    pub fn insert_asset(&self, asset: AssetDescriptor) {
        self.assets.insert(asset.id.clone(), asset);
    }

    #[must_use]
    pub fn manifest(&self, project_id: &str) -> Option<Manifest> {
        self.manifests.get(project_id).map(|m| m.clone())
    }

    #[must_use]
    pub fn thumbnail(&self, project_id: &str) -> Option<Vec<u8>> {
        self.thumbnails.get(project_id).map(|t| t.clone())
    }

    /// Make every call fail with [`SyncError::BackendUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make writes fail while reads keep working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn manifest_updates(&self) -> usize {
        self.manifest_updates.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), SyncError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::BackendUnavailable("backend offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<(), SyncError> {
        self.check_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(SyncError::BackendUnavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EditorBackend for MemoryEditorBackend {
    async fn fetch_manifest(
        &self,
        locator: &ProjectLocator,
        _identity: Option<&Identity>,
    ) -> Result<Option<Manifest>, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let found = match locator {
            ProjectLocator::ProjectId(id) => self.manifest(id),
            ProjectLocator::Coordinates(coords) => self
                .manifests
                .iter()
                .find(|m| m.project.creation_coords == Some(*coords))
                .map(|m| m.clone()),
        };
        Ok(found)
    }

    async fn create_project(&self, manifest: &Manifest, _identity: &Identity) -> Result<(), SyncError> {
        self.check_writable()?;
        self.insert_manifest(manifest.clone());
        Ok(())
    }

    async fn update_manifest(&self, manifest: &Manifest, _identity: &Identity) -> Result<(), SyncError> {
        self.check_writable()?;
        self.manifest_updates.fetch_add(1, Ordering::SeqCst);
        self.insert_manifest(manifest.clone());
        Ok(())
    }

    async fn update_thumbnail(
        &self,
        project_id: &str,
        image: &[u8],
        _identity: &Identity,
    ) -> Result<(), SyncError> {
        self.check_writable()?;
        self.thumbnails.insert(project_id.to_string(), image.to_vec());
        Ok(())
    }

    async fn asset_metadata(&self, ids: &[String]) -> Result<Vec<AssetDescriptor>, SyncError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.assets.get(id).map(|a| a.clone()))
            .collect())
    }
}

/// An [`IdentityProvider`] with a fixed identity (or none).
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
    refuse_signing: AtomicBool,
}

impl StaticIdentityProvider {
    #[must_use]
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            identity,
            refuse_signing: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn signed_in(address: &str) -> Self {
        Self::new(Some(Identity::new(address)))
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn set_refuse_signing(&self, refuse: bool) {
        self.refuse_signing.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }

    async fn sign(&self, identity: &Identity, payload: &str) -> Result<Signature, SyncError> {
        if self.refuse_signing.load(Ordering::SeqCst) {
            return Err(SyncError::Identity("signature request refused".to_string()));
        }
        Ok(Signature {
            signer: identity.address.clone(),
            payload: payload.to_string(),
            signature: format!("{}:{payload}", identity.address),
        })
    }
}

#[cfg(test)]
mod tests {
    use scene_math::Parcel;

    use super::*;

    #[tokio::test]
    async fn test_fetch_by_coordinates() {
        let backend = MemoryEditorBackend::new();
        backend.insert_manifest(Manifest::new_project("p1", "s1", Parcel::new(3, 4)));

        let locator = ProjectLocator::Coordinates(Parcel::new(3, 4));
        let found = backend.fetch_manifest(&locator, None).await.unwrap();
        assert_eq!(found.map(|m| m.project.id), Some("p1".to_string()));

        let missing = ProjectLocator::Coordinates(Parcel::new(0, 0));
        assert!(backend.fetch_manifest(&missing, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_reads() {
        let backend = MemoryEditorBackend::new();
        backend.set_unavailable(true);
        let err = backend
            .fetch_manifest(&ProjectLocator::ProjectId("p1".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_rejected_writes_keep_reads() {
        let backend = MemoryEditorBackend::new();
        let manifest = Manifest::new_project("p1", "s1", Parcel::new(0, 0));
        backend.insert_manifest(manifest.clone());
        backend.set_reject_writes(true);

        let identity = Identity::new("0xabc");
        assert!(backend.update_manifest(&manifest, &identity).await.is_err());
        assert!(backend.manifest("p1").is_some());
        assert_eq!(backend.manifest_updates(), 0);
    }

    #[tokio::test]
    async fn test_static_identity_signs() {
        let provider = StaticIdentityProvider::signed_in("0xabc");
        let identity = provider.current_identity().await.unwrap();
        let sig = provider.sign(&identity, "entity-id").await.unwrap();
        assert_eq!(sig.signer, "0xabc");
        assert_eq!(sig.payload, "entity-id");

        assert!(StaticIdentityProvider::anonymous().current_identity().await.is_none());
    }
}
