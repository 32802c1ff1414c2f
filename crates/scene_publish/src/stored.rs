//! Reading scene definitions back out of deployments.

use scene_format::StorableSceneState;
use scene_graph::SceneSnapshot;
use scene_math::Parcel;
use scene_sync::RetryPolicy;
use tracing::debug;

use crate::bundle::STATE_DEFINITION_PATH;
use crate::entity::{ContentEntity, SCENE_ENTITY_TYPE};
use crate::error::PublishError;
use crate::store::ContentStore;

/// The scene deployed under entity id `id`, if any.
///
/// # Errors
///
/// Returns [`PublishError::Store`] once the retry budget is spent.
pub async fn fetch_scene_entity(
    store: &dyn ContentStore,
    retry: &RetryPolicy,
    id: &str,
) -> Result<Option<ContentEntity>, PublishError> {
    retry
        .run("fetch_entity_by_id", || store.fetch_entity_by_id(SCENE_ENTITY_TYPE, id))
        .await
}

/// The scene currently active at `parcel`, if any.
///
/// # Errors
///
/// Returns [`PublishError::Store`] once the retry budget is spent.
pub async fn fetch_active_scene(
    store: &dyn ContentStore,
    retry: &RetryPolicy,
    parcel: Parcel,
) -> Result<Option<ContentEntity>, PublishError> {
    let pointers = [parcel.pointer()];
    let entities = retry
        .run("fetch_entities_by_pointers", || {
            store.fetch_entities_by_pointers(SCENE_ENTITY_TYPE, &pointers)
        })
        .await?;
    Ok(entities.into_iter().next())
}

/// Download and decode the scene definition of a deployed entity.
///
/// Returns `None` for deployments made without a scene definition.
///
/// # Errors
///
/// Returns [`PublishError::Store`] if the download keeps failing, or
/// [`PublishError::Format`] if the document does not decode.
pub async fn read_state_definition(
    store: &dyn ContentStore,
    retry: &RetryPolicy,
    entity: &ContentEntity,
) -> Result<Option<SceneSnapshot>, PublishError> {
    let Some(hash) = entity.content_hash(STATE_DEFINITION_PATH) else {
        debug!(entity = entity.id, "deployment has no scene definition");
        return Ok(None);
    };
    let bytes = retry
        .run("download_content", || store.download_content(hash))
        .await?;
    let state = StorableSceneState::from_bytes(&bytes)?;
    Ok(Some(state.to_snapshot()?))
}
