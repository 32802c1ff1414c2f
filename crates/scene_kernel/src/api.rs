//! Host API: JSON request/reply operations on `<prefix>.<operation>`.
//!
//! Operations:
//!
//!   getProjectManifest                 — `{projectId}` → wire state | null
//!   getProjectManifestByCoordinates    — `{coords: "x,y"}` → wire state | null
//!   createProjectWithCoords            — `{coords: "x,y"}` → bool
//!   saveSceneState                     — `{state}` → `{ok, error?}`
//!   saveProjectInfo                    — `{state, title, description, thumbnail?}` → bool
//!   publishSceneState                  — `{sceneId, title, description, thumbnail?, state}` → `{ok, error?}`
//!   getStoredState                     — `{sceneId}` → wire state | null
//!   createProjectFromStateDefinition   — `{}` → wire state | null
//!   sendAssetsToRenderer               — `{state}` → bool
//!
//! Replies use the [`Reply`] envelope: `{"ok": <value>}`, or
//! `{"error": "<message>"}` for requests that could not be parsed.

use scene_format::SerializedSceneState;
use scene_math::Parcel;
use scene_net::messages::Reply;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::kernel::SceneKernel;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRequest {
    project_id: String,
}

#[derive(Deserialize)]
struct CoordsRequest {
    coords: Parcel,
}

#[derive(Deserialize)]
struct StateRequest {
    state: SerializedSceneState,
}

#[derive(Deserialize)]
struct ProjectInfoRequest {
    state: SerializedSceneState,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnail: Option<Vec<u8>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishRequest {
    scene_id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnail: Option<Vec<u8>>,
    state: SerializedSceneState,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneRequest {
    scene_id: String,
}

fn parse<T: DeserializeOwned>(payload: &[u8]) -> Result<T, Reply> {
    serde_json::from_slice(payload).map_err(|e| Reply::error(format!("invalid request: {e}")))
}

fn reply<T: Serialize>(value: &T) -> Reply {
    Reply::ok(value).unwrap_or_else(|e| Reply::error(e.to_string()))
}

/// Run one host operation against the kernel.
pub async fn dispatch(kernel: &mut SceneKernel, op: &str, payload: &[u8]) -> Reply {
    debug!(op, "received request");
    match handle(kernel, op, payload).await {
        Ok(reply) | Err(reply) => reply,
    }
}

async fn handle(kernel: &mut SceneKernel, op: &str, payload: &[u8]) -> Result<Reply, Reply> {
    let reply = match op {
        "getProjectManifest" => {
            let req: ProjectRequest = parse(payload)?;
            reply(&kernel.get_project_manifest(&req.project_id).await)
        }
        "getProjectManifestByCoordinates" => {
            let req: CoordsRequest = parse(payload)?;
            reply(&kernel.get_project_manifest_by_coordinates(req.coords).await)
        }
        "createProjectWithCoords" => {
            let req: CoordsRequest = parse(payload)?;
            reply(&kernel.create_project_with_coords(req.coords).await)
        }
        "saveSceneState" => {
            let req: StateRequest = parse(payload)?;
            reply(&kernel.save_scene_state(&req.state).await)
        }
        "saveProjectInfo" => {
            let req: ProjectInfoRequest = parse(payload)?;
            let saved = kernel
                .save_project_info(&req.state, &req.title, &req.description, req.thumbnail)
                .await;
            reply(&saved)
        }
        "publishSceneState" => {
            let req: PublishRequest = parse(payload)?;
            let result = kernel
                .publish_scene_state(&req.scene_id, &req.title, &req.description, req.thumbnail, &req.state)
                .await;
            reply(&result)
        }
        "getStoredState" => {
            let req: SceneRequest = parse(payload)?;
            reply(&kernel.get_stored_state(&req.scene_id).await)
        }
        "createProjectFromStateDefinition" => reply(&kernel.create_project_from_state_definition().await),
        "sendAssetsToRenderer" => {
            let req: StateRequest = parse(payload)?;
            reply(&kernel.send_assets_to_renderer(&req.state).await)
        }
        _ => {
            warn!(op, "unknown operation");
            Reply::error(format!("unknown operation: {op}"))
        }
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scene_format::wire::{SerializedComponent, SerializedEntity};
    use scene_math::LandRotation;
    use scene_net::{ChannelOutbox, OperationResult, RendererCommand};
    use scene_publish::Placement;
    use scene_publish::memory::MemoryContentStore;
    use scene_sync::memory::{MemoryEditorBackend, StaticIdentityProvider};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::kernel::{Collaborators, SessionSettings};

    async fn kernel() -> (SceneKernel, UnboundedReceiver<RendererCommand>) {
        let (outbox, rx) = ChannelOutbox::new();
        let collaborators = Collaborators {
            backend: Arc::new(MemoryEditorBackend::new()),
            store: Arc::new(MemoryContentStore::new()),
            identity: Arc::new(StaticIdentityProvider::signed_in("0xabc")),
            renderer: Arc::new(outbox),
        };
        let settings = SessionSettings::new("s1", Placement::single(Parcel::new(0, 0), LandRotation::North));
        let mut kernel = SceneKernel::new(settings, collaborators);
        kernel.bootstrap(true, None).await.unwrap();
        (kernel, rx)
    }

    fn payload(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let (mut kernel, _rx) = kernel().await;
        let reply = dispatch(&mut kernel, "explode", b"{}").await;
        assert_eq!(reply.error.as_deref(), Some("unknown operation: explode"));
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let (mut kernel, _rx) = kernel().await;
        let reply = dispatch(&mut kernel, "getProjectManifest", b"not json").await;
        assert!(reply.error.unwrap().starts_with("invalid request"));
    }

    #[tokio::test]
    async fn test_save_scene_state_over_api() {
        let (mut kernel, _rx) = kernel().await;
        let state = SerializedSceneState {
            entities: vec![SerializedEntity {
                id: "E1".into(),
                components: vec![SerializedComponent {
                    type_code: 1000,
                    value: json!({ "value": "lamp" }),
                }],
            }],
        };
        let reply = dispatch(&mut kernel, "saveSceneState", &payload(json!({ "state": state }))).await;
        let result: OperationResult = reply.into_result().unwrap();
        assert_eq!(result, OperationResult::success());
        assert_eq!(kernel.graph().entity_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_project_is_null() {
        let (mut kernel, _rx) = kernel().await;
        let reply = dispatch(&mut kernel, "getProjectManifest", &payload(json!({ "projectId": "nope" }))).await;
        assert!(reply.error.is_none());
        let state: Option<SerializedSceneState> = reply.into_result().unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_create_project_with_coords_over_api() {
        let (mut kernel, _rx) = kernel().await;
        let reply = dispatch(&mut kernel, "createProjectWithCoords", &payload(json!({ "coords": "4,-2" }))).await;
        assert!(reply.into_result::<bool>().unwrap());
        let project = kernel.project().unwrap();
        assert_eq!(project.project.creation_coords, Some(Parcel::new(4, -2)));
    }
}
