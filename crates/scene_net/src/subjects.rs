//! NATS subject hierarchy.
//!
//! All engine subjects live under `scene.`. Renderer traffic is scoped per
//! scene instance; collaborator services are shared.

/// Root prefix for all engine NATS subjects.
pub const PREFIX: &str = "scene";

/// Default prefix of the host-facing API.
pub const DEFAULT_API_PREFIX: &str = "scene.api";

// ── Editor backend ──────────────────────────────────────────────────────────

pub const EDITOR_FETCH_MANIFEST: &str = "scene.editor.manifest.fetch";
pub const EDITOR_CREATE_PROJECT: &str = "scene.editor.project.create";
pub const EDITOR_UPDATE_MANIFEST: &str = "scene.editor.manifest.update";
pub const EDITOR_UPDATE_THUMBNAIL: &str = "scene.editor.thumbnail.update";
pub const EDITOR_ASSET_METADATA: &str = "scene.editor.assets.metadata";

// ── Content-addressed store ─────────────────────────────────────────────────

pub const CONTENT_DEPLOY: &str = "scene.content.deploy";
pub const CONTENT_ENTITY_BY_ID: &str = "scene.content.entity.by_id";
pub const CONTENT_ENTITIES_BY_POINTER: &str = "scene.content.entity.by_pointer";
pub const CONTENT_DOWNLOAD: &str = "scene.content.download";

// ── Identity provider ───────────────────────────────────────────────────────

pub const IDENTITY_CURRENT: &str = "scene.identity.current";
pub const IDENTITY_SIGN: &str = "scene.identity.sign";

// ── Dynamic subject builders ────────────────────────────────────────────────

/// Commands sent to the renderer for one scene instance.
///
/// `scene.renderer.command.<scene_id>`
#[must_use]
pub fn renderer_command(scene_id: &str) -> String {
    format!("scene.renderer.command.{scene_id}")
}

/// Events the renderer emits for one scene instance.
///
/// `scene.renderer.event.<scene_id>`
#[must_use]
pub fn renderer_event(scene_id: &str) -> String {
    format!("scene.renderer.event.{scene_id}")
}

/// Wildcard subject covering every operation of the host API.
///
/// `<prefix>.>`
#[must_use]
pub fn api_wildcard(prefix: &str) -> String {
    format!("{prefix}.>")
}

/// Subject of a single host API operation.
///
/// `<prefix>.<operation>`
#[must_use]
pub fn api_operation(prefix: &str, operation: &str) -> String {
    format!("{prefix}.{operation}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_subjects() {
        assert_eq!(renderer_command("s1"), "scene.renderer.command.s1");
        assert_eq!(renderer_event("s1"), "scene.renderer.event.s1");
    }

    #[test]
    fn test_api_subjects() {
        assert_eq!(api_wildcard(DEFAULT_API_PREFIX), "scene.api.>");
        assert_eq!(
            api_operation(DEFAULT_API_PREFIX, "save_scene_state"),
            "scene.api.save_scene_state"
        );
    }
}
