//! # scene_sync
//!
//! Keeps the scene graph aligned with its two live peers.
//!
//! - [`renderer`] — [`RendererSyncActor`]: pushes graph state to the renderer
//!   and ingests renderer-originated edits without echo loops.
//! - [`editor`] — [`EditorSyncActor`]: bootstraps the graph from the remote
//!   editor backend and resolves referenced assets for the renderer.
//! - [`backend`] / [`identity`] — collaborator interfaces and their NATS
//!   adapters; [`memory`] holds in-memory implementations.
//! - [`retry`] — the fixed retry budget for idempotent reads.

pub mod backend;
pub mod editor;
pub mod error;
pub mod identity;
pub mod memory;
pub mod renderer;
pub mod retry;

pub use backend::{EditorBackend, NatsEditorBackend, ProjectLocator};
pub use editor::EditorSyncActor;
pub use error::SyncError;
pub use identity::{Identity, IdentityProvider, NatsIdentityProvider, Signature};
pub use renderer::{EventOutcome, RendererSyncActor};
pub use retry::RetryPolicy;
