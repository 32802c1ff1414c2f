//! # scene_publish
//!
//! Turns a scene snapshot into a signed deployment on the content-addressed
//! store.
//!
//! - [`pipeline`] — [`PublishPipeline`], the staged publish state machine.
//! - [`bundle`] — [`DeploymentBundle`] and its fixed logical paths.
//! - [`entity`] — content hashing and entity id derivation.
//! - [`metadata`] — the `scene.json` document.
//! - [`game`] — the generated `bin/game.js` scene script.
//! - [`store`] — the [`ContentStore`] collaborator and its NATS adapter;
//!   [`memory`] holds an in-memory store.
//! - [`stored`] — reading scene definitions back out of deployments.

pub mod bundle;
pub mod entity;
pub mod error;
pub mod game;
pub mod memory;
pub mod metadata;
pub mod pipeline;
pub mod store;
pub mod stored;

pub use bundle::DeploymentBundle;
pub use entity::{BuiltEntity, ContentEntity, ContentFile, SCENE_ENTITY_TYPE};
pub use error::PublishError;
pub use metadata::{Placement, SceneMetadata};
pub use pipeline::{PublishPipeline, PublishRequest, PublishStage};
pub use store::{ContentStore, Deployment, NatsContentStore};
