//! # scene_format
//!
//! Projections of a [`SceneSnapshot`](scene_graph::SceneSnapshot) into the
//! three external schemas the engine speaks, and back:
//!
//! - [`wire`] — [`SerializedSceneState`], the save/load payload exchanged
//!   with the host. No coordinate transform.
//! - [`manifest`] — [`Manifest`], the editor backend's own schema, with
//!   transforms in editor space.
//! - [`storable`] — [`StorableSceneState`], the deployment schema with
//!   deterministic byte output for content addressing.
//!
//! Per-kind manifest translation lives in the [`registry`] table; canonical
//! JSON output used for hashing lives in [`canonical`].

pub mod asset;
pub mod canonical;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod storable;
pub mod wire;

pub use asset::AssetDescriptor;
pub use error::FormatError;
pub use manifest::{Layout, Manifest, ManifestImport, Project};
pub use storable::StorableSceneState;
pub use wire::SerializedSceneState;
