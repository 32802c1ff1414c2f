//! # scene_graph
//!
//! The canonical in-memory scene for one scene session.
//!
//! This crate provides:
//!
//! - [`entity`] — stable entity identifiers.
//! - [`component`] — the closed set of component kinds and their payloads.
//! - [`graph`] — the [`SceneGraph`] store and its single mutation entry point.
//! - [`snapshot`] — immutable, order-preserving exports and change records.
//! - [`error`] — mutation error types.
//!
//! Every external representation of a scene (wire, editor manifest,
//! storable) is a projection of a [`SceneSnapshot`].

pub mod component;
pub mod entity;
pub mod error;
pub mod graph;
pub mod snapshot;

pub use component::{
    ComponentKind, ComponentValue, GltfShape, LockedOnEdit, Name, NftShape, Script,
};
pub use entity::EntityId;
pub use error::SceneError;
pub use graph::{ChangeOutcome, SceneGraph};
pub use snapshot::{Change, EntitySnapshot, SceneSnapshot};
