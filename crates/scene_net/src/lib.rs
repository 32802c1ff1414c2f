//! # scene_net
//!
//! NATS transport layer for the scene sync engine.
//!
//! This crate provides:
//!
//! - [`subjects`] — NATS subject constants and builders.
//! - [`messages`] — Renderer commands/events and the operation result type.
//! - [`codec`] — MessagePack and JSON serialisation helpers.
//! - [`connection`] — NATS connection management and request/reply.
//! - [`link`] — The outbound renderer link and the inbound event bridge.
//! - [`error`] — Network-layer error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod link;
pub mod messages;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use link::{ChannelOutbox, NatsRendererOutbox, RendererOutbox};
pub use messages::{OperationResult, RendererCommand, RendererEvent};
