//! # scene_kernel — Scene session orchestrator
//!
//! The kernel is the single owner of one scene session's graph. Host
//! requests and renderer events are consumed by one dispatch loop, so no two
//! mutations ever apply concurrently.
//!
//! ## Startup Sequence
//!
//! 1. Connect to NATS and bridge the scene's renderer event subject.
//! 2. Bootstrap: load the project from the editor backend unless the scene
//!    is empty, push the full state to the renderer, send `InitDone`.
//! 3. Serve host requests on `<prefix>.<operation>` and apply renderer
//!    events until both streams close.

pub mod api;
pub mod config;
pub mod error;
pub mod kernel;
pub mod session;

pub use config::KernelConfig;
pub use error::KernelError;
pub use kernel::{Collaborators, SceneKernel, SessionSettings};
