//! The session dispatch loop.
//!
//! Host requests and renderer events are consumed by one loop, one message
//! at a time, in per-channel FIFO order. This is what serialises every
//! mutation of the scene graph.

use futures::StreamExt;
use scene_net::codec::encode_json;
use scene_net::{NatsConnection, NetError, RendererEvent, subjects};
use scene_sync::EventOutcome;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api;
use crate::kernel::SceneKernel;

/// Serve host requests under `prefix` and apply renderer `events` until
/// both streams end.
///
/// # Errors
///
/// Returns [`NetError::Subscribe`] if the host API subscription fails.
pub async fn run(
    kernel: &mut SceneKernel,
    conn: &NatsConnection,
    prefix: &str,
    mut events: mpsc::Receiver<RendererEvent>,
) -> Result<(), NetError> {
    let subject = subjects::api_wildcard(prefix);
    let mut requests = conn.subscribe(&subject).await?;
    info!(subject, "listening for host requests");

    loop {
        tokio::select! {
            Some(msg) = requests.next() => {
                let op = msg
                    .subject
                    .as_str()
                    .strip_prefix(prefix)
                    .and_then(|s| s.strip_prefix('.'))
                    .unwrap_or("")
                    .to_string();
                let reply = api::dispatch(kernel, &op, &msg.payload).await;

                let Some(reply_to) = msg.reply else {
                    continue;
                };
                match encode_json(&reply) {
                    Ok(bytes) => {
                        if let Err(e) = conn.client().publish(reply_to, bytes.into()).await {
                            error!(%e, op, "failed to publish reply");
                        }
                    }
                    Err(e) => error!(%e, op, "failed to encode reply"),
                }
            }
            Some(event) = events.recv() => {
                match kernel.handle_renderer_event(event) {
                    Ok(EventOutcome::Applied(changes)) if !changes.is_empty() => {
                        debug!(changes = changes.len(), "renderer changes applied");
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "rejected renderer event"),
                }
            }
            else => break,
        }
    }

    info!("session streams closed");
    Ok(())
}
