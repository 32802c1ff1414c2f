//! Renderer link.
//!
//! The renderer is reached through an abstract duplex channel: commands go
//! out through a [`RendererOutbox`], events come back through a FIFO
//! `tokio::sync::mpsc` receiver consumed by the session's dispatch loop.
//! [`NatsRendererOutbox`] and [`spawn_event_bridge`] implement the channel
//! over NATS; [`ChannelOutbox`] keeps it in-process.

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::connection::NatsConnection;
use crate::error::NetError;
use crate::messages::{RendererCommand, RendererEvent};
use crate::subjects;

/// Outbound half of the renderer channel.
#[async_trait]
pub trait RendererOutbox: Send + Sync {
    /// Deliver one command to the renderer. Commands are delivered in call
    /// order.
    async fn send(&self, command: RendererCommand) -> Result<(), NetError>;
}

/// Publishes renderer commands on the scene's NATS command subject.
#[derive(Debug, Clone)]
pub struct NatsRendererOutbox {
    conn: NatsConnection,
    subject: String,
}

impl NatsRendererOutbox {
    #[must_use]
    pub fn new(conn: NatsConnection, scene_id: &str) -> Self {
        Self {
            conn,
            subject: subjects::renderer_command(scene_id),
        }
    }
}

#[async_trait]
impl RendererOutbox for NatsRendererOutbox {
    async fn send(&self, command: RendererCommand) -> Result<(), NetError> {
        self.conn.publish(&self.subject, &command).await
    }
}

/// In-process renderer channel backed by an unbounded mpsc sender.
#[derive(Debug, Clone)]
pub struct ChannelOutbox {
    tx: mpsc::UnboundedSender<RendererCommand>,
}

impl ChannelOutbox {
    /// Create an outbox and the receiver the in-process renderer reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RendererCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RendererOutbox for ChannelOutbox {
    async fn send(&self, command: RendererCommand) -> Result<(), NetError> {
        self.tx.send(command).map_err(|_| NetError::ChannelClosed)
    }
}

/// Subscribe to the scene's renderer event subject and forward decoded
/// events, in arrival order, into a bounded channel.
///
/// Undecodable messages are logged and skipped. The bridge task ends when
/// the subscription closes or the receiver is dropped.
///
/// # Errors
///
/// Returns [`NetError::Subscribe`] if the subscription fails.
pub async fn spawn_event_bridge(
    conn: &NatsConnection,
    scene_id: &str,
    capacity: usize,
) -> Result<mpsc::Receiver<RendererEvent>, NetError> {
    let subject = subjects::renderer_event(scene_id);
    let mut sub = conn.subscribe(&subject).await?;
    info!(subject, "subscribed to renderer events");

    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(async move {
        while let Some(msg) = sub.next().await {
            let event: RendererEvent = match crate::codec::decode(msg.payload.as_ref()) {
                Ok(event) => event,
                Err(e) => {
                    warn!(%e, "dropping undecodable renderer event");
                    continue;
                }
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use scene_graph::EntityId;

    use super::*;

    #[tokio::test]
    async fn test_channel_outbox_preserves_order() {
        let (outbox, mut rx) = ChannelOutbox::new();
        outbox
            .send(RendererCommand::RemoveEntity {
                entity: EntityId::new("E1"),
            })
            .await
            .unwrap();
        outbox.send(RendererCommand::InitDone).await.unwrap();
        assert!(matches!(rx.recv().await, Some(RendererCommand::RemoveEntity { .. })));
        assert_eq!(rx.recv().await, Some(RendererCommand::InitDone));
    }

    #[tokio::test]
    async fn test_channel_outbox_closed() {
        let (outbox, rx) = ChannelOutbox::new();
        drop(rx);
        let err = outbox.send(RendererCommand::InitDone).await.unwrap_err();
        assert!(matches!(err, NetError::ChannelClosed));
    }
}
