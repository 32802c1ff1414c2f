use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scene_kernel::{Collaborators, KernelConfig, SceneKernel, session};
use scene_net::link::spawn_event_bridge;
use scene_net::{NatsConnection, NatsRendererOutbox};
use scene_publish::NatsContentStore;
use scene_sync::{NatsEditorBackend, NatsIdentityProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scene_kernel=info".parse()?))
        .init();

    let config = KernelConfig::parse();
    let settings = config.session()?;
    info!(scene = settings.scene_id, url = config.nats_url, "scene kernel starting");

    let conn = NatsConnection::connect_to(&config.nats_url).await?;
    info!("connected to NATS");

    let collaborators = Collaborators {
        backend: Arc::new(NatsEditorBackend::new(conn.clone())),
        store: Arc::new(NatsContentStore::new(conn.clone())),
        identity: Arc::new(NatsIdentityProvider::new(conn.clone())),
        renderer: Arc::new(NatsRendererOutbox::new(conn.clone(), &settings.scene_id)),
    };
    let events = spawn_event_bridge(&conn, &settings.scene_id, config.event_buffer).await?;

    let mut kernel = SceneKernel::new(settings, collaborators);
    kernel.bootstrap(config.empty, config.project_id.as_deref()).await?;

    session::run(&mut kernel, &conn, &config.prefix, events).await?;

    info!("scene kernel shut down");
    Ok(())
}
