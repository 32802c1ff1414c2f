//! Command-line configuration.

use clap::Parser;
use scene_math::{LandRotation, Parcel, ParcelParseError};
use scene_net::connection::DEFAULT_NATS_URL;
use scene_net::subjects::DEFAULT_API_PREFIX;
use scene_publish::Placement;
use scene_publish::pipeline::DEFAULT_DOWNLOAD_CONCURRENCY;
use scene_sync::RetryPolicy;

use crate::kernel::SessionSettings;

#[derive(Debug, Clone, Parser)]
#[command(name = "scene_kernel", about = "Scene state synchronisation and publishing over NATS")]
pub struct KernelConfig {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = DEFAULT_NATS_URL)]
    pub nats_url: String,

    /// Subject prefix of the host API
    #[arg(long, default_value = DEFAULT_API_PREFIX)]
    pub prefix: String,

    /// Scene instance id
    #[arg(long)]
    pub scene_id: String,

    /// Base parcel of the scene, `x,y`
    #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
    pub base_parcel: Parcel,

    /// Parcels the scene occupies, `x,y;x,y;...` (defaults to the base parcel)
    #[arg(long, allow_hyphen_values = true)]
    pub parcels: Option<String>,

    /// Land rotation: north, east, south or west
    #[arg(long, default_value = "north")]
    pub rotation: LandRotation,

    /// Editor project to load instead of the one at the base parcel
    #[arg(long)]
    pub project_id: Option<String>,

    /// The scene instance is empty: skip loading from the editor backend
    #[arg(long)]
    pub empty: bool,

    /// Asset files downloaded concurrently while publishing
    #[arg(long, default_value_t = DEFAULT_DOWNLOAD_CONCURRENCY)]
    pub download_concurrency: usize,

    /// Renderer events buffered ahead of the dispatch loop
    #[arg(long, default_value_t = 256)]
    pub event_buffer: usize,
}

impl KernelConfig {
    /// The land placement described by the parcel flags.
    ///
    /// # Errors
    ///
    /// Returns [`ParcelParseError`] if `--parcels` is malformed.
    pub fn placement(&self) -> Result<Placement, ParcelParseError> {
        let mut placement = Placement::single(self.base_parcel, self.rotation);
        if let Some(list) = &self.parcels {
            let parcels = Parcel::parse_list(list)?;
            if !parcels.is_empty() {
                placement.parcels = parcels;
            }
        }
        Ok(placement)
    }

    /// Settings of the scene session.
    ///
    /// # Errors
    ///
    /// Returns [`ParcelParseError`] if `--parcels` is malformed.
    pub fn session(&self) -> Result<SessionSettings, ParcelParseError> {
        Ok(SessionSettings {
            scene_id: self.scene_id.clone(),
            placement: self.placement()?,
            retry: RetryPolicy::default(),
            download_concurrency: self.download_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KernelConfig::try_parse_from(["scene_kernel", "--scene-id", "s1"]).unwrap();
        assert_eq!(config.prefix, "scene.api");
        assert_eq!(config.base_parcel, Parcel::new(0, 0));
        assert_eq!(config.rotation, LandRotation::North);
        assert!(!config.empty);

        let settings = config.session().unwrap();
        assert_eq!(settings.placement.parcels, vec![Parcel::new(0, 0)]);
        assert_eq!(settings.retry, RetryPolicy::default());
    }

    #[test]
    fn test_placement_flags() {
        let config = KernelConfig::try_parse_from([
            "scene_kernel",
            "--scene-id",
            "s1",
            "--base-parcel",
            "-3,7",
            "--parcels",
            "-3,7;-2,7",
            "--rotation",
            "east",
            "--empty",
        ])
        .unwrap();
        let placement = config.placement().unwrap();
        assert_eq!(placement.base, Parcel::new(-3, 7));
        assert_eq!(placement.pointers(), vec!["-3,7".to_string(), "-2,7".to_string()]);
        assert_eq!(placement.rotation, LandRotation::East);
        assert!(config.empty);
    }

    #[test]
    fn test_malformed_parcels_rejected() {
        let config =
            KernelConfig::try_parse_from(["scene_kernel", "--scene-id", "s1", "--parcels", "0,0;nope"]).unwrap();
        assert!(config.session().is_err());
    }
}
