//! `publish-metadata` — exports an everyday-key-stripped copy of the
//! container and uploads it to every configured metadata location.

use anyhow::{Context, Result};
use paradux_core::store::metadata_locations::MetadataLocationsStore;
use paradux_core::store::ConfigStore;
use paradux_core::transfer::scp::ScpBackend;
use paradux_core::transfer::DataTransfer;

use super::{container, Command, GlobalArgs};
use crate::process::RealSubprocess;

pub struct PublishMetadataCommand;

impl Command for PublishMetadataCommand {
    fn name(&self) -> &'static str {
        "publish-metadata"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let manager = container::mount_with_prompt(&global.paradux_dir)?;
        let _guard = manager.guard();
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());

        let locations = MetadataLocationsStore::load(&layout.metadata_master())?;
        if locations.locations.is_empty() {
            tracing::warn!("no metadata locations configured; nothing to publish");
            return Ok(());
        }

        let export_path = global.paradux_dir.join("metadata-export.img");
        manager
            .export_metadata(&export_path)
            .context("failed to produce the everyday-key-stripped export copy")?;

        let transfer = DataTransfer::new(vec![Box::new(ScpBackend::new(RealSubprocess))]);

        let publish_result = (|| -> Result<()> {
            for location in &locations.locations {
                let uploaded = transfer.upload(&export_path, location)?;
                if uploaded {
                    println!("published to {}", location.url);
                } else {
                    tracing::warn!(url = %location.url, "no backend supports this location's scheme; skipped");
                }
            }
            Ok(())
        })();

        let _ = std::fs::remove_file(&export_path);
        publish_result.context("failed to publish metadata")
    }
}
