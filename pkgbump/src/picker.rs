use crate::{error::SyncError, release::Asset};
use anyhow::Result;
use itertools::Itertools;
use log::debug;

pub(crate) const DEFAULT_PROJECT_MATCH: &str = "xpumanager";
pub(crate) const DEFAULT_PLATFORM_MATCH: &str = "u24.04_amd64.deb";

/// Picks the release asset whose name identifies the build we package.
#[derive(Debug)]
pub(crate) struct AssetPicker {
    project: String,
    platform: String,
}

impl AssetPicker {
    pub(crate) fn new(project: String, platform: String) -> Self {
        Self { project, platform }
    }

    /// Returns the first asset, in release order, whose name contains both the project and the
    /// platform strings.
    pub(crate) fn pick_asset<'a>(&self, assets: &'a [Asset]) -> Result<&'a Asset> {
        debug!(
            "looking for an asset name containing `{}` and `{}`",
            self.project, self.platform,
        );

        // This could be a plain .find(), but then there's no place to put the debugging output.
        for asset in assets {
            debug!("matching against asset name = {}", asset.name);
            if !asset.name.contains(&self.project) {
                debug!("does not contain the project string");
                continue;
            }
            if !asset.name.contains(&self.platform) {
                debug!("does not contain the platform string");
                continue;
            }

            debug!("picked asset named {} at {}", asset.name, asset.url);
            return Ok(asset);
        }

        let available = if assets.is_empty() {
            "(none)".to_string()
        } else {
            assets.iter().map(|a| a.name.as_str()).join(", ")
        };
        Err(SyncError::NoMatchingAsset {
            project: self.project.clone(),
            platform: self.platform.clone(),
            available,
        }
        .into())
    }
}
