use crate::error::SyncError;
use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::Deserialize;
use url::Url;

/// The part of a GitHub release response that we care about.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct Release {
    pub(crate) tag_name: String,
    pub(crate) assets: Vec<Asset>,
}

impl Release {
    /// The release tag with a single leading `v` removed, so `v1.3.5` becomes `1.3.5`.
    pub(crate) fn version_from_tag(&self) -> &str {
        self.tag_name
            .strip_prefix('v')
            .unwrap_or(self.tag_name.as_str())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Serialize))]
#[serde(try_from = "AssetHelper")]
pub(crate) struct Asset {
    pub(crate) name: String,
    pub(crate) url: Url,
}

#[derive(Debug, Deserialize)]
struct AssetHelper {
    name: String,
    url: Option<Url>,
    browser_download_url: Option<Url>,
}

impl TryFrom<AssetHelper> for Asset {
    type Error = anyhow::Error;

    fn try_from(helper: AssetHelper) -> Result<Self, Self::Error> {
        let url = helper.url.or(helper.browser_download_url).ok_or(anyhow!(
            "an asset in the response did not have a `url` or `browser_download_url` field"
        ))?;

        Ok(Asset {
            name: helper.name,
            url,
        })
    }
}

/// The version and build identifier taken from a release asset's filename.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedRelease {
    pub version: String,
    pub build_id: String,
    pub asset_name: String,
    pub tag: String,
}

impl ParsedRelease {
    /// Parses an asset name of the form `project_version_buildid_archsuffix`. The name is split on
    /// `_`, the second segment is the version, and the third is the build identifier. Anything after
    /// that is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::FilenameFormat`] when the name has fewer than 4 segments.
    pub fn from_asset_name(name: &str, tag: &str) -> Result<Self> {
        let segments = name.split('_').collect::<Vec<_>>();
        if segments.len() < 4 {
            return Err(SyncError::FilenameFormat {
                name: name.to_string(),
                segments: segments.len(),
            }
            .into());
        }

        let version = segments[1];
        let build_id = segments[2];
        debug!("parsed version `{version}` and build `{build_id}` from {name}");

        if !tag.is_empty() && tag != version {
            warn!(
                "release tag `{tag}` does not match the version `{version}` in {name}, using `{version}`"
            );
        }

        Ok(ParsedRelease {
            version: version.to_string(),
            build_id: build_id.to_string(),
            asset_name: name.to_string(),
            tag: tag.to_string(),
        })
    }
}
