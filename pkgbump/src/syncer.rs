use crate::{
    github::{self, GitHub},
    output::OutputChannel,
    picker::{self, AssetPicker},
    pkgbuild::{update_pkgbuild, UpdateOutcome},
    release::ParsedRelease,
};
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client,
};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub(crate) const DEFAULT_PROJECT: &str = "intel/xpumanager";
pub(crate) const DEFAULT_PACKAGES: &[&str] = &["intel-xpumanager-bin", "intel-xpu-smi-bin"];
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a sync run needs to know. [`SyncConfig::default`] checks the Intel XPU Manager
/// releases and the two AUR package directories built from them, relative to the current
/// directory, and reports to stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// The upstream GitHub project, as `owner/repo`.
    pub project: String,
    pub api_base_url: Url,
    /// A GitHub token. When this is `None` the `GITHUB_TOKEN` env var is used, if set.
    pub token: Option<String>,
    /// Package directories, relative to `root_dir`, each holding a `PKGBUILD`.
    pub packages: Vec<PathBuf>,
    pub root_dir: PathBuf,
    /// The picked asset's name must contain this string ...
    pub asset_project: String,
    /// ... and this one.
    pub asset_platform: String,
    pub output: OutputChannel,
    pub timeout: Duration,
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            project: DEFAULT_PROJECT.to_string(),
            api_base_url: github::DEFAULT_API_BASE_URL.clone(),
            token: None,
            packages: DEFAULT_PACKAGES.iter().map(PathBuf::from).collect(),
            root_dir: PathBuf::from("."),
            asset_project: picker::DEFAULT_PROJECT_MATCH.to_string(),
            asset_platform: picker::DEFAULT_PLATFORM_MATCH.to_string(),
            output: OutputChannel::Stdout,
            timeout: DEFAULT_TIMEOUT,
            dry_run: false,
        }
    }
}

/// The result of a run, as handed to the output channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateResult {
    pub any_updated: bool,
    /// The upstream version that was found.
    pub version: String,
    pub packages: Vec<PackageReport>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageReport {
    pub dir: PathBuf,
    pub status: PackageStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageStatus {
    Updated {
        from_version: String,
        from_build: String,
    },
    UpToDate,
    /// The package directory does not exist.
    NotFound,
    /// The directory exists but its `PKGBUILD` could not be read, parsed, or written.
    Skipped {
        reason: String,
    },
}

/// `Syncer` runs one check of the upstream release against the local `PKGBUILD` files. Use the
/// [`SyncerBuilder`](crate::SyncerBuilder) struct to create one, or [`Syncer::new`] with a
/// [`SyncConfig`].
#[derive(Debug)]
pub struct Syncer {
    config: SyncConfig,
    github: GitHub,
    asset_picker: AssetPicker,
    reqwest_client: Client,
}

impl Syncer {
    /// Creates a new `Syncer` from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is not in `owner/repo` form, if there are no packages, if
    /// either asset match string is empty, or if the HTTP client cannot be built.
    pub fn new(config: SyncConfig) -> Result<Self> {
        if config.packages.is_empty() {
            return Err(anyhow!("You must give at least one package directory"));
        }
        if config.asset_project.is_empty() || config.asset_platform.is_empty() {
            return Err(anyhow!(
                "The asset project and platform match strings cannot be empty"
            ));
        }

        let github = GitHub::new(
            &config.project,
            config.api_base_url.clone(),
            config.token.clone(),
        )?;
        let asset_picker = AssetPicker::new(
            config.asset_project.clone(),
            config.asset_platform.clone(),
        );
        let reqwest_client = reqwest_client(config.timeout)?;

        Ok(Syncer {
            config,
            github,
            asset_picker,
            reqwest_client,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetches the latest release, updates every package directory that needs it, and writes the
    /// result to the output channel.
    ///
    /// # Errors
    ///
    /// Fetching or parsing the upstream release fails the whole run (see [`SyncError`](crate::SyncError)), as does
    /// failing to write the output. Any error while updating a single package only skips that
    /// package, so packages already rewritten are still reported.
    pub async fn sync(&self) -> Result<UpdateResult> {
        let release = self.latest_release().await?;
        info!(
            "Latest Version: {}, Build: {}",
            release.version, release.build_id
        );

        let mut packages = Vec::with_capacity(self.config.packages.len());
        for package in &self.config.packages {
            let dir = self.config.root_dir.join(package);
            let status = self.sync_package(&dir, &release);
            packages.push(PackageReport { dir, status });
        }

        let result = UpdateResult {
            any_updated: packages
                .iter()
                .any(|p| matches!(p.status, PackageStatus::Updated { .. })),
            version: release.version,
            packages,
        };
        if !result.any_updated {
            info!("All packages are up-to-date.");
        }

        self.config.output.write_result(&result)?;
        Ok(result)
    }

    /// Fetches the latest release and parses the version and build out of the matching asset.
    ///
    /// # Errors
    ///
    /// Returns a `Network`, `NoMatchingAsset`, or `FilenameFormat` [`SyncError`](crate::SyncError).
    pub async fn latest_release(&self) -> Result<ParsedRelease> {
        info!("Fetching latest release info...");
        let release = self
            .github
            .fetch_latest_release(&self.reqwest_client)
            .await?;
        let asset = self.asset_picker.pick_asset(&release.assets)?;
        ParsedRelease::from_asset_name(&asset.name, release.version_from_tag())
    }

    fn sync_package(&self, dir: &Path, release: &ParsedRelease) -> PackageStatus {
        if !dir.is_dir() {
            debug!("{} does not exist, skipping it", dir.display());
            return PackageStatus::NotFound;
        }

        match update_pkgbuild(dir, release, self.config.dry_run) {
            Ok(UpdateOutcome::Modified {
                from_version,
                from_build,
            }) => PackageStatus::Updated {
                from_version,
                from_build,
            },
            Ok(UpdateOutcome::NotModified) => PackageStatus::UpToDate,
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("Error: {reason}");
                PackageStatus::Skipped { reason }
            }
        }
    }
}

fn reqwest_client(timeout: Duration) -> Result<Client> {
    let builder = Client::builder().gzip(true).timeout(timeout);

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("pkgbump version {}", crate::VERSION))?,
    );
    Ok(builder.default_headers(headers).build()?)
}
