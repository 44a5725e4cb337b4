//! The `builder` module contains the `SyncerBuilder` struct which is used to create a `Syncer`
//! instance.

use crate::{
    output::{OutputChannel, OUTPUT_ENV_VAR},
    syncer::{SyncConfig, Syncer},
};
use anyhow::{anyhow, Result};
use log::debug;
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// `SyncerBuilder` is used to create a [`Syncer`] instance. Anything that is not set falls back to
/// the value in [`SyncConfig::default`].
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct SyncerBuilder<'a> {
    project: Option<&'a str>,
    api_base_url: Option<&'a str>,
    token: Option<&'a str>,
    packages: Vec<PathBuf>,
    root_dir: Option<PathBuf>,
    asset_project: Option<&'a str>,
    asset_platform: Option<&'a str>,
    output_file: Option<PathBuf>,
    timeout: Option<Duration>,
    dry_run: bool,
}

impl<'a> SyncerBuilder<'a> {
    /// Returns a new empty `SyncerBuilder`.
    #[must_use]
    pub fn new() -> Self {
        SyncerBuilder::default()
    }

    /// Set the GitHub project to check, as `owner/repo`. Defaults to `intel/xpumanager`.
    #[must_use]
    pub fn project(mut self, project: &'a str) -> Self {
        self.project = Some(project);
        self
    }

    /// Set the base URL for the GitHub API. This is useful for testing or for a GitHub Enterprise
    /// install. This should be something like `https://github.my-corp.example.com/api/v3`.
    #[must_use]
    pub fn api_base_url(mut self, api_base_url: &'a str) -> Self {
        self.api_base_url = Some(api_base_url);
        self
    }

    /// Set a token to use for API requests. If this is not set, then the `GITHUB_TOKEN` env var is
    /// used if it is set.
    #[must_use]
    pub fn token(mut self, token: &'a str) -> Self {
        self.token = Some(token);
        self
    }

    /// Add a package directory to check. This can be called more than once. If it is never called,
    /// the `intel-xpumanager-bin` and `intel-xpu-smi-bin` directories are checked.
    #[must_use]
    pub fn package<P: AsRef<Path>>(mut self, package: P) -> Self {
        self.packages.push(package.as_ref().to_path_buf());
        self
    }

    /// Set the directory that package directories are relative to. Defaults to the current
    /// directory.
    #[must_use]
    pub fn root_dir<P: AsRef<Path>>(mut self, root_dir: P) -> Self {
        self.root_dir = Some(root_dir.as_ref().to_path_buf());
        self
    }

    /// Set the string that the picked asset's name must contain to identify the project. Defaults
    /// to `xpumanager`.
    #[must_use]
    pub fn asset_project(mut self, matching: &'a str) -> Self {
        self.asset_project = Some(matching);
        self
    }

    /// Set the string that the picked asset's name must contain to identify the platform. Defaults
    /// to `u24.04_amd64.deb`.
    #[must_use]
    pub fn asset_platform(mut self, matching: &'a str) -> Self {
        self.asset_platform = Some(matching);
        self
    }

    /// Set a file to append `updated=...` and `version=...` lines to. If this is not set, the
    /// `GITHUB_OUTPUT` env var is used. If neither is set, a summary is printed to stdout.
    #[must_use]
    pub fn output_file<P: AsRef<Path>>(mut self, output_file: P) -> Self {
        self.output_file = Some(output_file.as_ref().to_path_buf());
        self
    }

    /// Set the timeout for the request to GitHub. Defaults to 30 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Call this to report what would change without writing any `PKGBUILD` files. The result is
    /// still written to the output channel.
    #[must_use]
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Builds a new [`Syncer`] instance and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API base URL cannot be parsed or cannot take a path, if the project is not in
    /// `owner/repo` form, if an asset match string is empty, or if the timeout is zero.
    pub fn build(self) -> Result<Syncer> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(anyhow!("The timeout must be greater than zero"));
        }

        let mut config = SyncConfig::default();
        if let Some(project) = self.project {
            config.project = project.to_string();
        }
        if let Some(url) = self.api_base_url {
            config.api_base_url = Url::parse(url)
                .map_err(|e| anyhow!("could not parse `{url}` as an API base URL: {e}"))?;
        }
        config.token = self.token.map(String::from);
        if !self.packages.is_empty() {
            config.packages = self.packages;
        }
        if let Some(root_dir) = self.root_dir {
            config.root_dir = root_dir;
        }
        if let Some(m) = self.asset_project {
            config.asset_project = m.to_string();
        }
        if let Some(m) = self.asset_platform {
            config.asset_platform = m.to_string();
        }
        config.output = output_channel(self.output_file);
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.dry_run = self.dry_run;

        debug!("sync config = {config:?}");
        Syncer::new(config)
    }
}

fn output_channel(output_file: Option<PathBuf>) -> OutputChannel {
    if let Some(path) = output_file {
        return OutputChannel::File(path);
    }

    match env::var_os(OUTPUT_ENV_VAR) {
        Some(path) if !path.is_empty() => {
            debug!("Using the output file from the {OUTPUT_ENV_VAR} environment variable.");
            OutputChannel::File(PathBuf::from(path))
        }
        Some(_) | None => OutputChannel::Stdout,
    }
}
