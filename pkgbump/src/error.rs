use std::path::PathBuf;
use thiserror::Error;

/// The failures a sync run can run into. The first three happen while fetching the upstream release
/// and end the run. The rest are scoped to a single package directory, which is then skipped.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum SyncError {
    #[error("could not fetch the latest release from {url}: {message}")]
    Network { url: String, message: String },

    #[error(
        "could not find a release asset containing `{project}` and `{platform}`; available assets: {available}"
    )]
    NoMatchingAsset {
        project: String,
        platform: String,
        available: String,
    },

    #[error(
        "the asset name `{name}` has {segments} `_`-separated segments but at least 4 are required"
    )]
    FilenameFormat { name: String, segments: usize },

    #[error("{} not found", .path.display())]
    MissingDescriptor { path: PathBuf },

    #[error("could not read {}: {message}", .path.display())]
    UnreadableDescriptor { path: PathBuf, message: String },

    #[error("could not parse {}: {problem}", .path.display())]
    MalformedDescriptor { path: PathBuf, problem: String },
}

impl SyncError {
    /// Returns true for errors that mean nothing can be compared, so the run has to stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Network { .. }
            | SyncError::NoMatchingAsset { .. }
            | SyncError::FilenameFormat { .. } => true,
            SyncError::MissingDescriptor { .. }
            | SyncError::UnreadableDescriptor { .. }
            | SyncError::MalformedDescriptor { .. } => false,
        }
    }

    pub(crate) fn network(url: impl Into<String>, err: &reqwest::Error) -> Self {
        SyncError::Network {
            url: url.into(),
            message: err.to_string(),
        }
    }
}
