//! A library for keeping `PKGBUILD` files in step with an upstream GitHub release.
//!
//! It looks up the latest release of a GitHub project, finds the release asset that identifies the
//! build being packaged, and pulls a version and build identifier out of that asset's filename. Then
//! it checks each configured package directory and rewrites the `PKGBUILD` there when the recorded
//! version or build differs. It is designed to run from CI, where a later step rebuilds the checksums
//! and commits the result.
//!
//! This project also ships a CLI tool named `pkgbump`.
//!
//! The main entry point for programmatic use is the [`SyncerBuilder`] struct. Here is an example of
//! its usage:
//!
//! ```ignore
//! use pkgbump::SyncerBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let syncer = SyncerBuilder::new()
//!         .project("intel/xpumanager")
//!         .package("intel-xpumanager-bin")
//!         .build()?;
//!
//!     let result = syncer.sync().await?;
//!     println!("updated = {}", result.any_updated);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## How the Version is Found
//!
//! The release assets are checked in the order GitHub returns them. The first asset whose name
//! contains both the project string (`xpumanager` by default) and the platform string
//! (`u24.04_amd64.deb` by default) is used. Its name is split on `_`, and must have at least four
//! parts, as in `xpumanager_1.3.5_20251216.170635.605ff78d.u24.04_amd64.deb`. The second part is the
//! version and the third is the build identifier.
//!
//! ## What Gets Rewritten
//!
//! When a `PKGBUILD`'s `pkgver` or `_buildver` differs from upstream, these lines are replaced and
//! nothing else in the file is touched:
//!
//! - `pkgver=` gets the new version.
//! - `_buildver=` gets the new build identifier.
//! - `pkgrel=` is reset to `1`.
//! - `sha256sums=('...')` becomes `sha256sums=('SKIP')`.
//!
//! ## Reporting
//!
//! When `GITHUB_OUTPUT` (or an explicit output file) is set, `updated=true` or `updated=false` is
//! appended to it, followed by `version=...` when something was updated. Otherwise a one-line
//! summary is printed to stdout.
//!
//! ## Features
//!
//! This crate offers several features to control the TLS dependency used by `reqwest`:
//!
#![doc = document_features::document_features!()]

mod builder;
mod error;
mod github;
mod output;
mod picker;
mod pkgbuild;
mod release;
mod syncer;
#[cfg(test)]
mod test_case;

pub use crate::{
    builder::SyncerBuilder,
    error::SyncError,
    output::OutputChannel,
    pkgbuild::{update_pkgbuild, UpdateOutcome, SKIP_SHA256SUMS},
    release::ParsedRelease,
    syncer::{PackageReport, PackageStatus, SyncConfig, Syncer, UpdateResult},
};

// The version of the `pkgbump` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "logging")]
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};

/// This function initializes logging for the application. It's public for the sake of the
/// `pkgbump` binary, but it lives in the library crate so that test code can also enable logging.
///
/// # Errors
///
/// This can return a `log::SetLoggerError` error.
#[cfg(feature = "logging")]
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    let line_colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightBlack)
        .debug(Color::BrightBlack)
        .trace(Color::BrightBlack);
    let level_colors = line_colors.info(Color::Green).debug(Color::Black);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{target}][{level}{color_line}] {message}\x1B[0m",
                color_line = format_args!(
                    "\x1B[{}m",
                    line_colors.get_color(&record.level()).to_fg_str()
                ),
                target = record.target(),
                level = level_colors.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        // These are very noisy.
        .level_for("hyper", log::LevelFilter::Error)
        .level_for("hyper_util", log::LevelFilter::Error)
        .level_for("reqwest", log::LevelFilter::Error)
        .chain(std::io::stderr())
        .apply()
}
