use crate::{error::SyncError, release::ParsedRelease};
use anyhow::{Context, Result};
use lazy_regex::{regex, regex_captures, regex_is_match};
use log::{debug, info};
use regex::NoExpand;
use std::{
    borrow::Cow,
    fs, io,
    path::{Path, PathBuf},
};

pub(crate) const PKGBUILD_FILE_NAME: &str = "PKGBUILD";

/// The checksum array written after a version change. `makepkg`/`updpkgsums` read `SKIP` as "not
/// verified", and a later step in the pipeline recomputes the real sums, so the exact text matters.
pub const SKIP_SHA256SUMS: &str = "sha256sums=('SKIP')";

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub(crate) enum Field {
    #[strum(serialize = "pkgver")]
    PkgVer,
    #[strum(serialize = "_buildver")]
    BuildVer,
}

/// What happened to a single `PKGBUILD`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Modified {
        from_version: String,
        from_build: String,
    },
    NotModified,
}

impl UpdateOutcome {
    #[must_use]
    pub fn is_modified(&self) -> bool {
        matches!(self, UpdateOutcome::Modified { .. })
    }
}

#[derive(Debug)]
pub(crate) struct Pkgbuild {
    path: PathBuf,
    content: String,
}

impl Pkgbuild {
    pub(crate) fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(PKGBUILD_FILE_NAME);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::MissingDescriptor { path }.into());
            }
            Err(e) => {
                return Err(SyncError::UnreadableDescriptor {
                    path,
                    message: e.to_string(),
                }
                .into());
            }
        };
        let Ok(content) = String::from_utf8(bytes) else {
            return Err(SyncError::MalformedDescriptor {
                path,
                problem: "it is not valid UTF-8".to_string(),
            }
            .into());
        };

        Ok(Pkgbuild { path, content })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the first value assigned to `field` at the start of a line, up to the first
    /// whitespace.
    pub(crate) fn current(&self, field: Field) -> Result<&str> {
        let value = self.content.lines().find_map(|line| match field {
            Field::PkgVer => regex_captures!(r"^pkgver=(\S+)", line).map(|(_, v)| v),
            Field::BuildVer => regex_captures!(r"^_buildver=(\S+)", line).map(|(_, v)| v),
        });

        value.ok_or_else(|| {
            SyncError::MalformedDescriptor {
                path: self.path.clone(),
                problem: format!("the current {field} is missing or empty"),
            }
            .into()
        })
    }

    /// Returns the file content with `pkgver`, `_buildver`, `pkgrel`, and `sha256sums` replaced.
    /// Every other byte, including line endings and a missing final newline, is kept as is.
    pub(crate) fn rewritten(&self, version: &str, build_id: &str) -> String {
        let mut new = String::with_capacity(self.content.len());
        for line in self.content.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            new.push_str(&rewrite_line(body, version, build_id));
            new.push_str(ending);
        }
        new
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn rewrite_line<'a>(line: &'a str, version: &str, build_id: &str) -> Cow<'a, str> {
    if regex_is_match!(r"^pkgver=.+$", line) {
        return Cow::Owned(format!("{}={version}", Field::PkgVer));
    }
    if regex_is_match!(r"^_buildver=.+$", line) {
        return Cow::Owned(format!("{}={build_id}", Field::BuildVer));
    }
    if regex_is_match!(r"^pkgrel=.+$", line) {
        return Cow::Borrowed("pkgrel=1");
    }
    // Anything after the closing paren, like a trailing comment, stays.
    regex!(r"^sha256sums=\('.*'\)").replace(line, NoExpand(SKIP_SHA256SUMS))
}

/// Brings the `PKGBUILD` in `dir` up to `target`. The file is only written when the recorded
/// version or build differs from the target. With `dry_run` the outcome is computed but nothing is
/// written.
///
/// # Errors
///
/// Returns [`SyncError::MissingDescriptor`] if there is no `PKGBUILD` in `dir`,
/// [`SyncError::UnreadableDescriptor`] if it cannot be read, and [`SyncError::MalformedDescriptor`]
/// if it is not UTF-8 or has no `pkgver` or `_buildver` line. A failed write is returned with the
/// path as context.
pub fn update_pkgbuild(dir: &Path, target: &ParsedRelease, dry_run: bool) -> Result<UpdateOutcome> {
    let pkgbuild = Pkgbuild::read(dir)?;
    let current_version = pkgbuild.current(Field::PkgVer)?;
    let current_build = pkgbuild.current(Field::BuildVer)?;

    if current_version == target.version && current_build == target.build_id {
        info!(
            "[{}] Already up to date ({current_version}-{current_build}). Skipping.",
            dir.display(),
        );
        return Ok(UpdateOutcome::NotModified);
    }

    info!(
        "[{}] Update detected: {current_version}-{current_build} -> {}-{}",
        dir.display(),
        target.version,
        target.build_id,
    );
    let outcome = UpdateOutcome::Modified {
        from_version: current_version.to_string(),
        from_build: current_build.to_string(),
    };

    let new_content = pkgbuild.rewritten(&target.version, &target.build_id);
    if dry_run {
        debug!(
            "dry run, not writing {}:\n{new_content}",
            pkgbuild.path().display()
        );
        return Ok(outcome);
    }

    fs::write(pkgbuild.path(), new_content)
        .with_context(|| format!("could not write {}", pkgbuild.path().display()))?;
    debug!("wrote {}", pkgbuild.path().display());

    Ok(outcome)
}
