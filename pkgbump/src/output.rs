use crate::syncer::UpdateResult;
use anyhow::{Context, Result};
use log::debug;
use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
};

/// The environment variable GitHub Actions uses to name the file that step outputs are appended to.
pub(crate) const OUTPUT_ENV_VAR: &str = "GITHUB_OUTPUT";

/// Where the final result of a run is reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputChannel {
    /// Append `key=value` lines to this file.
    File(PathBuf),
    /// Print a sentence for a human to stdout.
    Stdout,
}

impl OutputChannel {
    pub(crate) fn write_result(&self, result: &UpdateResult) -> Result<()> {
        match self {
            OutputChannel::File(path) => {
                debug!("appending the result to {}", path.display());
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("could not open output file {}", path.display()))?;
                write_key_values(&mut file, result)
                    .with_context(|| format!("could not write to output file {}", path.display()))
            }
            OutputChannel::Stdout => {
                let mut stdout = io::stdout().lock();
                write_summary(&mut stdout, result)?;
                Ok(())
            }
        }
    }
}

pub(crate) fn write_key_values<W: Write>(w: &mut W, result: &UpdateResult) -> io::Result<()> {
    writeln!(w, "updated={}", result.any_updated)?;
    if result.any_updated {
        writeln!(w, "version={}", result.version)?;
    }
    Ok(())
}

pub(crate) fn write_summary<W: Write>(w: &mut W, result: &UpdateResult) -> io::Result<()> {
    if result.any_updated {
        writeln!(w, "Updated packages to version {}.", result.version)
    } else {
        writeln!(w, "All packages are up-to-date ({}).", result.version)
    }
}
