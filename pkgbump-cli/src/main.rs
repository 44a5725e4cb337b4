use anyhow::{Error, Result};
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use log::{debug, error};
use pkgbump::{PackageStatus, Syncer, SyncerBuilder, UpdateResult};
use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
enum PkgbumpError {
    #[error("{0:}")]
    InvalidArgsError(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cmd = cmd();
    let matches = cmd.get_matches();
    let res = init_logger_from_matches(&matches);
    if let Err(e) = res {
        eprintln!("Error creating logger: {e}");
        std::process::exit(126);
    }

    let status = match make_syncer(&matches) {
        Ok(s) => match s.sync().await {
            Ok(result) => {
                log_result(&result);
                0
            }
            Err(e) => {
                print_err(&e);
                1
            }
        },
        Err(e) => {
            print_err(&e);
            127
        }
    };
    std::process::exit(status);
}

const MAX_TERM_WIDTH: usize = 100;

fn cmd() -> Command {
    Command::new("pkgbump")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Dave Rolsky <autarch@urth.org>")
        .about("Updates PKGBUILD files to the latest upstream GitHub release")
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .help("The GitHub project to check, like intel/xpumanager. This is the default."),
        )
        .arg(Arg::new("api-base-url").long("api-base-url").help(concat!(
            "The base URL for the GitHub API. This is useful for testing or if you want to",
            " check a project on GitHub Enterprise. This should be something like",
            " `https://github.my-corp.example.com/api/v3`.",
        )))
        .arg(
            Arg::new("package")
                .long("package")
                .short('P')
                .action(ArgAction::Append)
                .help(concat!(
                    "A package directory containing a PKGBUILD to check. This can be passed more",
                    " than once. Directories that do not exist are skipped. Defaults to",
                    " intel-xpumanager-bin and intel-xpu-smi-bin.",
                )),
        )
        .arg(
            Arg::new("dir")
                .long("dir")
                .short('C')
                .help("The directory that package directories are relative to. Defaults to ."),
        )
        .arg(
            Arg::new("asset-project")
                .long("asset-project")
                .help(concat!(
                    "A string the release asset's filename must contain to identify the project.",
                    " Defaults to xpumanager.",
                )),
        )
        .arg(
            Arg::new("asset-platform")
                .long("asset-platform")
                .help(concat!(
                    "A string the release asset's filename must contain to identify the platform.",
                    " Defaults to u24.04_amd64.deb.",
                )),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .short('o')
                .help(concat!(
                    "A file to append `updated=...` and `version=...` lines to. Defaults to the",
                    " value of the GITHUB_OUTPUT env var. If neither is set, a summary is printed",
                    " to stdout.",
                )),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(value_parser!(u64).range(1..))
                .help("The number of seconds to wait for GitHub to respond. Defaults to 30."),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .short('n')
                .action(ArgAction::SetTrue)
                .help("Report what would change without writing any PKGBUILD files."),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Enable debugging output."),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Suppresses most output."),
        )
        .group(ArgGroup::new("log-level").args(["debug", "quiet"]))
        .max_term_width(MAX_TERM_WIDTH)
}

pub(crate) fn init_logger_from_matches(matches: &ArgMatches) -> Result<(), log::SetLoggerError> {
    let level = if matches.get_flag("debug") {
        log::LevelFilter::Debug
    } else if matches.get_flag("quiet") {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    pkgbump::init_logger(level)
}

fn make_syncer(matches: &ArgMatches) -> Result<Syncer> {
    validate_args(matches)?;

    let mut builder = SyncerBuilder::new();
    if let Some(p) = matches.get_one::<String>("project") {
        builder = builder.project(p);
    }
    if let Some(url) = matches.get_one::<String>("api-base-url") {
        builder = builder.api_base_url(url);
    }
    if let Some(packages) = matches.get_many::<String>("package") {
        for p in packages {
            builder = builder.package(p);
        }
    }
    if let Some(dir) = matches.get_one::<String>("dir") {
        builder = builder.root_dir(dir);
    }
    if let Some(m) = matches.get_one::<String>("asset-project") {
        builder = builder.asset_project(m);
    }
    if let Some(m) = matches.get_one::<String>("asset-platform") {
        builder = builder.asset_platform(m);
    }
    if let Some(f) = matches.get_one::<String>("output-file") {
        builder = builder.output_file(f);
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        builder = builder.timeout(Duration::from_secs(*secs));
    }
    if matches.get_flag("dry-run") {
        builder = builder.dry_run();
    }

    builder.build()
}

fn validate_args(matches: &ArgMatches) -> Result<()> {
    if let Some(dir) = matches.get_one::<String>("dir") {
        if !PathBuf::from(dir).is_dir() {
            return Err(PkgbumpError::InvalidArgsError(format!(
                "The --dir argument, `{dir}`, is not a directory"
            ))
            .into());
        }
    }

    if let Some(packages) = matches.get_many::<String>("package") {
        for p in packages {
            if p.is_empty() {
                return Err(PkgbumpError::InvalidArgsError(
                    "The --package argument cannot be empty".to_string(),
                )
                .into());
            }
        }
    }

    Ok(())
}

fn log_result(result: &UpdateResult) {
    for p in &result.packages {
        match &p.status {
            PackageStatus::Updated {
                from_version,
                from_build,
            } => debug!(
                "{}: updated from {from_version}-{from_build}",
                p.dir.display()
            ),
            PackageStatus::UpToDate => debug!("{}: up to date", p.dir.display()),
            PackageStatus::NotFound => debug!("{}: does not exist", p.dir.display()),
            PackageStatus::Skipped { reason } => debug!("{}: skipped, {reason}", p.dir.display()),
        }
    }
}

fn print_err(e: &Error) {
    error!("{e}");
    if let Some(pe) = e.downcast_ref::<PkgbumpError>() {
        match pe {
            PkgbumpError::InvalidArgsError(_) => {
                println!();
                cmd().print_help().unwrap();
            }
        }
    }
}
