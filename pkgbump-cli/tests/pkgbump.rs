use anyhow::Result;
use mockito::{Mock, Server, ServerGuard};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};
use tempfile::TempDir;

const LATEST_PATH: &str = "/repos/intel/xpumanager/releases/latest";
const ASSET_NAME: &str = "xpumanager_1.3.5_20251216.170635.605ff78d.u24.04_amd64.deb";

const OLD_PKGBUILD: &str = r#"# Maintainer: Someone <someone@example.com>
pkgname=intel-xpumanager-bin
pkgver=1.3.4
_buildver=20250910.101010.0badc0de.u24.04
pkgrel=2
pkgdesc="Intel XPU Manager"
arch=('x86_64')
source=("https://github.com/intel/xpumanager/releases/download/V${pkgver}/xpumanager_${pkgver}_${_buildver}_amd64.deb")
sha256sums=('6f1ed002ab5595859014ebf0951522d9e4c8b9f8d3e4b9f8d3e4b9f8d3e4b9f8')
"#;

const NEW_PKGBUILD: &str = r#"# Maintainer: Someone <someone@example.com>
pkgname=intel-xpumanager-bin
pkgver=1.3.5
_buildver=20251216.170635.605ff78d.u24.04
pkgrel=1
pkgdesc="Intel XPU Manager"
arch=('x86_64')
source=("https://github.com/intel/xpumanager/releases/download/V${pkgver}/xpumanager_${pkgver}_${_buildver}_amd64.deb")
sha256sums=('SKIP')
"#;

fn release_body(asset_names: &[&str]) -> String {
    let assets = asset_names
        .iter()
        .map(|n| {
            serde_json::json!({
                "name": n,
                "browser_download_url": format!(
                    "https://github.com/intel/xpumanager/releases/download/V1.3.5/{n}"
                ),
            })
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "tag_name": "v1.3.5", "assets": assets }).to_string()
}

fn mock_latest(server: &mut ServerGuard, status: usize, body: String) -> Mock {
    mock_latest_hits(server, status, body, 1)
}

fn mock_latest_hits(server: &mut ServerGuard, status: usize, body: String, hits: usize) -> Mock {
    server
        .mock("GET", LATEST_PATH)
        .with_status(status)
        .with_body(body)
        .expect(hits)
        .create()
}

fn package_root(packages: &[(&str, &str)]) -> Result<TempDir> {
    let td = TempDir::new()?;
    for (name, content) in packages {
        let dir = td.path().join(name);
        fs::create_dir(&dir)?;
        fs::write(dir.join("PKGBUILD"), content)?;
    }
    Ok(td)
}

fn pkgbuild_path(td: &TempDir, package: &str) -> PathBuf {
    td.path().join(package).join("PKGBUILD")
}

struct Output {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn run_pkgbump(server: &ServerGuard, dir: &Path, args: &[&str]) -> Result<Output> {
    let mut c = process::Command::new(env!("CARGO_BIN_EXE_pkgbump"));
    c.arg("--api-base-url")
        .arg(server.url())
        .arg("--dir")
        .arg(dir)
        .args(args);
    c.env_remove("GITHUB_TOKEN");
    c.env_remove("GITHUB_OUTPUT");

    let output = c.output()?;
    let out = Output {
        code: output.status.code(),
        stdout: String::from_utf8(output.stdout)?,
        stderr: String::from_utf8(output.stderr)?,
    };
    if matches!(env::var("PKGBUMP_TESTS_DEBUG"), Ok(v) if !(v.is_empty() || v == "0")) {
        println!("stdout:\n{}\nstderr:\n{}", out.stdout, out.stderr);
    }
    Ok(out)
}

#[test]
fn updates_outdated_pkgbuild_and_writes_output_file() -> Result<()> {
    let mut server = Server::new();
    let m = mock_latest(
        &mut server,
        200,
        release_body(&[
            "xpumanager_1.3.5_20251216.170635.605ff78d.u22.04_amd64.deb",
            ASSET_NAME,
        ]),
    );
    let td = package_root(&[("intel-xpumanager-bin", OLD_PKGBUILD)])?;
    let output_file = td.path().join("github_output");

    let out = run_pkgbump(
        &server,
        td.path(),
        &["--output-file", &output_file.to_string_lossy()],
    )?;
    m.assert();

    assert_eq!(out.code, Some(0), "{}", out.stderr);
    assert_eq!(out.stdout, "");
    assert!(out
        .stderr
        .contains("Latest Version: 1.3.5, Build: 20251216.170635.605ff78d.u24.04"));
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpumanager-bin"))?,
        NEW_PKGBUILD
    );
    assert_eq!(
        fs::read_to_string(&output_file)?,
        "updated=true\nversion=1.3.5\n"
    );

    Ok(())
}

#[test]
fn second_run_is_a_no_op() -> Result<()> {
    let mut server = Server::new();
    let m = mock_latest_hits(&mut server, 200, release_body(&[ASSET_NAME]), 2);
    let td = package_root(&[
        ("intel-xpumanager-bin", OLD_PKGBUILD),
        ("intel-xpu-smi-bin", OLD_PKGBUILD),
    ])?;

    let first = run_pkgbump(&server, td.path(), &[])?;
    assert_eq!(first.code, Some(0), "{}", first.stderr);
    assert_eq!(first.stdout, "Updated packages to version 1.3.5.\n");

    let second = run_pkgbump(&server, td.path(), &[])?;
    assert_eq!(second.code, Some(0), "{}", second.stderr);
    assert_eq!(second.stdout, "All packages are up-to-date (1.3.5).\n");

    m.assert();
    for p in ["intel-xpumanager-bin", "intel-xpu-smi-bin"] {
        assert_eq!(fs::read_to_string(pkgbuild_path(&td, p))?, NEW_PKGBUILD);
    }

    Ok(())
}

#[test]
fn explicit_package_list() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(&mut server, 200, release_body(&[ASSET_NAME]));
    let td = package_root(&[
        ("intel-xpumanager-bin", OLD_PKGBUILD),
        ("some-other-bin", OLD_PKGBUILD),
    ])?;

    let out = run_pkgbump(
        &server,
        td.path(),
        &["--package", "some-other-bin", "--package", "not-here-bin"],
    )?;
    assert_eq!(out.code, Some(0), "{}", out.stderr);
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "some-other-bin"))?,
        NEW_PKGBUILD
    );
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpumanager-bin"))?,
        OLD_PKGBUILD
    );

    Ok(())
}

#[test]
fn dry_run_leaves_files_alone() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(&mut server, 200, release_body(&[ASSET_NAME]));
    let td = package_root(&[("intel-xpumanager-bin", OLD_PKGBUILD)])?;

    let out = run_pkgbump(&server, td.path(), &["--dry-run"])?;
    assert_eq!(out.code, Some(0), "{}", out.stderr);
    assert_eq!(out.stdout, "Updated packages to version 1.3.5.\n");
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpumanager-bin"))?,
        OLD_PKGBUILD
    );

    Ok(())
}

#[test]
fn malformed_pkgbuild_is_skipped() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(&mut server, 200, release_body(&[ASSET_NAME]));
    let td = package_root(&[
        ("intel-xpumanager-bin", "pkgname=intel-xpumanager-bin\n"),
        ("intel-xpu-smi-bin", OLD_PKGBUILD),
    ])?;

    let out = run_pkgbump(&server, td.path(), &[])?;
    assert_eq!(out.code, Some(0), "{}", out.stderr);
    assert!(out.stderr.contains("the current pkgver is missing or empty"));
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpu-smi-bin"))?,
        NEW_PKGBUILD
    );

    Ok(())
}

#[test]
fn unreadable_pkgbuild_does_not_stop_earlier_updates() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(&mut server, 200, release_body(&[ASSET_NAME]));
    let td = package_root(&[("intel-xpumanager-bin", OLD_PKGBUILD)])?;
    let smi = td.path().join("intel-xpu-smi-bin");
    fs::create_dir(&smi)?;
    fs::write(smi.join("PKGBUILD"), b"\xff\xfe")?;
    let output_file = td.path().join("github_output");

    let out = run_pkgbump(
        &server,
        td.path(),
        &["--output-file", &output_file.to_string_lossy()],
    )?;
    assert_eq!(out.code, Some(0), "{}", out.stderr);
    assert!(out.stderr.contains("it is not valid UTF-8"));
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpumanager-bin"))?,
        NEW_PKGBUILD
    );
    assert_eq!(
        fs::read_to_string(&output_file)?,
        "updated=true\nversion=1.3.5\n"
    );

    Ok(())
}

#[test]
fn fetch_failure_exits_non_zero() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(&mut server, 500, r#"{"message": "oops"}"#.to_string());
    let td = package_root(&[("intel-xpumanager-bin", OLD_PKGBUILD)])?;
    let output_file = td.path().join("github_output");

    let out = run_pkgbump(
        &server,
        td.path(),
        &["--output-file", &output_file.to_string_lossy()],
    )?;
    assert_eq!(out.code, Some(1));
    assert!(out.stderr.contains("could not fetch the latest release"));
    assert!(!output_file.exists());
    assert_eq!(
        fs::read_to_string(pkgbuild_path(&td, "intel-xpumanager-bin"))?,
        OLD_PKGBUILD
    );

    Ok(())
}

#[test]
fn no_matching_asset_exits_non_zero() -> Result<()> {
    let mut server = Server::new();
    let _m = mock_latest(
        &mut server,
        200,
        release_body(&["xpumanager_1.3.5_20251216.170635.605ff78d.el9_x86_64.rpm"]),
    );
    let td = package_root(&[("intel-xpumanager-bin", OLD_PKGBUILD)])?;

    let out = run_pkgbump(&server, td.path(), &[])?;
    assert_eq!(out.code, Some(1));
    assert!(out
        .stderr
        .contains("xpumanager_1.3.5_20251216.170635.605ff78d.el9_x86_64.rpm"));

    Ok(())
}

#[test]
fn bad_dir_is_an_argument_error() -> Result<()> {
    let server = Server::new();
    let td = TempDir::new()?;
    let missing = td.path().join("nope");

    let out = run_pkgbump(&server, &missing, &[])?;
    assert_eq!(out.code, Some(127));
    assert!(out.stdout.contains("Usage:"));

    Ok(())
}

#[test]
fn api_base_url_that_cannot_take_a_path_is_an_argument_error() -> Result<()> {
    let td = TempDir::new()?;
    let output = process::Command::new(env!("CARGO_BIN_EXE_pkgbump"))
        .arg("--api-base-url")
        .arg("mailto:x@example.com")
        .arg("--dir")
        .arg(td.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_OUTPUT")
        .output()?;

    assert_eq!(output.status.code(), Some(127));
    assert!(String::from_utf8(output.stderr)?.contains("cannot have a path appended"));

    Ok(())
}
