//! Installation and version checks for the `claude` binary.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use semver::Version;
use serde::Serialize;
use tokio::process::Command;
use tracing::debug;

use crate::{
    commands::{command::ClaudeCommandRequest, print::DEFAULT_BINARY},
    process, ClaudeCodeError,
};

/// Upper bound for `claude --version`.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of [`validate_cli`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CliStatus {
    pub path: PathBuf,
    pub raw_version: String,
    pub version: Option<Version>,
}

/// Host and CLI snapshot, mostly for bug reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
    pub crate_version: &'static str,
    pub cli_path: Option<PathBuf>,
    pub cli_version: Option<String>,
}

/// True when `claude` resolves on `PATH`.
pub fn check_cli_installed() -> bool {
    find_cli(Path::new(DEFAULT_BINARY)).is_ok()
}

/// Resolves `binary` the way a shell would. Paths with a directory component
/// are checked directly.
pub fn find_cli(binary: &Path) -> Result<PathBuf, ClaudeCodeError> {
    which::which(binary).map_err(|err| ClaudeCodeError::NotFound {
        binary: binary.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Pulls the first semver-looking token out of `--version` output such as
/// `1.0.17 (Claude Code)`.
pub fn parse_version(raw: &str) -> Option<Version> {
    raw.split_whitespace().find_map(|token| {
        let candidate = token
            .trim_matches(|c: char| matches!(c, '(' | ')' | ',' | ';'))
            .trim_start_matches('v');
        Version::parse(candidate).ok()
    })
}

/// Runs `<binary> --version` and returns its trimmed stdout.
pub async fn version_output(binary: &Path) -> Result<String, ClaudeCodeError> {
    let request = ClaudeCommandRequest::version().timeout(VERSION_PROBE_TIMEOUT);
    let mut command = Command::new(binary);
    command.args(request.argv());

    let output = process::run_command(command, binary, request.timeout, false, false).await?;
    if !output.status.success() {
        return Err(ClaudeCodeError::Execution {
            exit_code: output.exit_code(),
            stdout: output.stdout_text(),
            stderr: output.stderr_text(),
        });
    }
    Ok(output.stdout_text().trim().to_string())
}

/// Parsed `--version`. Output without a semver token is reported as
/// [`ClaudeCodeError::NotFound`].
pub async fn cli_version(binary: &Path) -> Result<Version, ClaudeCodeError> {
    let raw = version_output(binary).await?;
    parse_version(&raw).ok_or_else(|| ClaudeCodeError::NotFound {
        binary: binary.to_path_buf(),
        reason: format!("unrecognized version output `{raw}`"),
    })
}

/// Locates `binary` and confirms it answers `--version`.
pub async fn validate_cli(binary: &Path) -> Result<CliStatus, ClaudeCodeError> {
    let path = find_cli(binary)?;
    let raw_version = version_output(&path)
        .await
        .map_err(|err| ClaudeCodeError::NotFound {
            binary: path.clone(),
            reason: err.to_string(),
        })?;
    let version = parse_version(&raw_version);
    debug!(path = ?path, version = %raw_version, "claude cli validated");
    Ok(CliStatus {
        path,
        raw_version,
        version,
    })
}

pub async fn system_info(binary: &Path) -> SystemInfo {
    let status = validate_cli(binary).await.ok();
    SystemInfo {
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        family: std::env::consts::FAMILY,
        crate_version: env!("CARGO_PKG_VERSION"),
        cli_path: status.as_ref().map(|s| s.path.clone()),
        cli_version: status.map(|s| s.raw_version),
    }
}
