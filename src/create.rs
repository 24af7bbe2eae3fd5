//! Environment creation via the external interpreter.

use crate::model::BootstrapConfig;
use anyhow::{Context, Result};
use std::process::ExitStatus;
use tokio::process::Command;

/// Run `<python> -m venv <dir>` and return its exit status.
///
/// The child inherits stdout/stderr so the interpreter's own diagnostics
/// reach the operator untranslated. Exit-status interpretation is left to
/// the caller; a spawn failure (e.g. interpreter not installed) propagates
/// as an error.
pub async fn create_env(cfg: &BootstrapConfig) -> Result<ExitStatus> {
    let mut child = Command::new(&cfg.python)
        .arg("-m")
        .arg("venv")
        .arg(&cfg.venv_dir)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to launch {}", cfg.python))?;

    let status = tokio::time::timeout(cfg.create_timeout, child.wait())
        .await
        .with_context(|| {
            format!(
                "environment creation did not finish within {}",
                humantime::format_duration(cfg.create_timeout)
            )
        })?
        .context("failed to wait for environment creation")?;

    Ok(status)
}
