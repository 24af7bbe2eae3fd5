//! Session activation.
//!
//! A child process cannot mutate its parent shell, so activation takes one
//! of three shapes: an eval-able source line, the raw environment mutations
//! (for the JSON report), or a spawned subshell with those mutations applied.

use crate::model::{BootstrapConfig, EnvMutation};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

/// Environment mutations equivalent to sourcing the activation script:
/// set VIRTUAL_ENV, prepend the venv bin dir to PATH, unset PYTHONHOME.
///
/// The venv dir is canonicalized so the session carries an absolute
/// VIRTUAL_ENV that survives a cd; a path that does not exist yet is
/// carried as given.
pub fn activation_env(venv_dir: &Path) -> Vec<EnvMutation> {
    let venv_dir = venv_dir
        .canonicalize()
        .unwrap_or_else(|_| venv_dir.to_path_buf());
    let bin_dir = if cfg!(windows) {
        venv_dir.join("Scripts")
    } else {
        venv_dir.join("bin")
    };

    let current_path = std::env::var("PATH").unwrap_or_default();
    let sep = if cfg!(windows) { ';' } else { ':' };
    let new_path = format!("{}{}{}", bin_dir.display(), sep, current_path);

    vec![
        EnvMutation::Set {
            key: "VIRTUAL_ENV".to_string(),
            value: venv_dir.display().to_string(),
        },
        EnvMutation::Set {
            key: "PATH".to_string(),
            value: new_path,
        },
        EnvMutation::Unset {
            key: "PYTHONHOME".to_string(),
        },
    ]
}

/// POSIX source line for `eval "$(venv-bootstrap --eval)"`.
pub fn source_line(activate: &Path) -> String {
    format!(". {}", activate.display())
}

/// Shell to spawn in default mode: explicit override, then $SHELL, then sh.
fn resolve_shell(cfg: &BootstrapConfig) -> String {
    cfg.shell
        .clone()
        .or_else(|| std::env::var("SHELL").ok())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

/// Spawn a subshell with the activation environment applied and return its
/// exit code once it terminates.
pub async fn spawn_activated_shell(cfg: &BootstrapConfig) -> Result<i32> {
    let shell = resolve_shell(cfg);
    let mut cmd = Command::new(&shell);
    for mutation in activation_env(&cfg.venv_dir) {
        match mutation {
            EnvMutation::Set { key, value } => {
                cmd.env(key, value);
            }
            EnvMutation::Unset { key } => {
                cmd.env_remove(key);
            }
        }
    }

    let status = cmd
        .status()
        .await
        .with_context(|| format!("failed to launch shell {}", shell))?;

    Ok(status.code().unwrap_or(1))
}
