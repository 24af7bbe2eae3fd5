use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub python: String,
    pub venv_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub create_timeout: Duration,
    #[serde(default)]
    pub shell: Option<String>,
    pub no_input: bool,
}

/// Whether the environment's activation marker is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvStatus {
    Ready { activate: PathBuf },
    Missing,
}

/// A single session environment mutation performed by activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvMutation {
    Set { key: String, value: String },
    Unset { key: String },
}

/// Structured status events emitted while ensuring the environment,
/// rendered to console lines by the CLI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepEvent {
    Creating { python: String, venv_dir: PathBuf },
    CreateFailed { exit_code: Option<i32> },
    Created { venv_dir: PathBuf },
    Activated { activate: PathBuf },
}

impl StepEvent {
    /// Render a human-readable message for console output.
    pub fn to_message(&self) -> String {
        match self {
            StepEvent::Creating { python, venv_dir } => {
                format!(
                    "Virtual environment not found, creating with {} at {}...",
                    python,
                    venv_dir.display()
                )
            }
            StepEvent::CreateFailed { exit_code } => match exit_code {
                Some(code) => format!("Failed to create virtual environment (exit code {})", code),
                None => "Failed to create virtual environment (terminated by signal)".to_string(),
            },
            StepEvent::Created { venv_dir } => {
                format!("Virtual environment created at {}", venv_dir.display())
            }
            StepEvent::Activated { activate } => {
                format!(
                    "Virtual environment activated successfully ({})",
                    activate.display()
                )
            }
        }
    }
}

/// Serializable outcome of a bootstrap run, printed in `--json` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapReport {
    #[serde(default)]
    pub timestamp_utc: String,
    pub python: String,
    pub venv_dir: PathBuf,
    pub activate: PathBuf,
    /// True when this run invoked the creation command.
    pub created: bool,
    /// Environment mutations that make the session activated.
    pub env: Vec<EnvMutation>,
}

impl BootstrapReport {
    pub fn new(cfg: &BootstrapConfig, activate: &Path, created: bool) -> Self {
        let timestamp_utc = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            timestamp_utc,
            python: cfg.python.clone(),
            venv_dir: cfg.venv_dir.clone(),
            activate: activate.to_path_buf(),
            created,
            env: crate::activate::activation_env(&cfg.venv_dir),
        }
    }
}
