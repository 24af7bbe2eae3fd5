//! Activation marker detection.
//!
//! The marker file's presence is used as a proxy for "the environment
//! exists"; no deeper integrity check is performed.

use crate::model::EnvStatus;
use std::path::{Path, PathBuf};

/// Path of the activation script inside a venv directory.
pub fn activate_path(venv_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        venv_dir.join("Scripts").join("activate")
    } else {
        venv_dir.join("bin").join("activate")
    }
}

/// Check whether the activation marker exists for the given venv directory.
pub fn env_status(venv_dir: &Path) -> EnvStatus {
    let activate = activate_path(venv_dir);
    if activate.is_file() {
        EnvStatus::Ready { activate }
    } else {
        EnvStatus::Missing
    }
}
