use crate::model::{BootstrapConfig, BootstrapReport, EnvStatus, StepEvent};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
///
/// Locks are taken per line, never for the task's lifetime: the failure
/// path writes to stderr directly while this task is still alive, and a
/// held lock would block that write forever.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(std::io::stdout().lock(), "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(std::io::stderr().lock(), "{}", msg);
                }
            }
        }
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "venv-bootstrap",
    version,
    about = "Ensure a Python virtual environment exists, then activate it"
)]
pub struct Cli {
    /// Interpreter used to create the environment
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Virtual environment directory
    #[arg(long, default_value = "venv")]
    pub venv_dir: PathBuf,

    /// Print a source line for the activation script and exit (no subshell).
    /// Intended for `eval "$(venv-bootstrap --eval)"`
    #[arg(long)]
    pub eval: bool,

    /// Print a JSON bootstrap report and exit (no subshell)
    #[arg(long, conflicts_with = "eval")]
    pub json: bool,

    /// Do not wait for operator acknowledgment on failure (for CI)
    #[arg(long)]
    pub no_input: bool,

    /// Time limit for the environment-creation command
    #[arg(long, default_value = "120s")]
    pub create_timeout: humantime::Duration,

    /// Shell to spawn once activated (defaults to $SHELL, then /bin/sh)
    #[arg(long)]
    pub shell: Option<String>,
}

/// Build a `BootstrapConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> BootstrapConfig {
    BootstrapConfig {
        python: args.python.clone(),
        venv_dir: args.venv_dir.clone(),
        create_timeout: Duration::from(args.create_timeout),
        shell: args.shell.clone(),
        no_input: args.no_input,
    }
}

/// Result of the ensure step: either a usable marker or the one recognized
/// failure, a non-zero exit from the creation command.
enum EnsureOutcome {
    Ready { activate: PathBuf, created: bool },
    CreateFailed { exit_code: Option<i32> },
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let (out_tx, out_handle) = spawn_output_writer();

    let (activate, created) = match ensure_env(&cfg, &out_tx).await? {
        EnsureOutcome::Ready { activate, created } => (activate, created),
        EnsureOutcome::CreateFailed { exit_code } => {
            let _ = out_tx.send(OutputLine::Stderr(
                StepEvent::CreateFailed { exit_code }.to_message(),
            ));
            // Drain the writer so the failure notice is on screen before
            // the prompt blocks.
            drop(out_tx);
            let _ = out_handle.await;
            acknowledge(&cfg).await;
            std::process::exit(1);
        }
    };

    if args.json {
        let report = BootstrapReport::new(&cfg, &activate, created);
        let _ = out_tx.send(OutputLine::Stderr(
            StepEvent::Activated {
                activate: activate.clone(),
            }
            .to_message(),
        ));
        let out = serde_json::to_string_pretty(&report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
        drop(out_tx);
        let _ = out_handle.await;
        return Ok(());
    }

    if args.eval {
        let _ = out_tx.send(OutputLine::Stdout(crate::activate::source_line(&activate)));
        let _ = out_tx.send(OutputLine::Stderr(
            StepEvent::Activated { activate }.to_message(),
        ));
        drop(out_tx);
        let _ = out_handle.await;
        return Ok(());
    }

    // Default mode: hand the operator an activated subshell and forward its
    // exit code when it terminates.
    let _ = out_tx.send(OutputLine::Stderr(
        StepEvent::Activated { activate }.to_message(),
    ));
    drop(out_tx);
    let _ = out_handle.await;

    let code = crate::activate::spawn_activated_shell(&cfg).await?;
    std::process::exit(code);
}

/// Ensure the activation marker exists, creating the environment if needed.
///
/// A non-zero creation exit status is reported as an outcome rather than an
/// error so the caller can print the notice, wait for acknowledgment, and
/// terminate with exit status 1. Everything else propagates as an error.
async fn ensure_env(
    cfg: &BootstrapConfig,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<EnsureOutcome> {
    if let EnvStatus::Ready { activate } = crate::probe::env_status(&cfg.venv_dir) {
        return Ok(EnsureOutcome::Ready {
            activate,
            created: false,
        });
    }

    let _ = out_tx.send(OutputLine::Stderr(
        StepEvent::Creating {
            python: cfg.python.clone(),
            venv_dir: cfg.venv_dir.clone(),
        }
        .to_message(),
    ));

    let status = crate::create::create_env(cfg)
        .await
        .context("environment creation failed to run")?;

    if !status.success() {
        return Ok(EnsureOutcome::CreateFailed {
            exit_code: status.code(),
        });
    }

    match crate::probe::env_status(&cfg.venv_dir) {
        EnvStatus::Ready { activate } => {
            let _ = out_tx.send(OutputLine::Stderr(
                StepEvent::Created {
                    venv_dir: cfg.venv_dir.clone(),
                }
                .to_message(),
            ));
            Ok(EnsureOutcome::Ready {
                activate,
                created: true,
            })
        }
        EnvStatus::Missing => bail!(
            "creation reported success but no activation script at {}",
            crate::probe::activate_path(&cfg.venv_dir).display()
        ),
    }
}

/// Block until the operator presses Enter (EOF also releases), unless
/// `--no-input` was given.
async fn acknowledge(cfg: &BootstrapConfig) {
    if cfg.no_input {
        return;
    }
    eprintln!("Press Enter to continue...");
    let mut line = String::new();
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let _ = stdin.read_line(&mut line).await;
}
