use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated project directory with fake interpreter fixtures.
pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join("project");
        fs::create_dir_all(&root).expect("create project root");
        Self { _tmp: tmp, root }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("venv-bootstrap").unwrap();
        cmd.current_dir(&self.root);
        cmd
    }

    /// Write an executable stand-in for `python -m venv <dir>`. The ok
    /// variant creates the venv layout with an activation script; the
    /// failing variant exits 1. Both append to create.log so tests can
    /// count invocations.
    pub fn write_fake_python(&self, ok: bool) -> PathBuf {
        let body = if ok {
            concat!(
                "#!/bin/sh\n",
                "echo invoked >> create.log\n",
                "mkdir -p \"$3/bin\"\n",
                "echo '# activation script' > \"$3/bin/activate\"\n",
                "exit 0\n",
            )
        } else {
            concat!(
                "#!/bin/sh\n",
                "echo invoked >> create.log\n",
                "exit 1\n",
            )
        };
        let path = self.root.join(if ok { "fake-python" } else { "broken-python" });
        fs::write(&path, body).expect("write fake interpreter");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("mark fake interpreter executable");
        path
    }

    /// Pre-create the activation marker, as if a prior run succeeded.
    pub fn seed_env(&self) {
        let bin = self.root.join("venv").join("bin");
        fs::create_dir_all(&bin).expect("create venv bin dir");
        fs::write(bin.join("activate"), "# activation script\n").expect("write marker");
    }

    pub fn marker(&self) -> PathBuf {
        self.root.join("venv").join("bin").join("activate")
    }

    /// Number of times the fake interpreter was invoked.
    pub fn create_count(&self) -> usize {
        fs::read_to_string(self.root.join("create.log"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}
