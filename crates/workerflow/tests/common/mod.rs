use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use workerflow::RunOptions;
use workerflow_core::{ReleaseChannel, Worker};

pub struct TestRepo {
    pub root: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    /// Write `analyzers/<worker>/<file>`.
    pub fn write(&self, worker: &str, file: &str, content: &str) {
        let dir = self.root.path().join("analyzers").join(worker);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    /// Write a flavor descriptor `analyzers/<worker>/<name>.json`.
    pub fn add_flavor(&self, worker: &str, name: &str, version: &str, command: &str) {
        let descriptor = serde_json::json!({
            "name": name,
            "version": version,
            "description": format!("{} analyzer", name),
            "command": command,
        });
        self.write(worker, &format!("{}.json", name), &descriptor.to_string());
    }

    pub fn options(&self, workers: &[&str], stable: bool, force: bool) -> RunOptions {
        RunOptions {
            namespace: "acme".to_string(),
            base_path: self.path(),
            workers: workers
                .iter()
                .map(|w| Worker::from_path(Path::new("analyzers").join(w)).unwrap())
                .collect(),
            channel: ReleaseChannel::from_stable_flag(stable),
            force,
        }
    }

    #[allow(dead_code)]
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.root.path())
            .args(args)
            .env("GIT_AUTHOR_NAME", "ci")
            .env("GIT_AUTHOR_EMAIL", "ci@example.com")
            .env("GIT_COMMITTER_NAME", "ci")
            .env("GIT_COMMITTER_EMAIL", "ci@example.com")
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    #[allow(dead_code)]
    pub fn init_git(&self) {
        self.git(&["init", "-q"]);
        self.git(&["config", "commit.gpgsign", "false"]);
    }

    /// Commit everything and return the new HEAD.
    #[allow(dead_code)]
    pub fn commit_all(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }
}

#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
