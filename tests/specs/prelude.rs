//! Test helpers for black-box `gc` CLI specifications.
//!
//! Spawns the actual `gc` binary against a throwaway city directory backed
//! by real tmux sessions — no fake session backend is substituted, since
//! the CLI always constructs a [`gc_adapters::TmuxAdapter`] itself.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

pub const POLL_INTERVAL_MS: u64 = 20;
pub const WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn gc_binary() -> PathBuf {
    binary_path("gc")
}

/// A throwaway city directory. Each test gets a uniquely-named workspace so
/// concurrently-running tests never collide on a derived tmux session name.
pub struct City {
    dir: tempfile::TempDir,
    name: String,
}

impl City {
    /// A fresh city named after `label` plus a few random hex digits, so
    /// two tests using the same label still don't collide.
    pub fn new(label: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let name = format!("{label}-{}", unique_suffix());
        Self { dir, name }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write `city.toml` from a template; `{name}` is substituted with this
    /// city's unique workspace name.
    pub fn write_config(&self, template: &str) {
        let toml = template.replace("{name}", &self.name);
        std::fs::write(self.dir.path().join("city.toml"), toml).expect("write city.toml");
    }

    pub fn dot_dir(&self) -> PathBuf {
        self.dir.path().join(format!(".{}", self.name))
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dot_dir().join("daemon.pid")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dot_dir().join("controller.sock")
    }

    pub fn events_path(&self) -> PathBuf {
        self.dot_dir().join("events.jsonl")
    }

    pub fn cli(&self) -> CliBuilder {
        CliBuilder::new(self.dir.path().to_path_buf())
    }

    /// Start the controller as a detached background process, returning the
    /// child handle so the caller can kill it if a test fails partway.
    pub fn spawn_controller(&self) -> std::process::Child {
        Command::new(gc_binary())
            .arg("start")
            .current_dir(self.dir.path())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .expect("spawn gc start")
    }

    /// Start the controller and wait for it to announce itself (PID + socket
    /// both present).
    pub fn start_and_wait(&self) -> std::process::Child {
        let child = self.spawn_controller();
        wait_for(|| self.pid_path().exists() && self.socket_path().exists());
        child
    }
}

fn unique_suffix() -> String {
    let pid = std::process::id();
    let addr = &pid as *const u32 as usize;
    format!("{pid:x}{addr:x}")
}

/// Poll `condition` until it's true, panicking after [`WAIT_MAX_MS`].
pub fn wait_for(mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(WAIT_MAX_MS) {
        if condition() {
            return;
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
    panic!("timed out after {WAIT_MAX_MS}ms waiting for condition");
}

pub struct CliBuilder {
    args: Vec<String>,
    dir: PathBuf,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new(dir: PathBuf) -> Self {
        Self {
            args: Vec::new(),
            dir,
            envs: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = Command::new(gc_binary());
        cmd.args(&self.args).current_dir(&self.dir);
        cmd.env_remove("GC_SESSION");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn run(self) -> RunAssert {
        let output = self.command().output().expect("gc should run");
        RunAssert { output }
    }

    pub fn passes(self) -> RunAssert {
        let result = self.run();
        assert!(
            result.output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            result.output.status.code(),
            result.stdout(),
            result.stderr()
        );
        result
    }

    pub fn fails(self) -> RunAssert {
        let result = self.run();
        assert!(
            !result.output.status.success(),
            "expected failure, but it passed\nstdout: {}",
            result.stdout()
        );
        result
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        assert!(self.stdout().contains(expected), "stdout missing {expected:?}: {}", self.stdout());
        self
    }
}

/// Whether `tmux` is on PATH; tests that need a live session backend skip
/// gracefully rather than failing in an environment without it.
pub fn tmux_available() -> bool {
    Command::new("tmux")
        .arg("-V")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
