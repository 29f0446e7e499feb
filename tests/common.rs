use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// Not every test binary uses every helper.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub config_path: PathBuf,
    pub cache_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.json");
        let cache_dir = temp_dir.path().join("toolcache");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_jdkup"));

        Self {
            _temp_dir: temp_dir,
            config_path,
            cache_dir,
            bin_path,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env("JDKUP_CONFIG_PATH", &self.config_path);
        cmd.env("JDKUP_CACHE_DIR", &self.cache_dir);
        cmd.env("HOME", self._temp_dir.path());
        cmd.env("XDG_DATA_HOME", self._temp_dir.path().join("data"));
        cmd.env("XDG_CONFIG_HOME", self._temp_dir.path().join("config"));
        // Keep runner files and log filters of the outer environment out
        for var in [
            "GITHUB_ENV",
            "GITHUB_PATH",
            "GITHUB_OUTPUT",
            "RUNNER_TOOL_CACHE",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Writes a complete cache entry holding a fake `bin/java`.
    pub fn seed_cache(&self, tool_name: &str, version: &str, arch: &str) -> PathBuf {
        let entry = self.cache_dir.join(tool_name).join(version).join(arch);
        fs::create_dir_all(entry.join("bin")).expect("Failed to create cache entry");
        fs::write(entry.join("bin").join("java"), "#!/bin/sh\n").expect("Failed to write java");
        fs::write(
            marker(&self.cache_dir, tool_name, version, arch),
            "2024-01-01T00:00:00Z",
        )
        .expect("Failed to write marker");
        entry
    }

    pub fn host_arch() -> &'static str {
        match std::env::consts::ARCH {
            "x86_64" => "x64",
            other => other,
        }
    }
}

pub fn marker(cache_dir: &Path, tool_name: &str, version: &str, arch: &str) -> PathBuf {
    cache_dir
        .join(tool_name)
        .join(version)
        .join(format!("{}.complete", arch))
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        if self.status.success() {
            panic!(
                "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
                self.stdout, self.stderr
            );
        }
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
