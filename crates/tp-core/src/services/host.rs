use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ProvisionError, Result};

/// A single invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl HostCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.working_directory = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined for diagnostics.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// The machine being provisioned.
#[async_trait]
pub trait Host: Send + Sync {
    /// Whether the process may mutate system state (root on unix).
    fn is_elevated(&self) -> bool;

    /// Resolve `name` against the search path.
    fn find_program(&self, name: &str) -> Option<PathBuf>;

    /// Run a command to completion. `Err` only when it could not be started.
    async fn run(&self, command: &HostCommand) -> Result<CommandOutput>;
}

/// Tool stderr folded onto one line so every error message stays a single line.
fn single_line(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Run `command` and turn a non-zero exit into the error built by `wrap`.
pub async fn run_checked<F>(host: &dyn Host, command: &HostCommand, wrap: F) -> Result<String>
where
    F: Fn(String) -> ProvisionError,
{
    tracing::debug!(command = %command.display(), "running");
    let output = host
        .run(command)
        .await
        .map_err(|e| wrap(format!("failed to run {}: {e}", command.program)))?;

    if !output.success() {
        return Err(wrap(format!(
            "{} failed (exit {}): {}",
            command.display(),
            output.code.unwrap_or(-1),
            single_line(&output.stderr)
        )));
    }
    Ok(output.stdout.trim().to_string())
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

/// [`Host`] backed by the local operating system.
#[derive(Debug, Default, Clone)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Host for SystemHost {
    fn is_elevated(&self) -> bool {
        is_root()
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    async fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.working_directory {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }
        let output = cmd.output().await.map_err(|e| {
            ProvisionError::Process(format!("failed to start {}: {e}", command.program))
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = HostCommand::new("git")
            .args(["pull", "--ff-only"])
            .current_dir(Path::new("/opt/tunnel"));
        assert_eq!(cmd.display(), "git pull --ff-only");
        assert_eq!(cmd.working_directory.as_deref(), Some(Path::new("/opt/tunnel")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_host_captures_exit_code() {
        let host = SystemHost::new();
        let ok = host.run(&HostCommand::new("true")).await.unwrap();
        assert!(ok.success());
        let failed = host.run(&HostCommand::new("false")).await.unwrap();
        assert!(!failed.success());
        assert_eq!(failed.code, Some(1));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_checked_wraps_failures() {
        let host = SystemHost::new();
        let err = run_checked(&host, &HostCommand::new("false"), ProvisionError::Build)
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Build(msg) if msg.contains("exit 1")));
    }

    #[test]
    fn multi_line_stderr_is_folded() {
        let folded = single_line("Cloning into '/x'...\n\nfatal: repository not found\n");
        assert_eq!(folded, "Cloning into '/x'... | fatal: repository not found");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_checked_error_is_one_line() {
        let host = SystemHost::new();
        let cmd = HostCommand::new("sh").args(["-c", "printf 'first\\nsecond\\n' >&2; exit 128"]);
        let err = run_checked(&host, &cmd, ProvisionError::Acquisition)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert_eq!(message.lines().count(), 1, "{message}");
        assert!(message.ends_with("(exit 128): first | second"), "{message}");
    }
}
