// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use tp_core::services::config_loader::{Overrides, PositionalArgs};
use tp_core::services::host::{CommandOutput, Host, HostCommand};
use tp_core::Result;

/// Records every command and imitates the side effects of the real tools.
pub struct FakeHost {
    pub elevated: bool,
    pub cargo_on_path: bool,
    /// Commands whose display contains one of these fail with exit 1.
    pub failing: Vec<String>,
    /// Binaries `cargo build` leaves behind.
    pub built_binaries: Vec<String>,
    /// Build output lands under `target/<triple>/<profile>` instead.
    pub target_triple: Option<String>,
    /// Stderr of a failing command; defaults to a line naming the command.
    pub failure_stderr: Option<String>,
    /// Path whose existence is recorded as each command runs.
    pub watched: Option<PathBuf>,
    pub commands: Mutex<Vec<HostCommand>>,
    pub watched_states: Mutex<Vec<(String, bool)>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            elevated: true,
            cargo_on_path: true,
            failing: Vec::new(),
            built_binaries: vec!["tunnel-client".into(), "tunnel-server".into()],
            target_triple: None,
            failure_stderr: None,
            watched: None,
            commands: Mutex::new(Vec::new()),
            watched_states: Mutex::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    pub fn with_failure_stderr(mut self, stderr: &str) -> Self {
        self.failure_stderr = Some(stderr.to_string());
        self
    }

    pub fn watching(mut self, path: &Path) -> Self {
        self.watched = Some(path.to_path_buf());
        self
    }

    /// Whether the watched path existed when the first command containing
    /// `fragment` ran.
    pub fn watched_during(&self, fragment: &str) -> Option<bool> {
        self.watched_states
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| c.contains(fragment))
            .map(|(_, existed)| *existed)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(HostCommand::display)
            .collect()
    }

    pub fn ran(&self, fragment: &str) -> bool {
        self.commands().iter().any(|c| c.contains(fragment))
    }

    fn value_after(args: &[String], flag: &str) -> Option<PathBuf> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
    }

    fn apply_side_effects(&self, command: &HostCommand) {
        let args = &command.args;
        match command.program.as_str() {
            "git" if args.first().map(String::as_str) == Some("clone") => {
                if let Some(target) = args.get(2) {
                    std::fs::create_dir_all(Path::new(target).join(".git")).unwrap();
                }
            }
            "openssl" => {
                let key = Self::value_after(args, "-keyout").unwrap();
                let cert = Self::value_after(args, "-out").unwrap();
                std::fs::write(key, "fake key\n").unwrap();
                std::fs::write(cert, "fake cert\n").unwrap();
            }
            "sh" => {
                let cargo_home = command
                    .env
                    .iter()
                    .find(|(k, _)| k == "CARGO_HOME")
                    .map(|(_, v)| PathBuf::from(v))
                    .unwrap();
                write_executable(&cargo_home.join("bin").join("cargo"));
            }
            program
                if program.ends_with("cargo")
                    && args.first().map(String::as_str) == Some("build") =>
            {
                let profile = if args.iter().any(|a| a == "--release") {
                    "release"
                } else {
                    "debug"
                };
                let mut out = command
                    .working_directory
                    .clone()
                    .unwrap()
                    .join("target");
                if let Some(triple) = &self.target_triple {
                    out = out.join(triple);
                }
                let out = out.join(profile);
                for bin in &self.built_binaries {
                    write_executable(&out.join(bin));
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Host for FakeHost {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        (name == "cargo" && self.cargo_on_path).then(|| PathBuf::from("/usr/bin/cargo"))
    }

    async fn run(&self, command: &HostCommand) -> Result<CommandOutput> {
        self.commands.lock().unwrap().push(command.clone());
        let display = command.display();
        if let Some(path) = &self.watched {
            self.watched_states
                .lock()
                .unwrap()
                .push((display.clone(), path.exists()));
        }
        if self.failing.iter().any(|f| display.contains(f.as_str())) {
            return Ok(CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: self
                    .failure_stderr
                    .clone()
                    .unwrap_or_else(|| format!("simulated failure: {display}")),
            });
        }
        self.apply_side_effects(command);
        Ok(CommandOutput {
            code: Some(0),
            ..Default::default()
        })
    }
}

pub fn write_executable(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn server_args() -> PositionalArgs {
    PositionalArgs {
        role: "server".into(),
        listen_port: Some("5300".into()),
        resolver: None,
        domain: Some("t.example.com".into()),
        nameserver_ip: None,
    }
}

pub fn client_args() -> PositionalArgs {
    PositionalArgs {
        role: "client".into(),
        listen_port: Some("7000".into()),
        resolver: Some("1.1.1.1:53".into()),
        domain: Some("t.example.com".into()),
        nameserver_ip: None,
    }
}

/// Overrides that keep every path inside `root`.
pub fn overrides(root: &Path, extra: &[(&str, &str)]) -> Overrides {
    let mut map = Overrides::new();
    map.insert("INSTALL_DIR".into(), root.join("tunnel").display().to_string());
    map.insert("RESOLV_CONF_PATH".into(), root.join("resolv.conf").display().to_string());
    map.insert("FORWARD_PROXY_CONF".into(), root.join("tinyproxy.conf").display().to_string());
    map.insert("HOME".into(), root.display().to_string());
    map.insert("REPO_SSH_URL".into(), "git@example.org:tunnel.git".into());
    map.insert("REPO_HTTPS_URL".into(), "https://example.org/tunnel.git".into());
    map.insert("PROXY_TARGET".into(), "127.0.0.1:22".into());
    for (k, v) in extra {
        map.insert(k.to_string(), v.to_string());
    }
    map
}

pub fn install_dir(root: &Path) -> PathBuf {
    root.join("tunnel")
}
