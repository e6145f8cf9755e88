use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tp_core::services::config_loader::{self, Overrides, PositionalArgs};
use tp_core::services::host::SystemHost;
use tp_core::services::provisioner::provision;

/// Provision this host as a DNS tunnel client or server.
///
/// Every setting not given positionally can be overridden through an
/// environment variable of the same name as in the `--config` file
/// (INSTALL_DIR, REPO_SSH_URL, BUILD_PROFILE, INSTALL_FORWARD_PROXY, ...).
#[derive(Parser, Debug)]
#[command(name = "tunnel-provision")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// `client` or `server`
    role: Option<String>,

    /// TCP listen port (client) or DNS listen port (server)
    listen_port: Option<String>,

    /// Upstream resolver the client sends queries through
    resolver: Option<String>,

    /// Tunnel domain
    domain: Option<String>,

    /// Nameserver written to the resolver config when REWRITE_RESOLV_CONF is on
    nameserver_ip: Option<String>,

    /// YAML file of overrides, layered under the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full report as JSON instead of the usage summary
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn positional(&self) -> PositionalArgs {
        PositionalArgs {
            role: self.role.clone().unwrap_or_default(),
            listen_port: self.listen_port.clone(),
            resolver: self.resolver.clone(),
            domain: self.domain.clone(),
            nameserver_ip: self.nameserver_ip.clone(),
        }
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Returns the guard that must be held alive while logging to a file.
fn setup_logging(
    debug: bool,
    log_file: Option<&Path>,
) -> color_eyre::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter(debug))
            .with_target(debug)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| color_eyre::eyre::eyre!("--log-file must name a file"))?;
    std::fs::create_dir_all(directory)?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter(debug))
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn collect_overrides(config: Option<&Path>) -> color_eyre::Result<Overrides> {
    let env: Overrides = std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    match config {
        Some(path) => Ok(config_loader::merge(
            config_loader::load_overrides_file(path)?,
            env,
        )),
        None => Ok(env),
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = setup_logging(cli.debug, cli.log_file.as_deref())?;

    let overrides = collect_overrides(cli.config.as_deref())?;
    let host = SystemHost::new();

    match provision(&host, &cli.positional(), &overrides).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.summary);
            }
            Ok(())
        }
        Err(aborted) => {
            eprintln!("error: {aborted}");
            drop(_guard);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_positionals() {
        let cli = Cli::try_parse_from([
            "tunnel-provision",
            "client",
            "7000",
            "1.1.1.1:53",
            "t.example.com",
            "10.0.0.2",
        ])
        .unwrap();
        let args = cli.positional();
        assert_eq!(args.role, "client");
        assert_eq!(args.listen_port.as_deref(), Some("7000"));
        assert_eq!(args.resolver.as_deref(), Some("1.1.1.1:53"));
        assert_eq!(args.domain.as_deref(), Some("t.example.com"));
        assert_eq!(args.nameserver_ip.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn missing_role_becomes_empty_string() {
        let cli = Cli::try_parse_from(["tunnel-provision"]).unwrap();
        assert_eq!(cli.positional().role, "");
    }

    #[test]
    fn flags_mix_with_positionals() {
        let cli = Cli::try_parse_from([
            "tunnel-provision",
            "--json",
            "server",
            "5300",
            "--config",
            "provision.yaml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, Some(PathBuf::from("provision.yaml")));
        assert_eq!(cli.positional().role, "server");
        assert_eq!(cli.positional().listen_port.as_deref(), Some("5300"));
        assert!(cli.positional().domain.is_none());
    }

    #[test]
    fn config_file_is_layered_under_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provision.yaml");
        std::fs::write(&path, "PATH: from-file\nTP_CLI_TEST_ONLY_KEY: from-file\n").unwrap();
        let overrides = collect_overrides(Some(&path)).unwrap();
        assert_eq!(
            overrides.get("PATH").map(String::as_str),
            std::env::var("PATH").ok().as_deref()
        );
        assert_ne!(overrides.get("PATH").map(String::as_str), Some("from-file"));
        assert_eq!(
            overrides.get("TP_CLI_TEST_ONLY_KEY").map(String::as_str),
            Some("from-file")
        );
    }
}
