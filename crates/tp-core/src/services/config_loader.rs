use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::models::{
    BuildProfile, CertConfig, DnsPolicy, ForwardProxyPolicy, NetworkConfig, ProvisionConfig,
    Role, SourceRefs,
};

pub const DEFAULT_INSTALL_DIR: &str = "/opt/tunnel";
pub const DEFAULT_SSH_URL: &str = "git@github.com:tunnelkit/tunnel.git";
pub const DEFAULT_HTTPS_URL: &str = "https://github.com/tunnelkit/tunnel.git";
pub const DEFAULT_CERT_SUBJECT: &str = "/CN=tunnel";
pub const DEFAULT_CERT_DAYS: u32 = 365;
pub const DEFAULT_DNS_LISTEN_PORT: &str = "5300";
pub const DEFAULT_TARGET_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_PROXY_PORT: u16 = 8888;
pub const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1";
pub const DEFAULT_PROXY_CONF: &str = "/etc/tinyproxy/tinyproxy.conf";
pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";
pub const DEFAULT_CLIENT_BIN: &str = "tunnel-client";
pub const DEFAULT_SERVER_BIN: &str = "tunnel-server";

/// Key/value overrides, keyed by environment variable name.
pub type Overrides = HashMap<String, String>;

/// Positional command-line arguments, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionalArgs {
    pub role: String,
    pub listen_port: Option<String>,
    pub resolver: Option<String>,
    pub domain: Option<String>,
    pub nameserver_ip: Option<String>,
}

/// Read a flat YAML map of overrides. Scalar values are stringified.
pub fn load_overrides_file(path: &Path) -> Result<Overrides> {
    if !path.exists() {
        return Err(ProvisionError::ConfigNotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path)?;
    let raw: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(&contents)?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                other => {
                    return Err(ProvisionError::Config(format!(
                        "{key} must be a scalar, got {other:?}"
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

/// Layer `upper` over `lower`.
pub fn merge(lower: Overrides, upper: Overrides) -> Overrides {
    let mut merged = lower;
    merged.extend(upper);
    merged
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn get(overrides: &Overrides, key: &str) -> Option<String> {
    non_empty(overrides.get(key))
}

fn get_or(overrides: &Overrides, key: &str, default: &str) -> String {
    get(overrides, key).unwrap_or_else(|| default.to_string())
}

pub fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProvisionError::Config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

fn get_bool(overrides: &Overrides, key: &str) -> Result<bool> {
    get(overrides, key).map_or(Ok(false), |raw| parse_bool(key, &raw))
}

fn get_number<T: std::str::FromStr>(overrides: &Overrides, key: &str, default: T) -> Result<T> {
    match get(overrides, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            ProvisionError::Config(format!("{key} must be a positive number, got '{raw}'"))
        }),
    }
}

fn require(value: Option<String>, what: &str, role: Role) -> Result<String> {
    value.ok_or_else(|| {
        ProvisionError::Precondition(format!("{what} is required for the {role} role"))
    })
}

fn cargo_home(overrides: &Overrides) -> PathBuf {
    if let Some(home) = get(overrides, "CARGO_HOME") {
        return PathBuf::from(home);
    }
    let home = get_or(overrides, "HOME", "/root");
    PathBuf::from(home).join(".cargo")
}

/// Build the run configuration for an already-validated `role`.
pub fn resolve(
    role: Role,
    args: &PositionalArgs,
    overrides: &Overrides,
) -> Result<ProvisionConfig> {
    let domain = require(non_empty(args.domain.as_ref()), "domain", role)?;
    let listen_port = non_empty(args.listen_port.as_ref());

    let (tcp_listen_port, resolver_address, dns_listen_port) = match role {
        Role::Client => (
            Some(require(listen_port, "tcp listen port", role)?),
            Some(require(non_empty(args.resolver.as_ref()), "resolver address", role)?),
            get_or(overrides, "DNS_LISTEN_PORT", DEFAULT_DNS_LISTEN_PORT),
        ),
        Role::Server => (
            None,
            non_empty(args.resolver.as_ref()),
            get(overrides, "DNS_LISTEN_PORT")
                .or(listen_port)
                .unwrap_or_else(|| DEFAULT_DNS_LISTEN_PORT.to_string()),
        ),
    };

    let build_profile = match get(overrides, "BUILD_PROFILE") {
        Some(raw) => BuildProfile::parse(&raw)?,
        None => BuildProfile::Release,
    };

    let validity_days: u32 = get_number(overrides, "CERT_DAYS", DEFAULT_CERT_DAYS)?;
    if validity_days == 0 {
        return Err(ProvisionError::Config("CERT_DAYS must be at least 1".into()));
    }

    let proxy_port: u16 = get_number(overrides, "FORWARD_PROXY_PORT", DEFAULT_PROXY_PORT)?;
    if proxy_port == 0 {
        return Err(ProvisionError::Config(
            "FORWARD_PROXY_PORT must be between 1 and 65535".into(),
        ));
    }

    Ok(ProvisionConfig {
        role,
        install_dir: PathBuf::from(get_or(overrides, "INSTALL_DIR", DEFAULT_INSTALL_DIR)),
        source_refs: SourceRefs {
            ssh_url: get_or(overrides, "REPO_SSH_URL", DEFAULT_SSH_URL),
            https_url: get_or(overrides, "REPO_HTTPS_URL", DEFAULT_HTTPS_URL),
        },
        build_profile,
        cert_config: CertConfig {
            subject: get_or(overrides, "CERT_SUBJECT", DEFAULT_CERT_SUBJECT),
            validity_days,
        },
        network_config: NetworkConfig {
            tcp_listen_port,
            resolver_address,
            domain,
            dns_listen_port,
            target_address: get_or(overrides, "PROXY_TARGET", DEFAULT_TARGET_ADDRESS),
        },
        dns_policy: DnsPolicy {
            disable_conflicting_resolver: get_bool(overrides, "DISABLE_RESOLVED")?,
            rewrite_resolver_config: get_bool(overrides, "REWRITE_RESOLV_CONF")?,
            nameserver_ip: non_empty(args.nameserver_ip.as_ref())
                .or_else(|| get(overrides, "RESOLVER_NAMESERVER")),
            resolver_config_path: PathBuf::from(get_or(
                overrides,
                "RESOLV_CONF_PATH",
                DEFAULT_RESOLV_CONF,
            )),
        },
        forward_proxy_policy: ForwardProxyPolicy {
            enabled: get_bool(overrides, "INSTALL_FORWARD_PROXY")?,
            port: proxy_port,
            listen_address: get_or(overrides, "FORWARD_PROXY_LISTEN", DEFAULT_PROXY_LISTEN),
            config_path: PathBuf::from(get_or(overrides, "FORWARD_PROXY_CONF", DEFAULT_PROXY_CONF)),
        },
        client_bin_name: get_or(overrides, "CLIENT_BIN_NAME", DEFAULT_CLIENT_BIN),
        server_bin_name: get_or(overrides, "SERVER_BIN_NAME", DEFAULT_SERVER_BIN),
        skip_dependencies: get_bool(overrides, "SKIP_DEPENDENCIES")?,
        cargo_home: cargo_home(overrides),
    })
}
