use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Client,
    Server,
}

impl Role {
    /// Accepts exactly `client` or `server`.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "client" => Ok(Role::Client),
            "server" => Ok(Role::Server),
            "" => Err(ProvisionError::Precondition(
                "role is not set (expected 'client' or 'server')".into(),
            )),
            other => Err(ProvisionError::Precondition(format!(
                "invalid role '{other}' (expected 'client' or 'server')"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BuildProfile {
    Release,
    Debug,
}

impl BuildProfile {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "release" => Ok(BuildProfile::Release),
            "debug" => Ok(BuildProfile::Debug),
            other => Err(ProvisionError::Config(format!(
                "BUILD_PROFILE must be 'release' or 'debug', got '{other}'"
            ))),
        }
    }

    /// Subdirectory of `target/` the compiler writes this profile to.
    pub fn output_dir(&self) -> &'static str {
        match self {
            BuildProfile::Release => "release",
            BuildProfile::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRefs {
    pub ssh_url: String,
    pub https_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertConfig {
    pub subject: String,
    pub validity_days: u32,
}

/// Values handed to the tunnel binaries untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub tcp_listen_port: Option<String>,
    pub resolver_address: Option<String>,
    pub domain: String,
    pub dns_listen_port: String,
    pub target_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DnsPolicy {
    pub disable_conflicting_resolver: bool,
    pub rewrite_resolver_config: bool,
    pub nameserver_ip: Option<String>,
    pub resolver_config_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForwardProxyPolicy {
    pub enabled: bool,
    pub port: u16,
    pub listen_address: String,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionConfig {
    pub role: Role,
    pub install_dir: PathBuf,
    pub source_refs: SourceRefs,
    pub build_profile: BuildProfile,
    pub cert_config: CertConfig,
    pub network_config: NetworkConfig,
    pub dns_policy: DnsPolicy,
    pub forward_proxy_policy: ForwardProxyPolicy,
    pub client_bin_name: String,
    pub server_bin_name: String,
    pub skip_dependencies: bool,
    pub cargo_home: PathBuf,
}

impl ProvisionConfig {
    /// Returns a copy pointing the tunnel target at `target_address`.
    pub fn with_target_address(&self, target_address: String) -> Self {
        let mut next = self.clone();
        next.network_config.target_address = target_address;
        next
    }

    pub fn cert_path(&self) -> PathBuf {
        self.install_dir.join("cert.pem")
    }

    pub fn key_path(&self) -> PathBuf {
        self.install_dir.join("key.pem")
    }

    pub fn build_output_root(&self) -> PathBuf {
        self.install_dir.join("target")
    }

    pub fn git_marker(&self) -> PathBuf {
        self.install_dir.join(".git")
    }
}
