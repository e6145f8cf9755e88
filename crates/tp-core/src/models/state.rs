use std::fmt;

use serde::{Deserialize, Serialize};

/// States of a provisioning run, in the order they are reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ProvisionState {
    Start,
    Guarded,
    DepsInstalled,
    ToolchainReady,
    SourceReady,
    Built,
    CertReady,
    ProxyReady,
    DnsConfigured,
    ArtifactsLocated,
    Reported,
}

impl ProvisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionState::Start => "start",
            ProvisionState::Guarded => "guarded",
            ProvisionState::DepsInstalled => "deps-installed",
            ProvisionState::ToolchainReady => "toolchain-ready",
            ProvisionState::SourceReady => "source-ready",
            ProvisionState::Built => "built",
            ProvisionState::CertReady => "cert-ready",
            ProvisionState::ProxyReady => "proxy-ready",
            ProvisionState::DnsConfigured => "dns-configured",
            ProvisionState::ArtifactsLocated => "artifacts-located",
            ProvisionState::Reported => "reported",
        }
    }
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
