use std::fmt::Write;

use crate::models::{LocatedArtifacts, ProvisionConfig, Role};

fn client_summary(config: &ProvisionConfig, artifacts: &LocatedArtifacts) -> String {
    let net = &config.network_config;
    let resolver = net.resolver_address.as_deref().unwrap_or("-");
    let listen = net.tcp_listen_port.as_deref().unwrap_or("-");
    let mut out = String::new();
    let _ = writeln!(out, "Client provisioned in {}", config.install_dir.display());
    let _ = writeln!(out, "  binary:      {}", artifacts.client_bin.display());
    let _ = writeln!(out, "  certificate: {}", config.cert_path().display());
    let _ = writeln!(out, "  resolver:    {resolver}");
    let _ = writeln!(out, "  domain:      {}", net.domain);
    let _ = writeln!(out, "  tcp listen:  127.0.0.1:{listen}");
    let _ = writeln!(out, "Start the tunnel client with:");
    let _ = write!(
        out,
        "  {} -resolver {resolver} -cert {} {} 127.0.0.1:{listen}",
        artifacts.client_bin.display(),
        config.cert_path().display(),
        net.domain
    );
    out
}

fn server_summary(config: &ProvisionConfig, artifacts: &LocatedArtifacts) -> String {
    let net = &config.network_config;
    let mut out = String::new();
    let _ = writeln!(out, "Server provisioned in {}", config.install_dir.display());
    let _ = writeln!(out, "  binary:      {}", artifacts.server_bin.display());
    let _ = writeln!(out, "  certificate: {}", config.cert_path().display());
    let _ = writeln!(out, "  key:         {}", config.key_path().display());
    let _ = writeln!(out, "  domain:      {}", net.domain);
    let _ = writeln!(out, "  dns listen:  :{}", net.dns_listen_port);
    let _ = writeln!(out, "  target:      {}", net.target_address);
    let _ = writeln!(out, "Start the tunnel server with:");
    let _ = write!(
        out,
        "  {} -udp :{} -cert {} -key {} {} {}",
        artifacts.server_bin.display(),
        net.dns_listen_port,
        config.cert_path().display(),
        config.key_path().display(),
        net.domain,
        net.target_address
    );
    out
}

/// Usage instructions for the provisioned role.
pub fn render(config: &ProvisionConfig, artifacts: &LocatedArtifacts) -> String {
    match config.role {
        Role::Client => client_summary(config, artifacts),
        Role::Server => server_summary(config, artifacts),
    }
}
