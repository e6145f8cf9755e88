use std::path::Path;

use regex::{NoExpand, Regex};

use crate::error::{ProvisionError, Result};
use crate::models::{ForwardProxyPolicy, ProvisionConfig, Role, StepOutcome};
use crate::services::host::Host;
use crate::services::{packages, systemd};

pub const PROXY_PACKAGE: &str = "tinyproxy";
pub const PROXY_UNIT: &str = "tinyproxy";

/// What the proxy step hands back to the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOutput {
    pub target_address: String,
}

pub fn local_target(policy: &ForwardProxyPolicy) -> String {
    format!("127.0.0.1:{}", policy.port)
}

fn directive_pattern(prefix: &str, directive: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?m)^[ \t]*{prefix}{directive}[ \t]+.*$"))
        .map_err(|e| ProvisionError::Proxy(format!("bad directive pattern: {e}")))
}

/// Replace (or append) a `Directive value` line. An active directive is
/// replaced in preference to a commented-out one, which is activated only
/// when no active line exists.
fn set_directive(contents: &str, directive: &str, value: &str) -> Result<String> {
    let line = format!("{directive} {value}");

    for pattern in [
        directive_pattern("", directive)?,
        directive_pattern(r"#[ \t]*", directive)?,
    ] {
        if pattern.is_match(contents) {
            return Ok(pattern.replace(contents, NoExpand(&line)).into_owned());
        }
    }

    let mut updated = contents.to_string();
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(&line);
    updated.push('\n');
    Ok(updated)
}

pub fn rewrite_config(contents: &str, policy: &ForwardProxyPolicy) -> Result<String> {
    let with_port = set_directive(contents, "Port", &policy.port.to_string())?;
    set_directive(&with_port, "Listen", &policy.listen_address)
}

async fn edit_config_file(path: &Path, policy: &ForwardProxyPolicy) -> Result<()> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ProvisionError::Proxy(format!("reading {}: {e}", path.display())))?;
    let updated = rewrite_config(&contents, policy)?;
    tokio::fs::write(path, updated)
        .await
        .map_err(|e| ProvisionError::Proxy(format!("writing {}: {e}", path.display())))?;
    Ok(())
}

/// Install and configure the local forward proxy on a server.
///
/// Returns `None` for the output when the step does not apply.
pub async fn install(
    host: &dyn Host,
    config: &ProvisionConfig,
) -> Result<(Option<ProxyOutput>, StepOutcome)> {
    let policy = &config.forward_proxy_policy;
    if config.role != Role::Server {
        return Ok((None, StepOutcome::skipped("forward proxy is server-only")));
    }
    if !policy.enabled {
        return Ok((None, StepOutcome::skipped("INSTALL_FORWARD_PROXY is off")));
    }

    tracing::info!(
        port = policy.port,
        listen = %policy.listen_address,
        "installing forward proxy"
    );
    packages::install(host, &[PROXY_PACKAGE])
        .await
        .map_err(|e| ProvisionError::Proxy(e.to_string()))?;
    edit_config_file(&policy.config_path, policy).await?;
    systemd::restart(host, PROXY_UNIT, ProvisionError::Proxy).await?;
    systemd::enable(host, PROXY_UNIT, ProvisionError::Proxy).await?;

    let output = ProxyOutput {
        target_address: local_target(policy),
    };
    tracing::info!(target = %output.target_address, "tunnel target redirected to forward proxy");
    Ok((Some(output), StepOutcome::Succeeded))
}
