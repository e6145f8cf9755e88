use std::path::Path;

use crate::error::{ProvisionError, Result};
use crate::models::{DnsPolicy, StepOutcome};
use crate::services::host::Host;
use crate::services::systemd;

pub const CONFLICTING_RESOLVER_UNIT: &str = "systemd-resolved";
pub const RESOLVER_OPTIONS: &str = "options edns0 trust-ad";

pub fn resolver_file_contents(nameserver_ip: &str) -> String {
    format!("nameserver {nameserver_ip}\n{RESOLVER_OPTIONS}\n")
}

/// Stop and disable the conflicting resolver. Failures are reported, not raised.
pub async fn disable_conflicting_resolver(host: &dyn Host, policy: &DnsPolicy) -> StepOutcome {
    if !policy.disable_conflicting_resolver {
        return StepOutcome::skipped("DISABLE_RESOLVED is off");
    }

    let mut failures = Vec::new();
    if let Err(e) = systemd::stop(host, CONFLICTING_RESOLVER_UNIT, ProvisionError::Dns).await {
        failures.push(e.to_string());
    }
    if let Err(e) = systemd::disable(host, CONFLICTING_RESOLVER_UNIT, ProvisionError::Dns).await {
        failures.push(e.to_string());
    }

    if failures.is_empty() {
        StepOutcome::Succeeded
    } else {
        StepOutcome::failed(failures.join("; "))
    }
}

async fn write_resolver_file(path: &Path, contents: &str) -> Result<()> {
    // A stub symlink would send the write into the resolver's runtime dir.
    if let Ok(meta) = tokio::fs::symlink_metadata(path).await {
        if meta.file_type().is_symlink() {
            tokio::fs::remove_file(path).await.map_err(|e| {
                ProvisionError::Dns(format!("removing symlink {}: {e}", path.display()))
            })?;
        }
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ProvisionError::Dns(format!("writing {}: {e}", path.display())))
}

/// Overwrite the resolver file with a single nameserver entry.
pub async fn rewrite_resolver_config(policy: &DnsPolicy) -> Result<StepOutcome> {
    if !policy.rewrite_resolver_config {
        return Ok(StepOutcome::skipped("REWRITE_RESOLV_CONF is off"));
    }
    let nameserver = policy
        .nameserver_ip
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| {
            ProvisionError::Config(
                "REWRITE_RESOLV_CONF is on but no nameserver address was given".into(),
            )
        })?;

    let path = &policy.resolver_config_path;
    tracing::info!(path = %path.display(), %nameserver, "rewriting resolver config");
    write_resolver_file(path, &resolver_file_contents(nameserver)).await?;
    Ok(StepOutcome::Succeeded)
}

/// Disable first, then rewrite: the resolver service regenerates the file.
pub async fn reconfigure(host: &dyn Host, policy: &DnsPolicy) -> Result<StepOutcome> {
    let disabled = disable_conflicting_resolver(host, policy).await;
    disabled.log("disable-conflicting-resolver");
    let rewritten = rewrite_resolver_config(policy).await?;
    rewritten.log("rewrite-resolver-config");
    Ok(disabled.combine(rewritten))
}
