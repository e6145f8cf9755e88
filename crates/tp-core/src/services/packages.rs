use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionConfig, StepOutcome};
use crate::services::host::{run_checked, Host, HostCommand};

pub const BASE_PACKAGES: &[&str] = &[
    "git",
    "curl",
    "build-essential",
    "pkg-config",
    "openssl",
    "ca-certificates",
];

fn apt_get(args: &[&str]) -> HostCommand {
    HostCommand::new("apt-get")
        .args(args.iter().copied())
        .env("DEBIAN_FRONTEND", "noninteractive")
}

/// Refresh the package index and install `packages`.
pub async fn install(host: &dyn Host, packages: &[&str]) -> Result<()> {
    run_checked(host, &apt_get(&["update"]), ProvisionError::Package).await?;
    let mut args = vec!["install", "-y"];
    args.extend_from_slice(packages);
    run_checked(host, &apt_get(&args), ProvisionError::Package).await?;
    Ok(())
}

pub async fn install_base(host: &dyn Host, config: &ProvisionConfig) -> Result<StepOutcome> {
    if config.skip_dependencies {
        return Ok(StepOutcome::skipped("SKIP_DEPENDENCIES is set"));
    }
    install(host, BASE_PACKAGES).await?;
    Ok(StepOutcome::Succeeded)
}
