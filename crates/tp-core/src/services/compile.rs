use crate::error::{ProvisionError, Result};
use crate::models::{BuildProfile, ProvisionConfig, StepOutcome};
use crate::services::host::{run_checked, Host, HostCommand};
use crate::services::toolchain::Toolchain;

pub fn build_command(toolchain: &Toolchain, config: &ProvisionConfig) -> HostCommand {
    let mut cmd = HostCommand::new(toolchain.cargo.to_string_lossy())
        .arg("build")
        .current_dir(&config.install_dir);
    if config.build_profile == BuildProfile::Release {
        cmd = cmd.arg("--release");
    }
    cmd
}

pub async fn build(
    host: &dyn Host,
    toolchain: &Toolchain,
    config: &ProvisionConfig,
) -> Result<StepOutcome> {
    tracing::info!(profile = config.build_profile.output_dir(), "building binaries");
    run_checked(host, &build_command(toolchain, config), ProvisionError::Build).await?;
    Ok(StepOutcome::Succeeded)
}
