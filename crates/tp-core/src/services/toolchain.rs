use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionConfig, StepOutcome};
use crate::services::host::{run_checked, Host, HostCommand};

const RUSTUP_INSTALL: &str =
    "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh -s -- -y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cargo: PathBuf,
}

fn installed_cargo(host: &dyn Host, cargo_home: &Path) -> Option<PathBuf> {
    host.find_program("cargo").or_else(|| {
        let candidate = cargo_home.join("bin").join("cargo");
        candidate.is_file().then_some(candidate)
    })
}

/// Locate `cargo`, installing rustup when it is absent.
pub async fn ensure(
    host: &dyn Host,
    config: &ProvisionConfig,
) -> Result<(Toolchain, StepOutcome)> {
    if let Some(cargo) = installed_cargo(host, &config.cargo_home) {
        tracing::info!(cargo = %cargo.display(), "toolchain already present");
        return Ok((
            Toolchain { cargo },
            StepOutcome::skipped("cargo already installed"),
        ));
    }

    tracing::info!("installing rust toolchain via rustup");
    let install = HostCommand::new("sh")
        .args(["-c", RUSTUP_INSTALL])
        .env("CARGO_HOME", config.cargo_home.to_string_lossy());
    run_checked(host, &install, ProvisionError::Toolchain).await?;

    let cargo = config.cargo_home.join("bin").join("cargo");
    if !cargo.is_file() {
        return Err(ProvisionError::Toolchain(format!(
            "rustup finished but {} does not exist",
            cargo.display()
        )));
    }
    Ok((Toolchain { cargo }, StepOutcome::Succeeded))
}
