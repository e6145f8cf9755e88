use std::path::Path;

use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionConfig, StepOutcome};
use crate::services::host::{run_checked, Host, HostCommand};

fn git_command(args: &[&str], working_directory: Option<&Path>) -> HostCommand {
    let mut cmd = HostCommand::new("git").args(args.iter().copied());
    if let Some(dir) = working_directory {
        cmd = cmd.current_dir(dir);
    }
    cmd
}

async fn run_git(
    host: &dyn Host,
    args: &[&str],
    working_directory: Option<&Path>,
) -> Result<String> {
    run_checked(host, &git_command(args, working_directory), ProvisionError::Acquisition).await
}

/// Clone without ever prompting: an unknown host key or a passphrase fails
/// the attempt instead of waiting on the terminal.
pub fn clone_command(source: &str, target_path: &Path) -> HostCommand {
    let target = target_path.to_string_lossy();
    git_command(&["clone", source, &target], None)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes")
}

pub async fn clone_repo(host: &dyn Host, source: &str, target_path: &Path) -> Result<()> {
    run_checked(host, &clone_command(source, target_path), ProvisionError::Acquisition).await?;
    Ok(())
}

fn failure_detail(error: ProvisionError) -> String {
    match error {
        ProvisionError::Acquisition(detail) => detail,
        other => other.to_string(),
    }
}

/// Refuses to merge: a diverged checkout is an error.
pub async fn pull_fast_forward(host: &dyn Host, repo_path: &Path) -> Result<()> {
    run_git(host, &["pull", "--ff-only"], Some(repo_path)).await?;
    Ok(())
}

pub async fn update_submodules(host: &dyn Host, repo_path: &Path) -> Result<()> {
    run_git(
        host,
        &["submodule", "update", "--init", "--recursive"],
        Some(repo_path),
    )
    .await?;
    Ok(())
}

/// Make sure an up-to-date checkout with submodules exists at the install dir.
///
/// An existing `.git` marker means update in place. Otherwise the SSH URL is
/// tried first and the HTTPS URL second.
pub async fn acquire_source(host: &dyn Host, config: &ProvisionConfig) -> Result<StepOutcome> {
    let dir = &config.install_dir;

    if config.git_marker().exists() {
        tracing::info!(dir = %dir.display(), "existing checkout, fast-forwarding");
        pull_fast_forward(host, dir).await?;
    } else {
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ProvisionError::Acquisition(format!("creating {}: {e}", parent.display()))
            })?;
        }

        let refs = &config.source_refs;
        tracing::info!(url = %refs.ssh_url, "cloning");
        if let Err(ssh_error) = clone_repo(host, &refs.ssh_url, dir).await {
            tracing::warn!(
                error = %ssh_error,
                url = %refs.https_url,
                "ssh clone failed, trying https"
            );
            clone_repo(host, &refs.https_url, dir).await.map_err(|https_error| {
                ProvisionError::Acquisition(format!(
                    "both sources failed; ssh: {}; https: {}",
                    failure_detail(ssh_error),
                    failure_detail(https_error)
                ))
            })?;
        }
    }

    update_submodules(host, dir).await?;
    Ok(StepOutcome::Succeeded)
}
