use crate::error::{ProvisionError, Result};
use crate::services::host::{run_checked, Host, HostCommand};

async fn run_systemctl<F>(host: &dyn Host, action: &str, unit: &str, wrap: F) -> Result<()>
where
    F: Fn(String) -> ProvisionError,
{
    let cmd = HostCommand::new("systemctl").args([action, unit]);
    run_checked(host, &cmd, wrap).await?;
    Ok(())
}

pub async fn stop<F>(host: &dyn Host, unit: &str, wrap: F) -> Result<()>
where
    F: Fn(String) -> ProvisionError,
{
    run_systemctl(host, "stop", unit, wrap).await
}

pub async fn disable<F>(host: &dyn Host, unit: &str, wrap: F) -> Result<()>
where
    F: Fn(String) -> ProvisionError,
{
    run_systemctl(host, "disable", unit, wrap).await
}

pub async fn restart<F>(host: &dyn Host, unit: &str, wrap: F) -> Result<()>
where
    F: Fn(String) -> ProvisionError,
{
    run_systemctl(host, "restart", unit, wrap).await
}

pub async fn enable<F>(host: &dyn Host, unit: &str, wrap: F) -> Result<()>
where
    F: Fn(String) -> ProvisionError,
{
    run_systemctl(host, "enable", unit, wrap).await
}
