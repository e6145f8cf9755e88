use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionConfig, StepOutcome};
use crate::services::host::{run_checked, Host, HostCommand};

pub fn openssl_command(config: &ProvisionConfig) -> HostCommand {
    HostCommand::new("openssl").args([
        "req".to_string(),
        "-x509".into(),
        "-newkey".into(),
        "rsa:2048".into(),
        "-nodes".into(),
        "-keyout".into(),
        config.key_path().to_string_lossy().into_owned(),
        "-out".into(),
        config.cert_path().to_string_lossy().into_owned(),
        "-days".into(),
        config.cert_config.validity_days.to_string(),
        "-subj".into(),
        config.cert_config.subject.clone(),
    ])
}

/// Generate a self-signed pair unless either file is already there.
///
/// A lone key or lone certificate is left as is; the missing half is not
/// regenerated.
pub async fn ensure_pair(host: &dyn Host, config: &ProvisionConfig) -> Result<StepOutcome> {
    let cert = config.cert_path();
    let key = config.key_path();
    if cert.exists() || key.exists() {
        return Ok(StepOutcome::skipped(format!(
            "certificate material already present at {} / {}",
            cert.display(),
            key.display()
        )));
    }

    tracing::info!(
        cert = %cert.display(),
        days = config.cert_config.validity_days,
        "generating self-signed certificate"
    );
    run_checked(host, &openssl_command(config), ProvisionError::Certificate).await?;
    Ok(StepOutcome::Succeeded)
}
