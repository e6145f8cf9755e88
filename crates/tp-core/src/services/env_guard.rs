use crate::error::{ProvisionError, Result};
use crate::models::Role;
use crate::services::host::Host;

/// Checks privilege and role before anything on the host is touched.
pub fn check(host: &dyn Host, raw_role: &str) -> Result<Role> {
    if !host.is_elevated() {
        return Err(ProvisionError::Precondition(
            "must be run as root (try sudo)".into(),
        ));
    }
    Role::parse(raw_role)
}
