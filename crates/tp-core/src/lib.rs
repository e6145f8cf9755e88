//! Host provisioning for the client and server roles of a DNS tunnel.
//!
//! [`services::provisioner::Provisioner`] drives the ordered steps; every
//! external tool is reached through [`services::host::Host`].

pub mod error;
pub mod models;
pub mod services;

pub use error::{ProvisionError, Result};
