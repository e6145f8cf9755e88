pub mod artifacts;
pub mod certs;
pub mod compile;
pub mod config_loader;
pub mod dns;
pub mod env_guard;
pub mod git;
pub mod host;
pub mod packages;
pub mod provisioner;
pub mod proxy;
pub mod summary;
pub mod systemd;
pub mod toolchain;
