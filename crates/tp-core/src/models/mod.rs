pub mod config;
pub mod outcome;
pub mod report;
pub mod state;

pub use config::{
    BuildProfile, CertConfig, DnsPolicy, ForwardProxyPolicy, NetworkConfig, ProvisionConfig,
    Role, SourceRefs,
};
pub use outcome::StepOutcome;
pub use report::{LocatedArtifacts, ProvisionReport, StepRecord};
pub use state::ProvisionState;
