use chrono::{DateTime, Utc};

use crate::error::{ProvisionError, Result};
use crate::models::{ProvisionReport, ProvisionState, Role, StepOutcome, StepRecord};
use crate::services::config_loader::{self, Overrides, PositionalArgs};
use crate::services::host::Host;
use crate::services::{
    artifacts, certs, compile, dns, env_guard, git, packages, proxy, summary, toolchain,
};

/// A run that stopped at its first fatal error.
#[derive(Debug, thiserror::Error)]
#[error("provisioning aborted after {reached}: {error}")]
pub struct AbortedRun {
    pub reached: ProvisionState,
    #[source]
    pub error: ProvisionError,
    pub steps: Vec<StepRecord>,
}

/// Runs the provisioning steps in order against one host.
///
/// There is no retry here; fallbacks live inside the step that needs them.
pub struct Provisioner<'a> {
    host: &'a dyn Host,
    reached: ProvisionState,
    steps: Vec<StepRecord>,
}

impl<'a> Provisioner<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        Self {
            host,
            reached: ProvisionState::Start,
            steps: Vec::new(),
        }
    }

    fn enter(&mut self, state: ProvisionState, outcome: StepOutcome, started_at: DateTime<Utc>) {
        outcome.log(state.as_str());
        tracing::info!(from = %self.reached, to = %state, "state transition");
        self.reached = state;
        self.steps.push(StepRecord {
            state,
            outcome,
            started_at,
            finished_at: Utc::now(),
        });
    }

    fn check<T>(&self, result: Result<T>) -> std::result::Result<T, AbortedRun> {
        result.map_err(|error| AbortedRun {
            reached: self.reached,
            error,
            steps: self.steps.clone(),
        })
    }

    pub async fn run(
        mut self,
        args: &PositionalArgs,
        overrides: &Overrides,
    ) -> std::result::Result<ProvisionReport, AbortedRun> {
        let host = self.host;

        let started = Utc::now();
        let role = self.check(env_guard::check(host, &args.role))?;
        let mut config = self.check(config_loader::resolve(role, args, overrides))?;
        self.enter(ProvisionState::Guarded, StepOutcome::Succeeded, started);

        let started = Utc::now();
        let outcome = self.check(packages::install_base(host, &config).await)?;
        self.enter(ProvisionState::DepsInstalled, outcome, started);

        let started = Utc::now();
        let (toolchain, outcome) = self.check(toolchain::ensure(host, &config).await)?;
        self.enter(ProvisionState::ToolchainReady, outcome, started);

        let started = Utc::now();
        let outcome = self.check(git::acquire_source(host, &config).await)?;
        self.enter(ProvisionState::SourceReady, outcome, started);

        let started = Utc::now();
        let outcome = self.check(compile::build(host, &toolchain, &config).await)?;
        self.enter(ProvisionState::Built, outcome, started);

        let started = Utc::now();
        let outcome = self.check(certs::ensure_pair(host, &config).await)?;
        self.enter(ProvisionState::CertReady, outcome, started);

        if config.role == Role::Server {
            let started = Utc::now();
            let (output, outcome) = self.check(proxy::install(host, &config).await)?;
            if let Some(output) = output {
                config = config.with_target_address(output.target_address);
            }
            self.enter(ProvisionState::ProxyReady, outcome, started);
        }

        let started = Utc::now();
        let outcome = self.check(dns::reconfigure(host, &config.dns_policy).await)?;
        self.enter(ProvisionState::DnsConfigured, outcome, started);

        let started = Utc::now();
        let located = self.check(artifacts::locate_binaries(&config))?;
        self.enter(ProvisionState::ArtifactsLocated, StepOutcome::Succeeded, started);

        let started = Utc::now();
        let text = summary::render(&config, &located);
        self.enter(ProvisionState::Reported, StepOutcome::Succeeded, started);

        Ok(ProvisionReport {
            final_state: self.reached,
            config,
            artifacts: located,
            steps: self.steps,
            summary: text,
        })
    }
}

/// Guard, resolve, and provision in one call.
pub async fn provision(
    host: &dyn Host,
    args: &PositionalArgs,
    overrides: &Overrides,
) -> std::result::Result<ProvisionReport, AbortedRun> {
    Provisioner::new(host).run(args, overrides).await
}
