//! Startup sequencing for a stack deployment.
//!
//! Starts services one at a time in dependency order and gates each
//! dependent on its dependency's readiness: a service's first probe never
//! happens before everything it depends on is ready. The first service to
//! exhaust its attempt budget aborts the sequence; whatever was not
//! started stays pending and the run is reported degraded.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod policy;
mod report;
mod sleeper;
mod starter;

use std::time::SystemTime;

use async_trait::async_trait;
use convoy_diagnostics::{
    Analyzer, DiagnosticFinding, LogSource, ObservedState, ServiceObservation,
};
use convoy_probe::Prober;
use convoy_topology::{OrderPolicy, Topology};
use tracing::{info, warn};

pub use error::Error;
pub use policy::StartPolicy;
pub use report::{AttemptRecord, DeploymentReport, RunState, ServiceState, ServiceStatus};
pub use sleeper::{Sleeper, TokioSleeper};
pub use starter::{ComposeStarter, ServiceStarter};

/// Produces findings for a degraded run. Implemented by the diagnostics
/// analyzer; a stub suffices in tests.
#[async_trait]
pub trait Diagnoser
where
    Self: Send + Sync,
{
    /// Diagnoses the stack given the sequencer's final observations.
    async fn diagnose(
        &self,
        topology: &Topology,
        observations: &[ServiceObservation],
    ) -> Vec<DiagnosticFinding>;
}

#[async_trait]
impl<P, L> Diagnoser for Analyzer<P, L>
where
    P: Prober,
    L: LogSource,
{
    async fn diagnose(
        &self,
        topology: &Topology,
        observations: &[ServiceObservation],
    ) -> Vec<DiagnosticFinding> {
        Self::diagnose(self, topology, observations).await
    }
}

/// Options for [`Sequencer::new`].
pub struct SequencerOptions<P, S, Z> {
    /// Health prober.
    pub prober: P,

    /// Start-action executor.
    pub starter: S,

    /// Pause source for the wait loops.
    pub sleeper: Z,

    /// Poll cadence and attempt budgets.
    pub policy: StartPolicy,

    /// Cycle-breaking start-order policy.
    pub order_policy: OrderPolicy,

    /// Invoked on degraded runs to attach findings to the report.
    pub diagnoser: Option<Box<dyn Diagnoser>>,
}

/// Drives a topology from pending to ready, one service at a time.
pub struct Sequencer<P, S, Z> {
    prober: P,
    starter: S,
    sleeper: Z,
    policy: StartPolicy,
    order_policy: OrderPolicy,
    diagnoser: Option<Box<dyn Diagnoser>>,
}

impl<P, S, Z> Sequencer<P, S, Z>
where
    P: Prober,
    S: ServiceStarter,
    Z: Sleeper,
{
    /// Creates a new sequencer.
    pub fn new(
        SequencerOptions {
            prober,
            starter,
            sleeper,
            policy,
            order_policy,
            diagnoser,
        }: SequencerOptions<P, S, Z>,
    ) -> Self {
        Self {
            prober,
            starter,
            sleeper,
            policy,
            order_policy,
            diagnoser,
        }
    }

    /// Starts every service in dependency order and waits for each to
    /// become healthy before moving on.
    ///
    /// A failed service is never restarted; services after it are never
    /// started. The returned report is the complete record of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology cannot be ordered or a start
    /// action itself fails to execute. Health failures are not errors;
    /// they are recorded in the report.
    pub async fn start_all(&self, topology: &Topology) -> Result<DeploymentReport, Error> {
        let order = topology.start_order(&self.order_policy)?;
        let mut state = RunState::Running;
        let mut statuses: Vec<ServiceStatus> = order
            .iter()
            .map(|name| ServiceStatus {
                name: name.clone(),
                state: ServiceState::Pending,
                attempts: Vec::new(),
                last_outcome: None,
            })
            .collect();

        for index in 0..statuses.len() {
            let name = statuses[index].name.clone();
            let Some(service) = topology.get(&name) else {
                continue;
            };

            statuses[index].state = ServiceState::Starting;
            self.starter.start(service).await?;
            statuses[index].state = ServiceState::WaitingHealthy;

            let budget = self.policy.budget_for(&name);
            let mut ready = false;

            for attempt in 1..=budget {
                let outcome = self
                    .prober
                    .probe(&name, &service.health, self.policy.probe_timeout())
                    .await;
                let healthy = outcome.healthy;

                statuses[index].attempts.push(AttemptRecord {
                    service: name.clone(),
                    attempt,
                    at: SystemTime::now(),
                    outcome: outcome.clone(),
                });
                statuses[index].last_outcome = Some(outcome);

                if healthy {
                    info!("{name} is ready after {attempt} attempt(s)");
                    ready = true;
                    break;
                }

                if attempt < budget {
                    self.sleeper.sleep(self.policy.poll_interval()).await;
                }
            }

            if ready {
                statuses[index].state = ServiceState::Ready;
            } else {
                warn!("{name} did not become healthy within {budget} attempts, aborting");
                statuses[index].state = ServiceState::Failed;
                state = RunState::Degraded;
                break;
            }
        }

        if state == RunState::Running {
            state = RunState::Complete;
        }

        let findings = match (&self.diagnoser, state) {
            (Some(diagnoser), RunState::Degraded) => {
                diagnoser
                    .diagnose(topology, &observations(&statuses))
                    .await
            }
            _ => Vec::new(),
        };

        Ok(DeploymentReport {
            state,
            services: statuses,
            findings,
        })
    }
}

fn observations(statuses: &[ServiceStatus]) -> Vec<ServiceObservation> {
    statuses
        .iter()
        .map(|status| ServiceObservation {
            service: status.name.clone(),
            state: match status.state {
                ServiceState::Ready => ObservedState::Ready,
                ServiceState::Failed => ObservedState::Failed,
                ServiceState::Pending | ServiceState::Starting | ServiceState::WaitingHealthy => {
                    ObservedState::Pending
                }
            },
        })
        .collect()
}
