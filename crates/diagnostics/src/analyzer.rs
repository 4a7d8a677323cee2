//! The diagnostics analyzer.

use std::time::Duration;

use convoy_probe::Prober;
use convoy_topology::Topology;
use tracing::{debug, info};

use crate::catalog::classify;
use crate::finding::{DiagnosticFinding, FindingCategory};
use crate::source::LogSource;

/// What the sequencer last knew about a service, carried into diagnosis
/// so late recoveries can be told apart from plain failures.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObservedState {
    /// The service reached ready during sequencing.
    Ready,

    /// The service exhausted its attempt budget.
    Failed,

    /// The service was never started.
    Pending,
}

/// One service's last known state, as reported by the sequencer. A
/// standalone diagnosis may pass no observations at all.
#[derive(Clone, Debug)]
pub struct ServiceObservation {
    /// The service name.
    pub service: String,

    /// Its state when sequencing ended.
    pub state: ObservedState,
}

/// Attributes unhealthy services to known causes.
///
/// Diagnosis is read-only and total: every problem becomes a finding, and
/// a failure to fetch logs is itself a finding rather than an error.
pub struct Analyzer<P, L> {
    prober: P,
    logs: L,
    probe_timeout: Duration,
    tail_lines: u32,
}

/// Options for [`Analyzer::new`].
pub struct AnalyzerOptions<P, L> {
    /// Prober used for the one-shot confirmation probes.
    pub prober: P,

    /// Source of recent service logs.
    pub logs: L,

    /// Timeout applied to each confirmation probe.
    pub probe_timeout: Duration,

    /// How many log lines to inspect per service.
    pub tail_lines: u32,
}

impl<P, L> Analyzer<P, L>
where
    P: Prober,
    L: LogSource,
{
    /// Creates a new analyzer.
    pub fn new(
        AnalyzerOptions {
            prober,
            logs,
            probe_timeout,
            tail_lines,
        }: AnalyzerOptions<P, L>,
    ) -> Self {
        Self {
            prober,
            logs,
            probe_timeout,
            tail_lines,
        }
    }

    /// Diagnoses the stack: re-probes every service once, then matches
    /// the logs of unhealthy services against the symptom catalog.
    ///
    /// Findings come back in topology order, one at most per unhealthy
    /// service plus late-recovery notices, so identical inputs always
    /// produce identical output.
    pub async fn diagnose(
        &self,
        topology: &Topology,
        observations: &[ServiceObservation],
    ) -> Vec<DiagnosticFinding> {
        let mut findings = Vec::new();

        for service in topology.services() {
            let outcome = self
                .prober
                .probe(&service.name, &service.health, self.probe_timeout)
                .await;
            debug!(
                "confirmation probe for {}: healthy={}",
                service.name, outcome.healthy
            );

            let observed = observations
                .iter()
                .find(|o| o.service == service.name)
                .map(|o| o.state);

            if outcome.healthy {
                if observed == Some(ObservedState::Failed) {
                    findings.push(DiagnosticFinding {
                        category: FindingCategory::RecoveredLate,
                        service: service.name.clone(),
                        message: format!(
                            "'{}' is healthy now but exhausted its attempt budget during startup",
                            service.name
                        ),
                        suggested_action:
                            "increase the service's attempt budget; the stack may just be slow to start"
                                .to_string(),
                    });
                }

                continue;
            }

            if let Some(finding) = self.diagnose_unhealthy(&service.name, &outcome.detail).await {
                findings.push(finding);
            }
        }

        info!("diagnosis produced {} finding(s)", findings.len());

        findings
    }

    // A log with no known symptom yields no finding; the unhealthy probe
    // outcome is already visible in the report.
    async fn diagnose_unhealthy(
        &self,
        service: &str,
        probe_detail: &str,
    ) -> Option<DiagnosticFinding> {
        let log = match self.logs.tail(service, self.tail_lines).await {
            Ok(log) => log,
            Err(e) => {
                return Some(DiagnosticFinding {
                    category: FindingCategory::LogsUnavailable,
                    service: service.to_string(),
                    message: format!(
                        "'{service}' is unhealthy ({probe_detail}) and its logs could not be fetched: {e}"
                    ),
                    suggested_action:
                        "inspect the container runtime directly; diagnosis confidence is reduced"
                            .to_string(),
                });
            }
        };

        classify(&log).map(|(symptom, evidence)| DiagnosticFinding {
            category: symptom.category,
            service: service.to_string(),
            message: format!("'{service}' is unhealthy: {evidence}"),
            suggested_action: symptom.action.to_string(),
        })
    }
}
