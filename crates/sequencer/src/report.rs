//! The deployment report and its state machines.

use std::fmt;
use std::time::SystemTime;

use convoy_diagnostics::DiagnosticFinding;
use convoy_probe::HealthCheckOutcome;
use serde::Serialize;

/// Per-service lifecycle during sequencing. Transitions only move
/// forward; a failed service is never restarted by the engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum ServiceState {
    /// Not yet started.
    Pending,

    /// Start action issued.
    Starting,

    /// Started, polling for readiness.
    WaitingHealthy,

    /// Confirmed healthy.
    Ready,

    /// Attempt budget exhausted without a healthy probe.
    Failed,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::WaitingHealthy => "waiting-healthy",
            Self::Ready => "ready",
            Self::Failed => "failed",
        })
    }
}

/// Whole-run lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RunState {
    /// No sequencing started.
    Idle,

    /// Sequencing in progress.
    Running,

    /// Every service reached ready.
    Complete,

    /// At least one service failed; later services were not started.
    Degraded,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Degraded => "degraded",
        })
    }
}

/// One probe attempt within a service's wait loop.
#[derive(Clone, Debug, Serialize)]
pub struct AttemptRecord {
    /// The service probed.
    pub service: String,

    /// 1-based attempt number within the budget.
    pub attempt: u32,

    /// When the probe was issued.
    pub at: SystemTime,

    /// What the probe observed.
    pub outcome: HealthCheckOutcome,
}

/// Final per-service entry in the report.
#[derive(Clone, Debug, Serialize)]
pub struct ServiceStatus {
    /// The service name.
    pub name: String,

    /// The state the service ended the run in.
    pub state: ServiceState,

    /// Every probe attempt made for this service, in order.
    pub attempts: Vec<AttemptRecord>,

    /// The last probe outcome, if any probe ran.
    pub last_outcome: Option<HealthCheckOutcome>,
}

/// Terminal artifact of one deployment run. Owned by the caller and
/// never mutated by the engine after return.
#[derive(Clone, Debug, Serialize)]
pub struct DeploymentReport {
    /// The final run state.
    pub state: RunState,

    /// Per-service statuses in start order.
    pub services: Vec<ServiceStatus>,

    /// Analyzer findings, present only on degraded runs.
    pub findings: Vec<DiagnosticFinding>,
}
