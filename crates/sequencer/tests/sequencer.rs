//! Sequencing behavior against scripted probes, without real time or a
//! container runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use convoy_config::ConfigDocument;
use convoy_diagnostics::{DiagnosticFinding, FindingCategory, ObservedState, ServiceObservation};
use convoy_probe::{Endpoint, HealthCheck, HealthCheckOutcome, Prober, StatusPredicate};
use convoy_sequencer::{
    Diagnoser, Error, RunState, Sequencer, SequencerOptions, ServiceStarter, ServiceState, Sleeper,
    StartPolicy,
};
use convoy_topology::{OrderPolicy, ServiceDescriptor, StartAction, Topology, TopologyOptions};
use url::Url;

/// Reports a service healthy from the scripted attempt on; services with
/// no entry are never healthy.
struct ScriptedProber {
    healthy_after: HashMap<String, u32>,
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    probe_order: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(
        &self,
        service: &str,
        _check: &HealthCheck,
        _timeout: Duration,
    ) -> HealthCheckOutcome {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let attempt = attempts.entry(service.to_string()).or_insert(0);
            *attempt += 1;
            *attempt
        };
        self.probe_order.lock().unwrap().push(service.to_string());

        let healthy = self
            .healthy_after
            .get(service)
            .is_some_and(|&threshold| attempt >= threshold);

        HealthCheckOutcome {
            service: service.to_string(),
            healthy,
            latency: Duration::ZERO,
            detail: if healthy { "HTTP 200" } else { "HTTP 503" }.to_string(),
        }
    }
}

struct RecordingStarter {
    started: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ServiceStarter for RecordingStarter {
    async fn start(&self, service: &ServiceDescriptor) -> Result<(), Error> {
        self.started.lock().unwrap().push(service.name.clone());
        Ok(())
    }
}

struct CountingSleeper {
    sleeps: Arc<AtomicU32>,
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, _duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
    }
}

/// Emits one finding per failed observation.
struct StubDiagnoser {
    invoked: Arc<AtomicBool>,
}

#[async_trait]
impl Diagnoser for StubDiagnoser {
    async fn diagnose(
        &self,
        _topology: &Topology,
        observations: &[ServiceObservation],
    ) -> Vec<DiagnosticFinding> {
        self.invoked.store(true, Ordering::SeqCst);

        observations
            .iter()
            .filter(|o| o.state == ObservedState::Failed)
            .map(|o| DiagnosticFinding {
                category: FindingCategory::DependencyUnreachable,
                service: o.service.clone(),
                message: format!("'{}' never became healthy", o.service),
                suggested_action: "inspect the service".to_string(),
            })
            .collect()
    }
}

fn descriptor(name: &str, deps: &[&str]) -> ServiceDescriptor {
    ServiceDescriptor {
        name: name.to_string(),
        start: StartAction::Compose {
            service: name.to_string(),
        },
        health: HealthCheck {
            endpoint: Endpoint::Http(Url::parse(&format!("http://localhost:9/{name}")).unwrap()),
            predicate: StatusPredicate::Success,
        },
        depends_on: deps.iter().map(ToString::to_string).collect(),
    }
}

struct Harness {
    attempts: Arc<Mutex<HashMap<String, u32>>>,
    probe_order: Arc<Mutex<Vec<String>>>,
    started: Arc<Mutex<Vec<String>>>,
    sleeps: Arc<AtomicU32>,
    diagnoser_invoked: Arc<AtomicBool>,
    sequencer: Sequencer<ScriptedProber, RecordingStarter, CountingSleeper>,
}

fn harness(healthy_after: &[(&str, u32)], policy: StartPolicy) -> Harness {
    let attempts = Arc::new(Mutex::new(HashMap::new()));
    let probe_order = Arc::new(Mutex::new(Vec::new()));
    let started = Arc::new(Mutex::new(Vec::new()));
    let sleeps = Arc::new(AtomicU32::new(0));
    let diagnoser_invoked = Arc::new(AtomicBool::new(false));

    let sequencer = Sequencer::new(SequencerOptions {
        prober: ScriptedProber {
            healthy_after: healthy_after
                .iter()
                .map(|(name, threshold)| ((*name).to_string(), *threshold))
                .collect(),
            attempts: Arc::clone(&attempts),
            probe_order: Arc::clone(&probe_order),
        },
        starter: RecordingStarter {
            started: Arc::clone(&started),
        },
        sleeper: CountingSleeper {
            sleeps: Arc::clone(&sleeps),
        },
        policy,
        order_policy: OrderPolicy::default(),
        diagnoser: Some(Box::new(StubDiagnoser {
            invoked: Arc::clone(&diagnoser_invoked),
        })),
    });

    Harness {
        attempts,
        probe_order,
        started,
        sleeps,
        diagnoser_invoked,
        sequencer,
    }
}

fn fast_policy() -> StartPolicy {
    StartPolicy::new(Duration::from_millis(20), Duration::from_millis(10), 40).unwrap()
}

#[tokio::test]
async fn test_dependent_is_probed_only_after_dependency_is_ready() {
    let topology = Topology::new(vec![descriptor("a", &[]), descriptor("b", &["a"])]).unwrap();
    let harness = harness(&[("a", 1), ("b", 3)], fast_policy());

    let report = harness.sequencer.start_all(&topology).await.unwrap();

    assert_eq!(report.state, RunState::Complete);
    for status in &report.services {
        assert_eq!(status.state, ServiceState::Ready, "{}", status.name);
    }

    let b_status = report.services.iter().find(|s| s.name == "b").unwrap();
    assert_eq!(b_status.attempts.len(), 3);

    // Every probe of a precedes every probe of b.
    let order = harness.probe_order.lock().unwrap();
    let last_a = order.iter().rposition(|s| s == "a").unwrap();
    let first_b = order.iter().position(|s| s == "b").unwrap();
    assert!(last_a < first_b);
}

#[tokio::test]
async fn test_budget_exhaustion_is_exact_and_aborts_dependents() {
    let topology = Topology::new(vec![descriptor("c", &[]), descriptor("d", &["c"])]).unwrap();
    let harness = harness(&[("d", 1)], fast_policy().with_budget("c", 5));

    let report = harness.sequencer.start_all(&topology).await.unwrap();

    assert_eq!(report.state, RunState::Degraded);
    assert_eq!(*harness.attempts.lock().unwrap().get("c").unwrap(), 5);
    // No sleep after the final attempt.
    assert_eq!(harness.sleeps.load(Ordering::SeqCst), 4);

    let c_status = report.services.iter().find(|s| s.name == "c").unwrap();
    assert_eq!(c_status.state, ServiceState::Failed);
    assert_eq!(c_status.attempts.len(), 5);

    // d was never started or probed.
    let d_status = report.services.iter().find(|s| s.name == "d").unwrap();
    assert_eq!(d_status.state, ServiceState::Pending);
    assert!(d_status.attempts.is_empty());
    assert_eq!(*harness.started.lock().unwrap(), ["c"]);
}

#[tokio::test]
async fn test_stack_services_start_in_policy_order() {
    let document =
        ConfigDocument::from_yaml_str("shared:\n  database:\n    type: embedded\n").unwrap();
    let topology = Topology::from_document(&document, &TopologyOptions::default()).unwrap();
    let harness = harness(&[("access", 1), ("router", 1), ("server", 1)], fast_policy());

    let report = harness.sequencer.start_all(&topology).await.unwrap();

    assert_eq!(report.state, RunState::Complete);
    assert_eq!(
        *harness.started.lock().unwrap(),
        ["access", "router", "server"]
    );
}

#[tokio::test]
async fn test_degraded_run_attaches_findings() {
    let topology = Topology::new(vec![descriptor("c", &[])]).unwrap();
    let harness = harness(&[], fast_policy().with_budget("c", 2));

    let report = harness.sequencer.start_all(&topology).await.unwrap();

    assert_eq!(report.state, RunState::Degraded);
    assert!(harness.diagnoser_invoked.load(Ordering::SeqCst));
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].service, "c");
}

#[tokio::test]
async fn test_complete_run_never_diagnoses() {
    let topology = Topology::new(vec![descriptor("a", &[])]).unwrap();
    let harness = harness(&[("a", 1)], fast_policy());

    let report = harness.sequencer.start_all(&topology).await.unwrap();

    assert_eq!(report.state, RunState::Complete);
    assert!(!harness.diagnoser_invoked.load(Ordering::SeqCst));
    assert!(report.findings.is_empty());
}
