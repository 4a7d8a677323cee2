//! Wait-loop policy: poll cadence and per-service attempt budgets.

use std::collections::BTreeMap;
use std::time::Duration;

use convoy_topology::{SERVICE_ACCESS, SERVICE_POSTGRES, SERVICE_ROUTER, SERVICE_SERVER};

use crate::error::Error;

/// How the sequencer polls for readiness. Budgets are static policy
/// values per service; services without an entry use the default.
#[derive(Clone, Debug)]
pub struct StartPolicy {
    poll_interval: Duration,
    probe_timeout: Duration,
    default_attempt_budget: u32,
    attempt_budgets: BTreeMap<String, u32>,
}

impl StartPolicy {
    /// Creates a policy with the given cadence and default budget.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < probe_timeout < poll_interval` and the
    /// budget is at least 1. A probe that can outlive the poll interval
    /// would skew the wait-loop ceiling.
    pub fn new(
        poll_interval: Duration,
        probe_timeout: Duration,
        default_attempt_budget: u32,
    ) -> Result<Self, Error> {
        if probe_timeout.is_zero() {
            return Err(Error::InvalidPolicy(
                "probe timeout must be non-zero".to_string(),
            ));
        }

        if probe_timeout >= poll_interval {
            return Err(Error::InvalidPolicy(format!(
                "probe timeout {probe_timeout:?} must be shorter than poll interval {poll_interval:?}"
            )));
        }

        if default_attempt_budget == 0 {
            return Err(Error::InvalidPolicy(
                "attempt budget must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            poll_interval,
            probe_timeout,
            default_attempt_budget,
            attempt_budgets: BTreeMap::new(),
        })
    }

    /// Sets the attempt budget for one service.
    #[must_use]
    pub fn with_budget(mut self, service: &str, budget: u32) -> Self {
        self.attempt_budgets.insert(service.to_string(), budget);
        self
    }

    /// Returns the attempt budget for the named service.
    #[must_use]
    pub fn budget_for(&self, service: &str) -> u32 {
        self.attempt_budgets
            .get(service)
            .copied()
            .unwrap_or(self.default_attempt_budget)
    }

    /// Returns the pause between consecutive probes of one service.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the timeout applied to each individual probe.
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

impl Default for StartPolicy {
    /// 2s cadence, 1s probes. The auth pair gets the largest budgets
    /// since their mutual registration dominates stack startup time.
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(1),
            default_attempt_budget: 40,
            attempt_budgets: BTreeMap::from([
                (SERVICE_ACCESS.to_string(), 80),
                (SERVICE_ROUTER.to_string(), 80),
                (SERVICE_SERVER.to_string(), 60),
                (SERVICE_POSTGRES.to_string(), 40),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_timeout_must_be_shorter_than_interval() {
        let result = StartPolicy::new(Duration::from_secs(1), Duration::from_secs(1), 40);

        assert!(matches!(result, Err(Error::InvalidPolicy(_))));
    }

    #[test]
    fn test_zero_budget_rejected() {
        let result = StartPolicy::new(Duration::from_secs(2), Duration::from_secs(1), 0);

        assert!(matches!(result, Err(Error::InvalidPolicy(_))));
    }

    #[test]
    fn test_default_budgets() {
        let policy = StartPolicy::default();

        assert_eq!(policy.budget_for(SERVICE_ACCESS), 80);
        assert_eq!(policy.budget_for(SERVICE_ROUTER), 80);
        assert_eq!(policy.budget_for(SERVICE_SERVER), 60);
        assert_eq!(policy.budget_for(SERVICE_POSTGRES), 40);
        assert_eq!(policy.budget_for("something-else"), 40);
    }

    #[test]
    fn test_budget_override() {
        let policy = StartPolicy::default().with_budget("server", 5);

        assert_eq!(policy.budget_for("server"), 5);
    }
}
