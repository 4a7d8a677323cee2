//! Start-order policy for breaking known dependency cycles.
//!
//! The access and router services depend on each other by the stack's own
//! design. The cycle is broken by an explicit policy table rather than by
//! graph inference, so the tie always resolves the same way.

use crate::descriptor::{SERVICE_ACCESS, SERVICE_ROUTER};

/// One ordering decision: `first` starts before `second`, so an edge
/// `first → second` in the dependency graph is ignored when ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairRule {
    /// The service that starts first.
    pub first: String,

    /// The service whose readiness `first` must not wait for.
    pub second: String,
}

/// An ordered table of pair rules applied before topological sorting.
#[derive(Clone, Debug)]
pub struct OrderPolicy {
    pairs: Vec<PairRule>,
}

impl OrderPolicy {
    /// Creates a policy from an explicit rule table.
    #[must_use]
    pub const fn new(pairs: Vec<PairRule>) -> Self {
        Self { pairs }
    }

    /// Returns the rules in application order.
    #[must_use]
    pub fn pairs(&self) -> &[PairRule] {
        &self.pairs
    }

    /// Returns whether the dependency of `service` on `dependency` is
    /// suppressed by a rule.
    #[must_use]
    pub fn suppresses(&self, service: &str, dependency: &str) -> bool {
        self.pairs
            .iter()
            .any(|rule| rule.first == service && rule.second == dependency)
    }
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self::new(vec![PairRule {
            first: SERVICE_ACCESS.to_string(),
            second: SERVICE_ROUTER.to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_breaks_access_router_cycle() {
        let policy = OrderPolicy::default();

        assert!(policy.suppresses(SERVICE_ACCESS, SERVICE_ROUTER));
        assert!(!policy.suppresses(SERVICE_ROUTER, SERVICE_ACCESS));
    }
}
