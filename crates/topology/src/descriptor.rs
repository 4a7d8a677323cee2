//! Per-service descriptors.

use std::collections::BTreeSet;

use convoy_probe::HealthCheck;

/// Name of the external database service.
pub static SERVICE_POSTGRES: &str = "postgres";

/// Name of the authorization / registration service.
pub static SERVICE_ACCESS: &str = "access";

/// Name of the routing / gateway service.
pub static SERVICE_ROUTER: &str = "router";

/// Name of the primary artifact service.
pub static SERVICE_SERVER: &str = "server";

/// How a service is brought up.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StartAction {
    /// Started through docker compose with the given compose service name.
    Compose {
        /// The service name in the compose file.
        service: String,
    },

    /// Managed outside the engine; observed for health but never started.
    External,
}

/// One service in the deployment: how to start it, how to tell it is
/// healthy, and which services must be ready before it.
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
    /// The canonical service name.
    pub name: String,

    /// How the service is brought up.
    pub start: StartAction,

    /// The readiness contract.
    pub health: HealthCheck,

    /// Names of services that must be `Ready` first.
    pub depends_on: BTreeSet<String>,
}
