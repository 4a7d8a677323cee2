//! Construction-time knobs for a topology.

use std::path::PathBuf;

/// Host ports the stack services listen on.
#[derive(Clone, Copy, Debug)]
pub struct ServicePorts {
    /// Port of the access service.
    pub access: u16,

    /// Port of the router service.
    pub router: u16,

    /// Port of the primary server.
    pub server: u16,

    /// Port of the external database.
    pub postgres: u16,
}

impl Default for ServicePorts {
    fn default() -> Self {
        Self {
            access: 8040,
            router: 8046,
            server: 8081,
            postgres: 5432,
        }
    }
}

/// Options used to build service descriptors.
#[derive(Clone, Debug)]
pub struct TopologyOptions {
    /// Host the services are reachable on.
    pub host: String,

    /// Listen ports per service.
    pub ports: ServicePorts,

    /// Path to the compose file services are started from.
    pub compose_file: PathBuf,

    /// Whether the database container is started by the engine. When
    /// false the database is observed for health but never started.
    pub manage_database: bool,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            ports: ServicePorts::default(),
            compose_file: PathBuf::from("docker-compose.yaml"),
            manage_database: true,
        }
    }
}
