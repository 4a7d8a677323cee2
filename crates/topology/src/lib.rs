//! Service topology of a stack deployment.
//!
//! Builds the set of service descriptors implied by a configuration
//! document and computes a deterministic start order. All graph problems
//! (dangling dependencies, cycles the order policy does not break) are
//! detected here, before any side effect happens.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod descriptor;
mod error;
mod options;
mod order;

use std::collections::BTreeSet;
use std::net::ToSocketAddrs;

use convoy_config::ConfigDocument;
use convoy_probe::{Endpoint, HealthCheck, StatusPredicate};
use url::Url;

pub use descriptor::{
    SERVICE_ACCESS, SERVICE_POSTGRES, SERVICE_ROUTER, SERVICE_SERVER, ServiceDescriptor,
    StartAction,
};
pub use error::Error;
pub use options::{ServicePorts, TopologyOptions};
pub use order::{OrderPolicy, PairRule};

/// The services of one deployment, in insertion order. Insertion order is
/// the tie-break for the start order, so it is part of the contract.
#[derive(Clone, Debug)]
pub struct Topology {
    services: Vec<ServiceDescriptor>,
}

impl Topology {
    /// Creates a topology from explicit descriptors.
    ///
    /// # Errors
    ///
    /// Returns `Error::DanglingDependency` if any descriptor depends on a
    /// service the set does not contain.
    pub fn new(services: Vec<ServiceDescriptor>) -> Result<Self, Error> {
        let names: BTreeSet<&str> = services.iter().map(|s| s.name.as_str()).collect();

        for service in &services {
            for dependency in &service.depends_on {
                if !names.contains(dependency.as_str()) {
                    return Err(Error::DanglingDependency {
                        service: service.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        Ok(Self { services })
    }

    /// Builds the stack topology implied by a configuration document.
    ///
    /// A `postgres` descriptor is included only when the document selects
    /// the external database path.
    ///
    /// # Errors
    ///
    /// Returns an error if a health endpoint cannot be constructed.
    pub fn from_document(
        document: &ConfigDocument,
        options: &TopologyOptions,
    ) -> Result<Self, Error> {
        let with_database = document.selects_external_database();
        let mut services = Vec::with_capacity(4);

        if with_database {
            services.push(ServiceDescriptor {
                name: SERVICE_POSTGRES.to_string(),
                start: if options.manage_database {
                    compose_action(SERVICE_POSTGRES)
                } else {
                    StartAction::External
                },
                health: tcp_check(SERVICE_POSTGRES, &options.host, options.ports.postgres)?,
                depends_on: BTreeSet::new(),
            });
        }

        let database_dep = || {
            if with_database {
                BTreeSet::from([SERVICE_POSTGRES.to_string()])
            } else {
                BTreeSet::new()
            }
        };

        let mut access_deps = database_dep();
        access_deps.insert(SERVICE_ROUTER.to_string());
        services.push(ServiceDescriptor {
            name: SERVICE_ACCESS.to_string(),
            start: compose_action(SERVICE_ACCESS),
            health: http_check(
                SERVICE_ACCESS,
                &options.host,
                options.ports.access,
                "/access/api/v1/system/ping",
            )?,
            depends_on: access_deps,
        });

        services.push(ServiceDescriptor {
            name: SERVICE_ROUTER.to_string(),
            start: compose_action(SERVICE_ROUTER),
            health: http_check(
                SERVICE_ROUTER,
                &options.host,
                options.ports.router,
                "/router/api/v1/system/health",
            )?,
            depends_on: BTreeSet::from([SERVICE_ACCESS.to_string()]),
        });

        let mut server_deps = database_dep();
        server_deps.insert(SERVICE_ROUTER.to_string());
        services.push(ServiceDescriptor {
            name: SERVICE_SERVER.to_string(),
            start: compose_action(SERVICE_SERVER),
            health: http_check(
                SERVICE_SERVER,
                &options.host,
                options.ports.server,
                "/api/v1/system/ping",
            )?,
            depends_on: server_deps,
        });

        Self::new(services)
    }

    /// Returns the descriptors in insertion order.
    #[must_use]
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Returns the descriptor for the named service, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Computes the start order under the given policy.
    ///
    /// Dependencies suppressed by a pair rule are ignored; the remaining
    /// graph is sorted topologically with insertion order as the
    /// tie-break, so the result is fully deterministic.
    ///
    /// # Errors
    ///
    /// Returns `Error::DependencyCycle` naming the services left in a
    /// cycle the policy did not break.
    pub fn start_order(&self, policy: &OrderPolicy) -> Result<Vec<String>, Error> {
        let mut placed: Vec<String> = Vec::with_capacity(self.services.len());
        let mut done: BTreeSet<&str> = BTreeSet::new();

        while placed.len() < self.services.len() {
            let next = self.services.iter().find(|service| {
                !done.contains(service.name.as_str())
                    && service
                        .depends_on
                        .iter()
                        .filter(|dep| !policy.suppresses(&service.name, dep))
                        .all(|dep| done.contains(dep.as_str()))
            });

            match next {
                Some(service) => {
                    done.insert(service.name.as_str());
                    placed.push(service.name.clone());
                }
                None => {
                    let remaining = self
                        .services
                        .iter()
                        .filter(|s| !done.contains(s.name.as_str()))
                        .map(|s| s.name.clone())
                        .collect();

                    return Err(Error::DependencyCycle(remaining));
                }
            }
        }

        Ok(placed)
    }
}

fn compose_action(service: &str) -> StartAction {
    StartAction::Compose {
        service: service.to_string(),
    }
}

fn http_check(
    service: &'static str,
    host: &str,
    port: u16,
    path: &str,
) -> Result<HealthCheck, Error> {
    let url = Url::parse(&format!("http://{host}:{port}{path}"))
        .map_err(|source| Error::InvalidEndpoint { service, source })?;

    Ok(HealthCheck {
        endpoint: Endpoint::Http(url),
        predicate: StatusPredicate::Success,
    })
}

fn tcp_check(service: &'static str, host: &str, port: u16) -> Result<HealthCheck, Error> {
    let addr = (host, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| Error::UnresolvableHost {
            service,
            host: host.to_string(),
        })?;

    Ok(HealthCheck {
        endpoint: Endpoint::Tcp(addr),
        predicate: StatusPredicate::Success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    static EXTERNAL_DB: &str = r"
shared:
  database:
    type: postgresql
";

    static EMBEDDED_DB: &str = r"
shared:
  database:
    type: embedded
";

    fn topology(yaml: &str) -> Topology {
        let document = ConfigDocument::from_yaml_str(yaml).unwrap();
        Topology::from_document(&document, &TopologyOptions::default()).unwrap()
    }

    #[test]
    fn test_external_database_adds_postgres_descriptor() {
        let topology = topology(EXTERNAL_DB);
        let names: Vec<&str> = topology.services().iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names, ["postgres", "access", "router", "server"]);
        assert!(
            topology
                .get(SERVICE_SERVER)
                .unwrap()
                .depends_on
                .contains(SERVICE_POSTGRES)
        );
    }

    #[test]
    fn test_embedded_database_omits_postgres() {
        let topology = topology(EMBEDDED_DB);

        assert!(topology.get(SERVICE_POSTGRES).is_none());
        assert!(
            !topology
                .get(SERVICE_ACCESS)
                .unwrap()
                .depends_on
                .contains(SERVICE_POSTGRES)
        );
    }

    #[test]
    fn test_default_policy_yields_access_before_router() {
        let order = topology(EXTERNAL_DB)
            .start_order(&OrderPolicy::default())
            .unwrap();

        assert_eq!(order, ["postgres", "access", "router", "server"]);
    }

    #[test]
    fn test_start_order_is_stable_across_calls() {
        let topology = topology(EMBEDDED_DB);
        let policy = OrderPolicy::default();

        assert_eq!(
            topology.start_order(&policy).unwrap(),
            topology.start_order(&policy).unwrap()
        );
    }

    #[test]
    fn test_empty_policy_reports_the_mutual_cycle() {
        let result = topology(EMBEDDED_DB).start_order(&OrderPolicy::new(Vec::new()));

        match result {
            Err(Error::DependencyCycle(remaining)) => {
                assert!(remaining.contains(&SERVICE_ACCESS.to_string()));
                assert!(remaining.contains(&SERVICE_ROUTER.to_string()));
            }
            other => panic!("expected a dependency cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_dependency_is_rejected() {
        let mut services = topology(EMBEDDED_DB).services().to_vec();
        services[0].depends_on.insert("vault".to_string());

        match Topology::new(services) {
            Err(Error::DanglingDependency {
                service,
                dependency,
            }) => {
                assert_eq!(service, SERVICE_ACCESS);
                assert_eq!(dependency, "vault");
            }
            other => panic!("expected a dangling dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_unmanaged_database_is_external() {
        let document = ConfigDocument::from_yaml_str(EXTERNAL_DB).unwrap();
        let options = TopologyOptions {
            manage_database: false,
            ..TopologyOptions::default()
        };
        let topology = Topology::from_document(&document, &options).unwrap();

        assert_eq!(
            topology.get(SERVICE_POSTGRES).unwrap().start,
            StartAction::External
        );
    }
}
