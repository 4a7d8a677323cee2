//! Error type for topology construction and ordering.

/// Errors that can occur while building or ordering a topology.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A service depends on a service the topology does not contain.
    #[error("service '{service}' depends on unknown service '{dependency}'")]
    DanglingDependency {
        /// The dependent service.
        service: String,

        /// The missing dependency.
        dependency: String,
    },

    /// The dependency graph still contains a cycle after order policy
    /// edges were dropped.
    #[error("dependency cycle among services: {0:?}")]
    DependencyCycle(Vec<String>),

    /// A health endpoint URL could not be built.
    #[error("invalid health endpoint for service '{service}'")]
    InvalidEndpoint {
        /// The service the endpoint belongs to.
        service: &'static str,

        /// The underlying URL parse failure.
        #[source]
        source: url::ParseError,
    },

    /// A host name could not be resolved to a socket address.
    #[error("cannot resolve host '{host}' for service '{service}'")]
    UnresolvableHost {
        /// The service the endpoint belongs to.
        service: &'static str,

        /// The host that failed to resolve.
        host: String,
    },
}
