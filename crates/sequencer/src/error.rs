//! Error type for sequencing.

/// Errors that can occur while sequencing a deployment.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The start policy is internally inconsistent.
    #[error("invalid start policy: {0}")]
    InvalidPolicy(String),

    /// The topology could not be ordered.
    #[error(transparent)]
    Topology(#[from] convoy_topology::Error),

    /// Spawning or waiting on a start command failed.
    #[error("{0}")]
    Io(&'static str, #[source] std::io::Error),

    /// A start command ran but exited unsuccessfully.
    #[error("start command for '{service}' failed: {stderr}")]
    Command {
        /// The service being started.
        service: String,

        /// Captured standard error of the command.
        stderr: String,
    },
}
