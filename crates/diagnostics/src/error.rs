//! Error type for log retrieval.

/// Errors that can occur while fetching service logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spawning or waiting on the log command failed.
    #[error("{0}")]
    Io(&'static str, #[source] std::io::Error),

    /// The log command ran but exited unsuccessfully.
    #[error("log command for '{service}' failed: {stderr}")]
    Command {
        /// The service whose logs were requested.
        service: String,

        /// Captured standard error of the command.
        stderr: String,
    },
}
