use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// IO operation failed.
    #[error("{0}: {1}")]
    Io(&'static str, #[source] std::io::Error),

    /// Failed to parse a configuration document.
    #[error("failed to parse configuration document: {0}")]
    Parse(#[from] serde_yaml::Error),
}
