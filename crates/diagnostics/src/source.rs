//! Log retrieval behind a trait so the analyzer is testable without a
//! container runtime.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::Error;

/// Provides the most recent log lines of one service.
#[async_trait]
pub trait LogSource
where
    Self: Send + Sync,
{
    /// Returns up to `lines` recent log lines of the named service.
    async fn tail(&self, service: &str, lines: u32) -> Result<String, Error>;
}

/// Log source shelling out to `docker compose logs`.
#[derive(Clone, Debug)]
pub struct ComposeLogSource {
    compose_file: PathBuf,
}

impl ComposeLogSource {
    /// Creates a log source for the given compose file.
    #[must_use]
    pub const fn new(compose_file: PathBuf) -> Self {
        Self { compose_file }
    }
}

#[async_trait]
impl LogSource for ComposeLogSource {
    async fn tail(&self, service: &str, lines: u32) -> Result<String, Error> {
        debug!("fetching logs for {service}");

        let output = Command::new("docker")
            .arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .arg("logs")
            .arg("--no-color")
            .arg("--tail")
            .arg(lines.to_string())
            .arg(service)
            .output()
            .await
            .map_err(|e| Error::Io("failed to run docker compose logs", e))?;

        if !output.status.success() {
            return Err(Error::Command {
                service: service.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
