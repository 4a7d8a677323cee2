//! Start actions behind a trait so sequencing is testable without a
//! container runtime.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use convoy_topology::{ServiceDescriptor, StartAction};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::Error;

/// Issues the start action of one service. Fire-and-forget: readiness is
/// the wait loop's job, not the starter's.
#[async_trait]
pub trait ServiceStarter
where
    Self: Send + Sync,
{
    /// Starts the service. Externally managed services are a no-op.
    async fn start(&self, service: &ServiceDescriptor) -> Result<(), Error>;
}

/// Starter shelling out to `docker compose`.
#[derive(Clone, Debug)]
pub struct ComposeStarter {
    compose_file: PathBuf,
}

impl ComposeStarter {
    /// Creates a starter for the given compose file.
    #[must_use]
    pub const fn new(compose_file: PathBuf) -> Self {
        Self { compose_file }
    }

    /// Returns the compose file the starter operates on.
    #[must_use]
    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }

    /// Tears the whole stack down, removing volumes and orphans.
    ///
    /// # Errors
    ///
    /// Returns an error if the teardown command cannot run or exits
    /// unsuccessfully.
    pub async fn down(&self) -> Result<(), Error> {
        info!("tearing down the stack");

        let output = Command::new("docker")
            .arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .arg("down")
            .arg("--volumes")
            .arg("--remove-orphans")
            .output()
            .await
            .map_err(|e| Error::Io("failed to run docker compose down", e))?;

        if !output.status.success() {
            return Err(Error::Command {
                service: "stack".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ServiceStarter for ComposeStarter {
    async fn start(&self, service: &ServiceDescriptor) -> Result<(), Error> {
        let compose_service = match &service.start {
            StartAction::Compose { service } => service,
            StartAction::External => {
                debug!("{} is externally managed, not starting it", service.name);
                return Ok(());
            }
        };

        info!("starting {}", service.name);

        // --no-deps: ordering is the sequencer's responsibility, compose
        // must not start dependencies on its own.
        let output = Command::new("docker")
            .arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .arg("up")
            .arg("-d")
            .arg("--no-deps")
            .arg(compose_service)
            .output()
            .await
            .map_err(|e| Error::Io("failed to run docker compose up", e))?;

        if !output.status.success() {
            return Err(Error::Command {
                service: service.name.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}
