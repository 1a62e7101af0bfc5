//! `docker` CLI backed daemon client.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::util::process::run_command;

use super::{DaemonError, LocalDaemon};

/// Queries a Docker-compatible daemon through its CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
  binary: PathBuf,
}

impl DockerCli {
  pub fn new(binary: impl Into<PathBuf>) -> Self {
    Self { binary: binary.into() }
  }
}

impl Default for DockerCli {
  fn default() -> Self {
    Self::new("docker")
  }
}

#[async_trait]
impl LocalDaemon for DockerCli {
  fn name(&self) -> &str {
    "docker"
  }

  #[instrument(skip(self), fields(binary = %self.binary.display()))]
  async fn image_id(&self, image: &str) -> Result<String, DaemonError> {
    let args = ["image", "inspect", "--format", "{{.Id}}", image];
    let output = run_command(&self.binary, args, &[], None)
      .await
      .map_err(|e| DaemonError::Unavailable {
        message: format!("failed to run {}: {}", self.binary.display(), e),
      })?;

    if !output.success {
      let lowered = output.stderr.to_lowercase();
      if lowered.contains("no such image") || lowered.contains("no such object") {
        return Err(DaemonError::ImageNotFound {
          image: image.to_string(),
        });
      }
      if lowered.contains("cannot connect") || lowered.contains("is the docker daemon running") {
        return Err(DaemonError::Unavailable { message: output.stderr });
      }
      return Err(DaemonError::InspectFailed {
        code: output.code,
        stderr: output.stderr,
      });
    }

    let id = output.last_line().unwrap_or_default().to_string();
    if id.is_empty() {
      return Err(DaemonError::EmptyId {
        image: image.to_string(),
      });
    }

    debug!(image = %image, id = %id, "inspected local image");
    Ok(id)
  }
}
