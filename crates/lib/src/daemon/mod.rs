//! Local container daemon capability.
//!
//! In sideload mode the daemon, not the registry, is authoritative for the
//! image identifier.
//!
//! # Submodules
//!
//! - [`docker`] - `docker` CLI backed implementation

pub mod docker;

use async_trait::async_trait;
use thiserror::Error;

pub use docker::DockerCli;

#[derive(Debug, Error)]
pub enum DaemonError {
  /// The daemon (or its client) could not be reached.
  #[error("local daemon unavailable: {message}")]
  Unavailable { message: String },

  /// The daemon has no image under the requested name.
  #[error("image not found in local daemon: {image}")]
  ImageNotFound { image: String },

  /// The inspection command failed for another reason.
  #[error("image inspection failed with exit code {code:?}: {stderr}")]
  InspectFailed { code: Option<i32>, stderr: String },

  /// The inspection succeeded but returned no identifier.
  #[error("local daemon returned an empty image ID for {image}")]
  EmptyId { image: String },
}

/// A local container daemon.
///
/// Implementations must be safe to share between concurrent builds.
#[async_trait]
pub trait LocalDaemon: Send + Sync {
  /// Short name for logs.
  fn name(&self) -> &str;

  /// The daemon-assigned ID of the image stored under `image` (`name:tag`).
  async fn image_id(&self, image: &str) -> Result<String, DaemonError>;
}
