//! Image toolchain capability.
//!
//! A toolchain constructs builder and publisher handles and drives the
//! combined build-and-publish step. The orchestrator only talks to this
//! trait, so tests substitute deterministic fakes.
//!
//! # Submodules
//!
//! - [`ko`] - `ko` CLI backed implementation

pub mod ko;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::build::{BuildOptions, KoBuilder};
use crate::platform::PlatformError;
use crate::publish::{ImageMap, PublishOptions, Publisher, publish_images};
use crate::reference::ReferenceError;

pub use ko::KoCli;

/// Errors raised by the toolchain or while preparing its options.
#[derive(Debug, Error)]
pub enum ToolchainError {
  /// The configured base image is not a valid image reference.
  #[error("invalid base image: {0}")]
  InvalidBaseImage(#[source] ReferenceError),

  /// A target platform is malformed.
  #[error("invalid target platform: {0}")]
  InvalidPlatform(#[from] PlatformError),

  /// An image reference (target name or toolchain output) is malformed.
  #[error("invalid image reference: {0}")]
  InvalidReference(#[from] ReferenceError),

  /// The working directory does not exist.
  #[error("workspace does not exist: {0}")]
  WorkspaceNotFound(PathBuf),

  /// The working directory could not be checked.
  #[error("failed to access workspace {path}: {source}")]
  Workspace {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// No buildable package could be found for a path in the workspace.
  #[error("failed to qualify import path for '{path}' in {workspace}: {message}")]
  Qualify {
    path: String,
    workspace: PathBuf,
    message: String,
  },

  /// A toolchain executable could not be started.
  #[error("failed to run '{program}': {source}")]
  Spawn {
    program: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A toolchain command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}: {stderr}")]
  CmdFailed {
    cmd: String,
    code: Option<i32>,
    stderr: String,
  },

  /// A toolchain command succeeded without printing an image reference.
  #[error("command produced no image reference: {cmd}")]
  MissingOutput { cmd: String },

  /// Publishing an import path failed.
  #[error("failed to publish {import_path}: {message}")]
  Publish { import_path: String, message: String },

  /// Releasing a publisher handle failed.
  #[error("failed to release publisher: {0}")]
  Close(String),
}

/// Constructs build and publish handles for one artifact at a time.
#[async_trait]
pub trait Toolchain: Send + Sync {
  /// Short name for logs.
  fn name(&self) -> &str;

  /// Construct a builder handle.
  async fn new_builder(&self, options: BuildOptions) -> Result<Box<dyn KoBuilder>, ToolchainError>;

  /// Construct a publisher handle.
  fn new_publisher(&self, options: PublishOptions) -> Result<Box<dyn Publisher>, ToolchainError>;

  /// Build and publish `import_paths`, returning the published reference of each.
  async fn publish_images(
    &self,
    import_paths: &[String],
    publisher: &dyn Publisher,
    builder: &dyn KoBuilder,
  ) -> Result<ImageMap, ToolchainError> {
    publish_images(import_paths, publisher, builder).await
  }
}
