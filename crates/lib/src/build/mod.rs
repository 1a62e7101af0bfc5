//! Build-time options and the builder capability.
//!
//! A builder handle is configured once per artifact from its
//! [`BuildOptions`]. It knows how to qualify a workspace-relative path into
//! a `ko://` import path; compilation itself happens when the handle is
//! passed to a publisher.
//!
//! # Submodules
//!
//! - [`import_path`] - resolving a declared image name to an import path

pub mod import_path;
mod types;

pub use types::*;

use async_trait::async_trait;

use crate::toolchain::ToolchainError;

/// Number of concurrent compilations per artifact.
///
/// Fixed at one: parallelism across artifacts belongs to the caller, which
/// runs one independent build per artifact.
pub const CONCURRENT_BUILDS: usize = 1;

/// A configured build handle.
#[async_trait]
pub trait KoBuilder: Send + Sync {
  /// The options this handle was constructed with.
  fn options(&self) -> &BuildOptions;

  /// Qualify a path relative to the working directory into a `ko://` import path.
  async fn qualify_import(&self, relative_path: &str) -> Result<String, ToolchainError>;
}
