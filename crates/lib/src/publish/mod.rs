//! Publish-time options and the publisher capability.
//!
//! A build either pushes to a registry or sideloads into a local daemon.
//! The choice is made once, on the [`PublishTarget`], and every
//! [`PublishOptions`] derived from it carries exactly one [`PublishMode`].
//!
//! # Submodules
//!
//! - [`guard`] - scoped release of publisher handles

pub mod guard;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::build::KoBuilder;
use crate::daemon::LocalDaemon;
use crate::reference::{ImageReference, parse_reference};
use crate::toolchain::ToolchainError;

pub use guard::PublisherGuard;

/// Published images keyed by import path.
pub type ImageMap = BTreeMap<String, ImageReference>;

/// Where built images end up.
#[derive(Clone)]
pub enum PublishTarget {
  /// Push to the registry named by the image reference.
  Push,

  /// Load into a local daemon, which also assigns the image identifier.
  Sideload { daemon: Arc<dyn LocalDaemon> },
}

impl PublishTarget {
  pub fn sideload(daemon: Arc<dyn LocalDaemon>) -> Self {
    Self::Sideload { daemon }
  }

  pub fn is_push(&self) -> bool {
    matches!(self, Self::Push)
  }
}

impl fmt::Debug for PublishTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Push => write!(f, "Push"),
      Self::Sideload { daemon } => f.debug_struct("Sideload").field("daemon", &daemon.name()).finish(),
    }
  }
}

/// Publication mode for a single publisher handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishMode {
  Push,
  Local { local_domain: String },
}

/// Options for constructing a publisher handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
  /// Publish to the repository as-is, without appending the import path.
  pub bare: bool,

  /// Destination repository without tag.
  pub docker_repo: String,

  pub mode: PublishMode,

  /// Tags applied to the published image; always exactly one.
  pub tags: Vec<String>,

  /// Client identification string.
  pub user_agent: String,
}

impl PublishOptions {
  /// Derive publish options from the full target image name.
  ///
  /// The repository comes from the reference without its tag, and the tag
  /// from its identifier.
  pub fn for_image(
    full_image_name_with_tag: &str,
    target: &PublishTarget,
    user_agent: &str,
  ) -> Result<Self, ToolchainError> {
    let reference = parse_reference(full_image_name_with_tag)?;
    let repository = reference.context_name();

    let mode = match target {
      PublishTarget::Push => PublishMode::Push,
      PublishTarget::Sideload { .. } => PublishMode::Local {
        local_domain: repository.clone(),
      },
    };

    Ok(Self {
      bare: true,
      docker_repo: repository,
      mode,
      tags: vec![reference.identifier().to_string()],
      user_agent: user_agent.to_string(),
    })
  }

  pub fn is_push(&self) -> bool {
    matches!(self.mode, PublishMode::Push)
  }

  pub fn is_local(&self) -> bool {
    matches!(self.mode, PublishMode::Local { .. })
  }

  /// Repository the toolchain should publish into.
  ///
  /// In local mode this is the local domain, otherwise the docker repo.
  pub fn destination(&self) -> &str {
    match &self.mode {
      PublishMode::Push => &self.docker_repo,
      PublishMode::Local { local_domain } => local_domain,
    }
  }
}

/// A configured publisher handle.
///
/// Handles may hold connections or temporary state and must be closed; use
/// [`PublisherGuard`] to tie the release to a scope.
#[async_trait]
pub trait Publisher: Send + Sync {
  /// The options this handle was constructed with.
  fn options(&self) -> &PublishOptions;

  /// Build `import_path` with `builder` and publish the result.
  async fn publish(&self, builder: &dyn KoBuilder, import_path: &str) -> Result<ImageReference, ToolchainError>;

  /// Release any resources held by the handle.
  fn close(&mut self) -> Result<(), ToolchainError>;
}

/// Build and publish each import path, failing on the first error.
pub async fn publish_images(
  import_paths: &[String],
  publisher: &dyn Publisher,
  builder: &dyn KoBuilder,
) -> Result<ImageMap, ToolchainError> {
  let mut images = ImageMap::new();
  for import_path in import_paths {
    let reference = publisher.publish(builder, import_path).await?;
    debug!(import_path = %import_path, reference = %reference, "published image");
    images.insert(import_path.clone(), reference);
  }
  Ok(images)
}
