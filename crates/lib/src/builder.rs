//! Single-artifact build orchestration.
//!
//! [`ArtifactBuilder::build`] walks one artifact through a fixed sequence:
//!
//! 1. construct a builder handle from the artifact's settings
//! 2. construct a publisher handle for the target image name
//! 3. resolve the artifact's import path
//! 4. build and publish that import path
//! 5. resolve the published image's identifier
//!
//! Every step fails fast with an [`ArtifactBuildError`] naming the artifact
//! and the step. Nothing is retried. The publisher is released on every exit
//! path, and the caller's writer only sees output once the build has fully
//! succeeded.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::artifact::Artifact;
use crate::build::BuildOptions;
use crate::build::import_path::resolve_import_path;
use crate::consts::USER_AGENT;
use crate::identity::{IdentityError, resolve_identity};
use crate::publish::{PublishOptions, PublishTarget, PublisherGuard};
use crate::toolchain::{Toolchain, ToolchainError};

/// Coarse classification of build failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
  /// Builder or publisher handles could not be created.
  Construction,
  /// The import path could not be determined.
  Resolution,
  /// Building, publishing, or reporting the result failed.
  Execution,
  /// The image was published but its identifier could not be read.
  Identity,
}

impl fmt::Display for BuildPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Construction => "construction",
      Self::Resolution => "resolution",
      Self::Execution => "execution",
      Self::Identity => "identity",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Error)]
pub enum ArtifactBuildError {
  #[error("error creating builder for {artifact}: {source}")]
  CreateBuilder {
    artifact: String,
    #[source]
    source: ToolchainError,
  },

  #[error("error creating publisher for {artifact}: {source}")]
  CreatePublisher {
    artifact: String,
    #[source]
    source: ToolchainError,
  },

  #[error("could not determine import path for {artifact}: {source}")]
  ImportPath {
    artifact: String,
    #[source]
    source: ToolchainError,
  },

  #[error("failed to build and publish {artifact}: {source}")]
  Publish {
    artifact: String,
    #[source]
    source: ToolchainError,
  },

  #[error("no image was published for {artifact}: import path {import_path} not among {published:?}")]
  MissingImage {
    artifact: String,
    import_path: String,
    published: Vec<String>,
  },

  #[error("published {artifact} but could not identify it: {source}")]
  Identity {
    artifact: String,
    #[source]
    source: IdentityError,
  },

  #[error("failed to report result for {artifact}: {source}")]
  Output {
    artifact: String,
    #[source]
    source: std::io::Error,
  },
}

impl ArtifactBuildError {
  pub fn phase(&self) -> BuildPhase {
    match self {
      Self::CreateBuilder { .. } | Self::CreatePublisher { .. } => BuildPhase::Construction,
      Self::ImportPath { .. } => BuildPhase::Resolution,
      Self::Publish { .. } | Self::MissingImage { .. } | Self::Output { .. } => BuildPhase::Execution,
      Self::Identity { .. } => BuildPhase::Identity,
    }
  }
}

/// Builds artifacts with a toolchain and publishes them to a fixed target.
///
/// Holds only shared handles to stateless capabilities; clones and
/// concurrent builds share nothing mutable.
#[derive(Clone)]
pub struct ArtifactBuilder {
  toolchain: Arc<dyn Toolchain>,
  target: PublishTarget,
  user_agent: String,
}

impl ArtifactBuilder {
  pub fn new(toolchain: Arc<dyn Toolchain>, target: PublishTarget) -> Self {
    Self {
      toolchain,
      target,
      user_agent: USER_AGENT.to_string(),
    }
  }

  /// Whether images are pushed to a registry rather than sideloaded.
  pub fn push_images(&self) -> bool {
    self.target.is_push()
  }

  /// Build `artifact` and publish it as `full_image_name_with_tag`.
  ///
  /// On success writes the published reference's display name to `out` as a
  /// single line and returns the image identifier: the registry tag or
  /// digest when pushing, the daemon's image ID when sideloading. On failure
  /// nothing is written.
  #[instrument(
    skip(self, out, artifact),
    fields(artifact = %artifact.image_name, toolchain = %self.toolchain.name())
  )]
  pub async fn build<W>(
    &self,
    out: &mut W,
    artifact: &Artifact,
    full_image_name_with_tag: &str,
  ) -> Result<String, ArtifactBuildError>
  where
    W: Write + Send + ?Sized,
  {
    let name = artifact.image_name.as_str();

    let build_options = BuildOptions::from_artifact(artifact, &self.user_agent).map_err(|source| {
      ArtifactBuildError::CreateBuilder {
        artifact: name.to_string(),
        source,
      }
    })?;
    let builder = self
      .toolchain
      .new_builder(build_options)
      .await
      .map_err(|source| ArtifactBuildError::CreateBuilder {
        artifact: name.to_string(),
        source,
      })?;

    let publish_options = PublishOptions::for_image(full_image_name_with_tag, &self.target, &self.user_agent)
      .map_err(|source| ArtifactBuildError::CreatePublisher {
        artifact: name.to_string(),
        source,
      })?;
    info!(
      destination = %publish_options.destination(),
      push = publish_options.is_push(),
      "created build handles"
    );
    let publisher = PublisherGuard::new(self.toolchain.new_publisher(publish_options).map_err(|source| {
      ArtifactBuildError::CreatePublisher {
        artifact: name.to_string(),
        source,
      }
    })?);

    let import_path = resolve_import_path(name, builder.as_ref())
      .await
      .map_err(|source| ArtifactBuildError::ImportPath {
        artifact: name.to_string(),
        source,
      })?;
    info!(import_path = %import_path, "resolved import path");

    let mut images = self
      .toolchain
      .publish_images(std::slice::from_ref(&import_path), &*publisher, builder.as_ref())
      .await
      .map_err(|source| ArtifactBuildError::Publish {
        artifact: name.to_string(),
        source,
      })?;
    let Some(reference) = images.remove(&import_path) else {
      return Err(ArtifactBuildError::MissingImage {
        artifact: name.to_string(),
        import_path,
        published: images.into_keys().collect(),
      });
    };
    info!(reference = %reference, "published image");

    let identifier = resolve_identity(&self.target, &reference, full_image_name_with_tag)
      .await
      .map_err(|source| ArtifactBuildError::Identity {
        artifact: name.to_string(),
        source,
      })?;

    writeln!(out, "{}", reference.name()).map_err(|source| ArtifactBuildError::Output {
      artifact: name.to_string(),
      source,
    })?;
    info!(identifier = %identifier, "build complete");

    Ok(identifier)
  }
}
