//! Artifact descriptors.
//!
//! An artifact names one buildable Go unit: the declared image name (a bare
//! name or a `ko://` import path), the workspace it lives in, and the
//! ko-specific build settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to read artifact file '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse artifact file '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("artifact image name is empty")]
  EmptyImageName,
}

/// ko-specific build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KoArtifact {
  /// Base image override; the toolchain default is used when unset.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_image: Option<String>,

  /// Target platforms in `os/arch[/variant]` form.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub platforms: Vec<String>,
}

/// A buildable unit, immutable for the duration of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
  pub image_name: String,

  #[serde(default = "default_workspace")]
  pub workspace: PathBuf,

  #[serde(default)]
  pub ko: KoArtifact,
}

fn default_workspace() -> PathBuf {
  PathBuf::from(".")
}

impl Artifact {
  /// Create an artifact rooted at the current directory with default settings.
  pub fn new(image_name: impl Into<String>) -> Self {
    Self {
      image_name: image_name.into(),
      workspace: default_workspace(),
      ko: KoArtifact::default(),
    }
  }

  pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
    self.workspace = workspace.into();
    self
  }

  pub fn with_ko(mut self, ko: KoArtifact) -> Self {
    self.ko = ko;
    self
  }

  /// Load an artifact from a JSON document.
  ///
  /// A relative `workspace` is resolved against the file's directory.
  pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut artifact: Artifact = serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if artifact.workspace.is_relative()
      && let Some(parent) = path.parent()
    {
      artifact.workspace = parent.join(&artifact.workspace);
    }

    artifact.validate()?;
    Ok(artifact)
  }

  pub fn validate(&self) -> Result<(), ArtifactError> {
    if self.image_name.trim().is_empty() {
      return Err(ArtifactError::EmptyImageName);
    }
    Ok(())
  }
}
