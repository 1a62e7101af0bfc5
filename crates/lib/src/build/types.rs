use std::path::PathBuf;

use crate::artifact::Artifact;
use crate::platform::join_platforms;
use crate::reference::parse_reference;
use crate::toolchain::ToolchainError;

use super::CONCURRENT_BUILDS;

/// Options for constructing a builder handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
  /// Base image override, validated as an image reference.
  pub base_image: Option<String>,

  pub concurrent_builds: usize,

  /// Comma-joined target platforms; empty leaves the choice to the toolchain.
  pub platform: String,

  /// Client identification string.
  pub user_agent: String,

  /// Directory that workspace-relative paths are resolved against.
  pub working_directory: PathBuf,
}

impl BuildOptions {
  /// Derive build options from an artifact.
  ///
  /// Fails fast on a malformed base image or platform; nothing external is
  /// touched.
  pub fn from_artifact(artifact: &Artifact, user_agent: &str) -> Result<Self, ToolchainError> {
    let base_image = match artifact.ko.base_image.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(image) => {
        parse_reference(image).map_err(ToolchainError::InvalidBaseImage)?;
        Some(image.to_string())
      }
    };

    let working_directory = if artifact.workspace.as_os_str().is_empty() {
      PathBuf::from(".")
    } else {
      artifact.workspace.clone()
    };

    Ok(Self {
      base_image,
      concurrent_builds: CONCURRENT_BUILDS,
      platform: join_platforms(&artifact.ko.platforms)?,
      user_agent: user_agent.to_string(),
      working_directory,
    })
  }
}
