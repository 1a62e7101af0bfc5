//! Image reference parsing.
//!
//! Wraps [`oci_distribution::Reference`] with the three views the build
//! pipeline needs:
//! - `name()`: the display name written to the caller on success
//! - `context_name()`: the bare repository, used as the publish destination
//! - `identifier()`: the digest or tag, used as the pushed image identity

use std::fmt;
use std::str::FromStr;

use oci_distribution::Reference;
use thiserror::Error;

use crate::consts::DEFAULT_TAG;

/// Errors that can occur while parsing an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
  /// The reference string was empty.
  #[error("image reference is empty")]
  Empty,

  /// The reference string is not a valid `repository[:tag][@digest]`.
  #[error("invalid image reference '{reference}': {reason}")]
  Invalid { reference: String, reason: String },
}

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
  inner: Reference,
}

impl ImageReference {
  /// Registry host, e.g. `gcr.io`.
  pub fn registry(&self) -> &str {
    self.inner.registry()
  }

  /// Repository path below the registry, e.g. `project-id/app`.
  pub fn repository(&self) -> &str {
    self.inner.repository()
  }

  pub fn tag(&self) -> Option<&str> {
    self.inner.tag()
  }

  pub fn digest(&self) -> Option<&str> {
    self.inner.digest()
  }

  /// The repository without tag or digest, e.g. `gcr.io/project-id/app`.
  pub fn context_name(&self) -> String {
    format!("{}/{}", self.registry(), self.repository())
  }

  /// The digest if the reference carries one, otherwise the tag.
  ///
  /// A reference with neither reports `latest`.
  pub fn identifier(&self) -> &str {
    self.digest().or(self.tag()).unwrap_or(DEFAULT_TAG)
  }

  /// The human-readable name including tag and digest.
  pub fn name(&self) -> String {
    let mut name = self.context_name();
    match (self.tag(), self.digest()) {
      (None, None) => {
        name.push(':');
        name.push_str(DEFAULT_TAG);
      }
      (tag, digest) => {
        if let Some(tag) = tag {
          name.push(':');
          name.push_str(tag);
        }
        if let Some(digest) = digest {
          name.push('@');
          name.push_str(digest);
        }
      }
    }
    name
  }
}

impl fmt::Display for ImageReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for ImageReference {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_reference(s)
  }
}

/// Parse `repository[:tag][@digest]` into an [`ImageReference`].
///
/// Names without a registry are normalized to Docker Hub the same way
/// registries resolve them (`app` becomes `docker.io/library/app`).
pub fn parse_reference(reference: &str) -> Result<ImageReference, ReferenceError> {
  let trimmed = reference.trim();
  if trimmed.is_empty() {
    return Err(ReferenceError::Empty);
  }
  if trimmed != reference {
    return Err(ReferenceError::Invalid {
      reference: reference.to_string(),
      reason: "surrounding whitespace".to_string(),
    });
  }

  let inner = Reference::try_from(reference).map_err(|e| ReferenceError::Invalid {
    reference: reference.to_string(),
    reason: e.to_string(),
  })?;

  Ok(ImageReference { inner })
}
