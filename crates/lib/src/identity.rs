//! Image identity resolution.
//!
//! After a successful publish the image identifier comes from whichever side
//! is authoritative: the registry for pushed images (the reference's digest
//! or tag), the local daemon for sideloaded ones.

use thiserror::Error;
use tracing::debug;

use crate::daemon::DaemonError;
use crate::publish::PublishTarget;
use crate::reference::ImageReference;

#[derive(Debug, Error)]
pub enum IdentityError {
  /// The image was published but the local daemon could not identify it.
  #[error("could not get image ID from local daemon '{daemon}' for image {image}: {source}")]
  LocalDaemon {
    daemon: String,
    image: String,
    #[source]
    source: DaemonError,
  },
}

/// Resolve the identifier of a published image.
pub async fn resolve_identity(
  target: &PublishTarget,
  reference: &ImageReference,
  full_image_name_with_tag: &str,
) -> Result<String, IdentityError> {
  match target {
    PublishTarget::Push => {
      let identifier = reference.identifier().to_string();
      debug!(reference = %reference, identifier = %identifier, "using registry identifier");
      Ok(identifier)
    }
    PublishTarget::Sideload { daemon } => {
      let identifier =
        daemon
          .image_id(full_image_name_with_tag)
          .await
          .map_err(|source| IdentityError::LocalDaemon {
            daemon: daemon.name().to_string(),
            image: full_image_name_with_tag.to_string(),
            source,
          })?;
      debug!(image = %full_image_name_with_tag, identifier = %identifier, "using local daemon image ID");
      Ok(identifier)
    }
  }
}
