//! Import path resolution.
//!
//! A declared image name is either already a `ko://` import path, or a bare
//! name whose import path has to be derived from the workspace.

use tracing::debug;

use crate::consts::KO_SCHEME_PREFIX;
use crate::toolchain::ToolchainError;

use super::KoBuilder;

/// Returns true if `name` carries the `ko://` scheme prefix.
pub fn is_import_path(name: &str) -> bool {
  name.starts_with(KO_SCHEME_PREFIX)
}

/// Strip the `ko://` scheme prefix, if present.
pub fn strip_scheme(import_path: &str) -> &str {
  import_path.strip_prefix(KO_SCHEME_PREFIX).unwrap_or(import_path)
}

/// Resolve the import path to build for a declared image name.
///
/// Prefixed names are returned unchanged without inspecting the workspace.
/// Anything else is qualified once from the builder's working directory.
pub async fn resolve_import_path(image_name: &str, builder: &dyn KoBuilder) -> Result<String, ToolchainError> {
  if is_import_path(image_name) {
    debug!(image = %image_name, "image name is already an import path");
    return Ok(image_name.to_string());
  }

  let import_path = builder.qualify_import(".").await?;
  debug!(image = %image_name, import_path = %import_path, "qualified import path from workspace");
  Ok(import_path)
}
