//! Target platform parsing.
//!
//! Platforms use the `os/arch[/variant]` form understood by image
//! toolchains (e.g. `linux/arm64/v8`), or the literal `all`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Literal selecting every platform the base image provides.
pub const ALL_PLATFORMS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  #[error("invalid platform '{0}': expected os/arch[/variant] or 'all'")]
  Invalid(String),

  #[error("platform 'all' cannot be combined with other platforms")]
  AllCombined,
}

/// A single build target platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetPlatform {
  All,
  Specific {
    os: String,
    arch: String,
    variant: Option<String>,
  },
}

impl FromStr for TargetPlatform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == ALL_PLATFORMS {
      return Ok(Self::All);
    }

    let valid_part = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let parts: Vec<&str> = s.split('/').collect();
    if !(2..=3).contains(&parts.len()) || !parts.iter().all(|p| valid_part(p)) {
      return Err(PlatformError::Invalid(s.to_string()));
    }

    Ok(Self::Specific {
      os: parts[0].to_string(),
      arch: parts[1].to_string(),
      variant: parts.get(2).map(|v| v.to_string()),
    })
  }
}

impl fmt::Display for TargetPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => write!(f, "{}", ALL_PLATFORMS),
      Self::Specific { os, arch, variant: None } => write!(f, "{}/{}", os, arch),
      Self::Specific {
        os,
        arch,
        variant: Some(variant),
      } => write!(f, "{}/{}/{}", os, arch, variant),
    }
  }
}

/// Validate a list of platforms and join them with commas.
///
/// An empty list yields an empty string, leaving the choice to the toolchain.
pub fn join_platforms<S: AsRef<str>>(platforms: &[S]) -> Result<String, PlatformError> {
  let parsed = platforms
    .iter()
    .map(|p| p.as_ref().trim().parse::<TargetPlatform>())
    .collect::<Result<Vec<_>, _>>()?;

  if parsed.len() > 1 && parsed.contains(&TargetPlatform::All) {
    return Err(PlatformError::AllCombined);
  }

  Ok(parsed.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(","))
}
