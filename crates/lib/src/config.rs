//! Builder configuration and capability wiring.
//!
//! Configuration is an explicit value: it is read once (from defaults, the
//! environment, or CLI flags) and turned into concrete capabilities with
//! [`Capabilities::from_config`]. Nothing here holds process-wide state.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::builder::ArtifactBuilder;
use crate::consts::{ENV_DOCKER, ENV_GO, ENV_KO, ENV_PUSH};
use crate::daemon::{DockerCli, LocalDaemon};
use crate::publish::PublishTarget;
use crate::toolchain::{KoCli, Toolchain};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value for {var}: '{value}' (expected true or false)")]
  InvalidBool { var: &'static str, value: String },
}

/// Settings that select and locate the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
  /// Push to the registry instead of sideloading into the local daemon.
  pub push_images: bool,
  pub ko_binary: PathBuf,
  pub go_binary: PathBuf,
  pub docker_binary: PathBuf,
}

impl Default for BuilderConfig {
  fn default() -> Self {
    Self {
      push_images: false,
      ko_binary: PathBuf::from("ko"),
      go_binary: PathBuf::from("go"),
      docker_binary: PathBuf::from("docker"),
    }
  }
}

impl BuilderConfig {
  /// Defaults overridden by `KOSHIP_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(value) = std::env::var(ENV_PUSH) {
      config.push_images = parse_bool(ENV_PUSH, &value)?;
    }
    if let Some(path) = env_path(ENV_KO) {
      config.ko_binary = path;
    }
    if let Some(path) = env_path(ENV_GO) {
      config.go_binary = path;
    }
    if let Some(path) = env_path(ENV_DOCKER) {
      config.docker_binary = path;
    }

    Ok(config)
  }
}

fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "" | "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(ConfigError::InvalidBool {
      var,
      value: value.to_string(),
    }),
  }
}

/// Concrete capabilities selected by a [`BuilderConfig`].
#[derive(Clone)]
pub struct Capabilities {
  pub toolchain: Arc<dyn Toolchain>,
  pub daemon: Arc<dyn LocalDaemon>,
  push_images: bool,
}

impl Capabilities {
  pub fn from_config(config: &BuilderConfig) -> Self {
    Self {
      toolchain: Arc::new(KoCli::new(&config.ko_binary, &config.go_binary)),
      daemon: Arc::new(DockerCli::new(&config.docker_binary)),
      push_images: config.push_images,
    }
  }

  pub fn publish_target(&self) -> PublishTarget {
    if self.push_images {
      PublishTarget::Push
    } else {
      PublishTarget::sideload(self.daemon.clone())
    }
  }

  pub fn artifact_builder(&self) -> ArtifactBuilder {
    ArtifactBuilder::new(self.toolchain.clone(), self.publish_target())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
    let vars: Vec<(&str, Option<&str>)> = [ENV_PUSH, ENV_KO, ENV_GO, ENV_DOCKER]
      .into_iter()
      .map(|name| (name, vars.iter().find(|(k, _)| *k == name).and_then(|(_, v)| *v)))
      .collect();
    temp_env::with_vars(vars, f);
  }

  #[test]
  #[serial]
  fn from_env_defaults() {
    with_env(&[], || {
      assert_eq!(BuilderConfig::from_env().unwrap(), BuilderConfig::default());
    });
  }

  #[test]
  #[serial]
  fn from_env_overrides() {
    with_env(
      &[
        (ENV_PUSH, Some("true")),
        (ENV_KO, Some("/opt/bin/ko")),
        (ENV_GO, Some("/usr/local/go/bin/go")),
        (ENV_DOCKER, Some("/usr/bin/podman")),
      ],
      || {
        let config = BuilderConfig::from_env().unwrap();
        assert!(config.push_images);
        assert_eq!(config.ko_binary, PathBuf::from("/opt/bin/ko"));
        assert_eq!(config.go_binary, PathBuf::from("/usr/local/go/bin/go"));
        assert_eq!(config.docker_binary, PathBuf::from("/usr/bin/podman"));
      },
    );
  }

  #[test]
  #[serial]
  fn from_env_empty_binary_keeps_default() {
    with_env(&[(ENV_KO, Some(""))], || {
      assert_eq!(BuilderConfig::from_env().unwrap().ko_binary, PathBuf::from("ko"));
    });
  }

  #[test]
  #[serial]
  fn from_env_rejects_bad_bool() {
    with_env(&[(ENV_PUSH, Some("maybe"))], || {
      let err = BuilderConfig::from_env().unwrap_err();
      assert!(matches!(err, ConfigError::InvalidBool { var: ENV_PUSH, .. }));
    });
  }

  #[test]
  fn capabilities_select_target() {
    let local = Capabilities::from_config(&BuilderConfig::default());
    assert!(!local.artifact_builder().push_images());
    assert_eq!(local.toolchain.name(), "ko");
    assert_eq!(local.daemon.name(), "docker");

    let push = Capabilities::from_config(&BuilderConfig {
      push_images: true,
      ..BuilderConfig::default()
    });
    assert!(push.artifact_builder().push_images());
  }
}
