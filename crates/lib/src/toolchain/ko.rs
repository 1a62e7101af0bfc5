//! `ko` CLI backed toolchain.
//!
//! Import paths are qualified with `go list` inside the workspace, and each
//! publish runs `ko build`, which compiles the package and either pushes the
//! image or loads it into the local daemon. `ko` prints the published
//! reference as the last line of its stdout.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::build::import_path::strip_scheme;
use crate::build::{BuildOptions, KoBuilder};
use crate::consts::KO_SCHEME_PREFIX;
use crate::publish::{PublishMode, PublishOptions, Publisher};
use crate::reference::{ImageReference, parse_reference};
use crate::util::process::{display_command, run_command};

use super::{Toolchain, ToolchainError};

/// Repository the image is published to.
const ENV_DOCKER_REPO: &str = "KO_DOCKER_REPO";
/// Base image override.
const ENV_DEFAULT_BASE_IMAGE: &str = "KO_DEFAULTBASEIMAGE";

/// Drives the `ko` and `go` executables.
#[derive(Debug, Clone)]
pub struct KoCli {
  ko_binary: PathBuf,
  go_binary: PathBuf,
}

impl KoCli {
  pub fn new(ko_binary: impl Into<PathBuf>, go_binary: impl Into<PathBuf>) -> Self {
    Self {
      ko_binary: ko_binary.into(),
      go_binary: go_binary.into(),
    }
  }
}

impl Default for KoCli {
  fn default() -> Self {
    Self::new("ko", "go")
  }
}

#[async_trait]
impl Toolchain for KoCli {
  fn name(&self) -> &str {
    "ko"
  }

  async fn new_builder(&self, options: BuildOptions) -> Result<Box<dyn KoBuilder>, ToolchainError> {
    let exists = tokio::fs::try_exists(&options.working_directory)
      .await
      .map_err(|source| ToolchainError::Workspace {
        path: options.working_directory.clone(),
        source,
      })?;
    if !exists {
      return Err(ToolchainError::WorkspaceNotFound(options.working_directory.clone()));
    }

    debug!(
      workspace = %options.working_directory.display(),
      platform = %options.platform,
      user_agent = %options.user_agent,
      "created ko builder"
    );
    Ok(Box::new(KoCliBuilder {
      options,
      go_binary: self.go_binary.clone(),
    }))
  }

  fn new_publisher(&self, options: PublishOptions) -> Result<Box<dyn Publisher>, ToolchainError> {
    debug!(destination = %options.destination(), tags = ?options.tags, "created ko publisher");
    Ok(Box::new(KoCliPublisher {
      options,
      ko_binary: self.ko_binary.clone(),
      closed: false,
    }))
  }
}

struct KoCliBuilder {
  options: BuildOptions,
  go_binary: PathBuf,
}

#[async_trait]
impl KoBuilder for KoCliBuilder {
  fn options(&self) -> &BuildOptions {
    &self.options
  }

  #[instrument(skip(self), fields(workspace = %self.options.working_directory.display()))]
  async fn qualify_import(&self, relative_path: &str) -> Result<String, ToolchainError> {
    let workspace = &self.options.working_directory;
    let args = ["list", "-f", "{{.ImportPath}}", relative_path];

    let output = run_command(&self.go_binary, args, &[], Some(workspace.as_path()))
      .await
      .map_err(|source| ToolchainError::Spawn {
        program: self.go_binary.clone(),
        source,
      })?;

    let qualify_error = |message: String| ToolchainError::Qualify {
      path: relative_path.to_string(),
      workspace: workspace.clone(),
      message,
    };

    if !output.success {
      return Err(qualify_error(output.stderr.clone()));
    }

    match output.last_line() {
      Some(package) => Ok(format!("{}{}", KO_SCHEME_PREFIX, package)),
      None => Err(qualify_error("no package found".to_string())),
    }
  }
}

struct KoCliPublisher {
  options: PublishOptions,
  ko_binary: PathBuf,
  closed: bool,
}

impl KoCliPublisher {
  fn build_args(&self, build: &BuildOptions, import_path: &str) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if self.options.bare {
      args.push("--bare".to_string());
    }
    args.push(format!("--jobs={}", build.concurrent_builds));
    args.push(format!("--tags={}", self.options.tags.join(",")));
    if !build.platform.is_empty() {
      args.push(format!("--platform={}", build.platform));
    }
    match self.options.mode {
      PublishMode::Push => args.push("--push=true".to_string()),
      PublishMode::Local { .. } => args.push("--local".to_string()),
    }
    args.push(strip_scheme(import_path).to_string());
    args
  }

  fn build_env(&self, build: &BuildOptions) -> Vec<(&'static str, String)> {
    let mut envs = vec![(ENV_DOCKER_REPO, self.options.destination().to_string())];
    if let Some(base_image) = &build.base_image {
      envs.push((ENV_DEFAULT_BASE_IMAGE, base_image.clone()));
    }
    envs
  }
}

#[async_trait]
impl Publisher for KoCliPublisher {
  fn options(&self) -> &PublishOptions {
    &self.options
  }

  #[instrument(skip(self, builder), fields(destination = %self.options.destination()))]
  async fn publish(&self, builder: &dyn KoBuilder, import_path: &str) -> Result<ImageReference, ToolchainError> {
    if self.closed {
      return Err(ToolchainError::Publish {
        import_path: import_path.to_string(),
        message: "publisher is closed".to_string(),
      });
    }

    let build = builder.options();
    let args = self.build_args(build, import_path);
    let envs = self.build_env(build);
    let cmd = display_command(&self.ko_binary, &args);
    info!(cmd = %cmd, "running ko build");

    let output = run_command(&self.ko_binary, &args, &envs, Some(build.working_directory.as_path()))
      .await
      .map_err(|source| ToolchainError::Spawn {
        program: self.ko_binary.clone(),
        source,
      })?;

    if !output.success {
      return Err(ToolchainError::CmdFailed {
        cmd,
        code: output.code,
        stderr: output.stderr,
      });
    }

    let line = output.last_line().ok_or_else(|| ToolchainError::MissingOutput { cmd: cmd.clone() })?;
    Ok(parse_reference(line)?)
  }

  fn close(&mut self) -> Result<(), ToolchainError> {
    self.closed = true;
    Ok(())
  }
}
