//! Implementation of the `koship build` command.
//!
//! Builds one artifact with ko and either pushes the image to its registry or
//! sideloads it into the local daemon.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use serde::Serialize;
use tracing::info;

use koship_lib::artifact::{Artifact, KoArtifact};
use koship_lib::config::{BuilderConfig, Capabilities};

use crate::output::{OutputFormat, format_duration, print_json, print_step, print_success, truncate_id};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Declared image name: a bare name or a ko:// import path
  #[arg(long)]
  image: Option<String>,

  /// Full target image name including tag, e.g. gcr.io/project/app:v1
  #[arg(short, long)]
  tag: String,

  /// Go workspace containing the artifact
  #[arg(short, long)]
  workspace: Option<PathBuf>,

  /// Base image override
  #[arg(long)]
  base_image: Option<String>,

  /// Target platforms (os/arch[/variant] or "all"); repeatable or comma-separated
  #[arg(long, value_delimiter = ',')]
  platform: Vec<String>,

  /// Push to the registry instead of loading into the local daemon
  #[arg(long)]
  push: bool,

  /// Read the artifact descriptor from a JSON file; flags override its fields
  #[arg(long)]
  artifact: Option<PathBuf>,

  /// Abort the build after this long, e.g. 90s or 5m
  #[arg(long, value_parser = humantime::parse_duration)]
  timeout: Option<Duration>,

  /// Path to the ko binary
  #[arg(long)]
  ko: Option<PathBuf>,

  /// Path to the go binary
  #[arg(long)]
  go: Option<PathBuf>,

  /// Path to the docker binary
  #[arg(long)]
  docker: Option<PathBuf>,

  /// Output format
  #[arg(short, long, value_enum, default_value_t)]
  output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct BuildReport {
  image: String,
  identifier: String,
  pushed: bool,
  duration_ms: u128,
}

impl BuildArgs {
  fn config(&self) -> Result<BuilderConfig> {
    let mut config = BuilderConfig::from_env().context("Failed to read configuration from environment")?;
    if self.push {
      config.push_images = true;
    }
    if let Some(ko) = &self.ko {
      config.ko_binary = ko.clone();
    }
    if let Some(go) = &self.go {
      config.go_binary = go.clone();
    }
    if let Some(docker) = &self.docker {
      config.docker_binary = docker.clone();
    }
    Ok(config)
  }

  fn artifact(&self) -> Result<Artifact> {
    let mut artifact = match (&self.artifact, &self.image) {
      (Some(path), _) => {
        Artifact::from_file(path).with_context(|| format!("Failed to load artifact {}", path.display()))?
      }
      (None, Some(image)) => Artifact::new(image.clone()),
      (None, None) => bail!("either --image or --artifact is required"),
    };

    if let Some(image) = &self.image {
      artifact.image_name = image.clone();
    }
    if let Some(workspace) = &self.workspace {
      artifact.workspace = workspace.clone();
    }
    if self.base_image.is_some() || !self.platform.is_empty() {
      artifact.ko = KoArtifact {
        base_image: self.base_image.clone().or(artifact.ko.base_image),
        platforms: if self.platform.is_empty() {
          artifact.ko.platforms
        } else {
          self.platform.clone()
        },
      };
    }

    artifact.validate()?;
    Ok(artifact)
  }
}

/// Execute the build command.
///
/// On success the published image name is printed to stdout (text mode) or
/// a JSON report is printed (json mode). Failures report the build phase
/// that failed and exit non-zero.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let config = args.config()?;
  let artifact = args.artifact()?;
  let builder = Capabilities::from_config(&config).artifact_builder();

  if !args.output.is_json() {
    let mode = if builder.push_images() { "push" } else { "sideload" };
    print_step(&format!("Building {} ({})", artifact.image_name, mode));
  }
  info!(artifact = %artifact.image_name, tag = %args.tag, push = builder.push_images(), "starting build");

  let started = Instant::now();
  let mut published = Vec::new();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(async {
    let build = builder.build(&mut published, &artifact, &args.tag);
    match args.timeout {
      Some(limit) => match tokio::time::timeout(limit, build).await {
        Ok(result) => result.map_err(anyhow::Error::from),
        Err(_) => Err(anyhow!("build timed out after {}", humantime::format_duration(limit))),
      },
      None => build.await.map_err(anyhow::Error::from),
    }
  });

  let identifier = match result {
    Ok(identifier) => identifier,
    Err(err) => {
      let phase = err
        .downcast_ref::<koship_lib::ArtifactBuildError>()
        .map(|e| e.phase().to_string())
        .unwrap_or_else(|| "timeout".to_string());
      return Err(err.context(format!("Build failed during {}", phase)));
    }
  };

  let image = String::from_utf8(published).context("Published image name is not valid UTF-8")?;
  let elapsed = started.elapsed();

  if args.output.is_json() {
    print_json(&BuildReport {
      image: image.trim_end().to_string(),
      identifier,
      pushed: builder.push_images(),
      duration_ms: elapsed.as_millis(),
    })?;
  } else {
    print!("{}", image);
    print_success(&format!(
      "Built {} in {}",
      truncate_id(&identifier),
      format_duration(elapsed)
    ));
  }

  Ok(())
}
