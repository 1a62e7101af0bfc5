//! Implementation of the `koship resolve` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use koship_lib::artifact::Artifact;
use koship_lib::build::BuildOptions;
use koship_lib::build::import_path::resolve_import_path;
use koship_lib::config::{BuilderConfig, Capabilities};
use koship_lib::consts::USER_AGENT;
use koship_lib::toolchain::ToolchainError;

#[derive(Debug, Args)]
pub struct ResolveArgs {
  /// Declared image name: a bare name or a ko:// import path
  name: String,

  /// Go workspace the name is resolved in
  #[arg(short, long, default_value = ".")]
  workspace: PathBuf,

  /// Path to the go binary
  #[arg(long)]
  go: Option<PathBuf>,
}

/// Execute the resolve command.
///
/// Prints the `ko://` import path that a build of `name` would publish.
pub fn cmd_resolve(args: ResolveArgs) -> Result<()> {
  let mut config = BuilderConfig::from_env().context("Failed to read configuration from environment")?;
  if let Some(go) = args.go {
    config.go_binary = go;
  }
  let toolchain = Capabilities::from_config(&config).toolchain;

  let artifact = Artifact::new(args.name.clone()).with_workspace(args.workspace);
  let options = BuildOptions::from_artifact(&artifact, USER_AGENT)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let import_path: Result<String, ToolchainError> = rt.block_on(async {
    let builder = toolchain.new_builder(options).await?;
    resolve_import_path(&args.name, builder.as_ref()).await
  });
  let import_path = import_path.with_context(|| format!("Failed to resolve import path for {}", args.name))?;

  println!("{}", import_path);
  Ok(())
}
