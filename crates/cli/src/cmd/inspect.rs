use anyhow::{Context, Result};
use serde::Serialize;

use koship_lib::reference::parse_reference;

use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Debug, Serialize)]
struct ReferenceInfo {
  name: String,
  registry: String,
  repository: String,
  tag: Option<String>,
  digest: Option<String>,
  identifier: String,
}

pub fn cmd_inspect(reference: &str, output: OutputFormat) -> Result<()> {
  let parsed = parse_reference(reference).with_context(|| format!("Invalid image reference '{}'", reference))?;

  let info = ReferenceInfo {
    name: parsed.name(),
    registry: parsed.registry().to_string(),
    repository: parsed.repository().to_string(),
    tag: parsed.tag().map(str::to_string),
    digest: parsed.digest().map(str::to_string),
    identifier: parsed.identifier().to_string(),
  };

  if output.is_json() {
    return print_json(&info);
  }

  println!("{}", info.name);
  print_stat("Registry", &info.registry);
  print_stat("Repository", &info.repository);
  print_stat("Tag", info.tag.as_deref().unwrap_or("-"));
  print_stat("Digest", info.digest.as_deref().unwrap_or("-"));
  print_stat("Identifier", &info.identifier);

  Ok(())
}
