//! Test doubles for the toolchain and daemon capabilities.
//!
//! The fakes are deterministic and record how they were called so tests can
//! assert on call counts and arguments.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::build::{BuildOptions, KoBuilder};
use crate::consts::USER_AGENT;
use crate::daemon::{DaemonError, LocalDaemon};
use crate::publish::{ImageMap, PublishOptions, PublishTarget, Publisher};
use crate::reference::{ImageReference, parse_reference};
use crate::toolchain::{Toolchain, ToolchainError};

/// Shared call counter.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
  pub fn incr(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }

  pub fn get(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

fn default_build_options() -> BuildOptions {
  BuildOptions {
    base_image: None,
    concurrent_builds: 1,
    platform: String::new(),
    user_agent: USER_AGENT.to_string(),
    working_directory: PathBuf::from("."),
  }
}

/// A builder whose qualification result is fixed.
pub struct FakeBuilder {
  options: BuildOptions,
  qualify_result: Result<String, String>,
  qualified: Arc<Mutex<Vec<String>>>,
}

impl FakeBuilder {
  pub fn qualifying_to(import_path: &str) -> Self {
    Self {
      options: default_build_options(),
      qualify_result: Ok(import_path.to_string()),
      qualified: Arc::default(),
    }
  }

  pub fn failing_qualify(message: &str) -> Self {
    Self {
      options: default_build_options(),
      qualify_result: Err(message.to_string()),
      qualified: Arc::default(),
    }
  }

  fn with_options(mut self, options: BuildOptions) -> Self {
    self.options = options;
    self
  }

  fn sharing_calls(mut self, calls: Arc<Mutex<Vec<String>>>) -> Self {
    self.qualified = calls;
    self
  }

  pub fn qualify_calls(&self) -> usize {
    self.qualified.lock().unwrap().len()
  }

  pub fn qualified_paths(&self) -> Vec<String> {
    self.qualified.lock().unwrap().clone()
  }
}

#[async_trait]
impl KoBuilder for FakeBuilder {
  fn options(&self) -> &BuildOptions {
    &self.options
  }

  async fn qualify_import(&self, relative_path: &str) -> Result<String, ToolchainError> {
    self.qualified.lock().unwrap().push(relative_path.to_string());
    self.qualify_result.clone().map_err(|message| ToolchainError::Qualify {
      path: relative_path.to_string(),
      workspace: self.options.working_directory.clone(),
      message,
    })
  }
}

/// A publisher that returns a fixed reference for every import path.
pub struct FakePublisher {
  options: PublishOptions,
  result: Result<String, String>,
  close_error: Option<String>,
  closes: Counter,
  published: Arc<Mutex<Vec<String>>>,
}

impl FakePublisher {
  pub fn returning(reference: &str) -> Self {
    let options = PublishOptions::for_image(reference, &PublishTarget::Push, USER_AGENT).unwrap();
    Self::with_options(options, Ok(reference.to_string()))
  }

  pub fn failing(message: &str) -> Self {
    let options = PublishOptions::for_image("gcr.io/fake/app:tag", &PublishTarget::Push, USER_AGENT).unwrap();
    Self::with_options(options, Err(message.to_string()))
  }

  fn with_options(options: PublishOptions, result: Result<String, String>) -> Self {
    Self {
      options,
      result,
      close_error: None,
      closes: Counter::default(),
      published: Arc::default(),
    }
  }

  pub fn with_close_error(mut self, message: &str) -> Self {
    self.close_error = Some(message.to_string());
    self
  }

  fn sharing_closes(mut self, closes: Counter) -> Self {
    self.closes = closes;
    self
  }

  pub fn close_counter(&self) -> Counter {
    self.closes.clone()
  }

  pub fn published(&self) -> Vec<String> {
    self.published.lock().unwrap().clone()
  }
}

#[async_trait]
impl Publisher for FakePublisher {
  fn options(&self) -> &PublishOptions {
    &self.options
  }

  async fn publish(&self, _builder: &dyn KoBuilder, import_path: &str) -> Result<ImageReference, ToolchainError> {
    self.published.lock().unwrap().push(import_path.to_string());
    match &self.result {
      Ok(reference) => Ok(parse_reference(reference)?),
      Err(message) => Err(ToolchainError::Publish {
        import_path: import_path.to_string(),
        message: message.clone(),
      }),
    }
  }

  fn close(&mut self) -> Result<(), ToolchainError> {
    self.closes.incr();
    match &self.close_error {
      Some(message) => Err(ToolchainError::Close(message.clone())),
      None => Ok(()),
    }
  }
}

/// A toolchain whose publish step returns `{import_path: full_image_name}`.
///
/// The map is keyed by the configured import path, so a build that resolves
/// a different path finds no image.
pub struct FakeToolchain {
  full_image_name: String,
  import_path: String,
  qualified_import_path: String,
  fail_builder: Option<String>,
  fail_qualify: Option<String>,
  fail_publish: Option<String>,

  pub builders_created: Counter,
  pub publishers_created: Counter,
  pub publish_calls: Counter,
  pub publisher_closes: Counter,
  pub qualify_calls: Arc<Mutex<Vec<String>>>,
  pub publish_options: Arc<Mutex<Vec<PublishOptions>>>,
}

impl FakeToolchain {
  pub fn new(full_image_name: &str, import_path: &str) -> Self {
    Self {
      full_image_name: full_image_name.to_string(),
      import_path: import_path.to_string(),
      qualified_import_path: import_path.to_string(),
      fail_builder: None,
      fail_qualify: None,
      fail_publish: None,
      builders_created: Counter::default(),
      publishers_created: Counter::default(),
      publish_calls: Counter::default(),
      publisher_closes: Counter::default(),
      qualify_calls: Arc::default(),
      publish_options: Arc::default(),
    }
  }

  /// Import path the builder derives from the workspace.
  pub fn qualifying_to(mut self, import_path: &str) -> Self {
    self.qualified_import_path = import_path.to_string();
    self
  }

  pub fn failing_builder(mut self, message: &str) -> Self {
    self.fail_builder = Some(message.to_string());
    self
  }

  pub fn failing_qualify(mut self, message: &str) -> Self {
    self.fail_qualify = Some(message.to_string());
    self
  }

  pub fn failing_publish(mut self, message: &str) -> Self {
    self.fail_publish = Some(message.to_string());
    self
  }

  pub fn qualify_count(&self) -> usize {
    self.qualify_calls.lock().unwrap().len()
  }

  pub fn last_publish_options(&self) -> Option<PublishOptions> {
    self.publish_options.lock().unwrap().last().cloned()
  }
}

#[async_trait]
impl Toolchain for FakeToolchain {
  fn name(&self) -> &str {
    "fake"
  }

  async fn new_builder(&self, options: BuildOptions) -> Result<Box<dyn KoBuilder>, ToolchainError> {
    self.builders_created.incr();
    if let Some(message) = &self.fail_builder {
      return Err(ToolchainError::WorkspaceNotFound(PathBuf::from(message)));
    }
    let builder = match &self.fail_qualify {
      Some(message) => FakeBuilder::failing_qualify(message),
      None => FakeBuilder::qualifying_to(&self.qualified_import_path),
    };
    let builder = builder
      .with_options(options)
      .sharing_calls(self.qualify_calls.clone());
    Ok(Box::new(builder))
  }

  fn new_publisher(&self, options: PublishOptions) -> Result<Box<dyn Publisher>, ToolchainError> {
    self.publishers_created.incr();
    self.publish_options.lock().unwrap().push(options.clone());
    let publisher = FakePublisher::with_options(options, Ok(self.full_image_name.clone()))
      .sharing_closes(self.publisher_closes.clone());
    Ok(Box::new(publisher))
  }

  async fn publish_images(
    &self,
    _import_paths: &[String],
    _publisher: &dyn Publisher,
    _builder: &dyn KoBuilder,
  ) -> Result<ImageMap, ToolchainError> {
    self.publish_calls.incr();
    if let Some(message) = &self.fail_publish {
      return Err(ToolchainError::Publish {
        import_path: self.import_path.clone(),
        message: message.clone(),
      });
    }
    let reference = parse_reference(&self.full_image_name)?;
    Ok(ImageMap::from([(self.import_path.clone(), reference)]))
  }
}

/// A daemon backed by an in-memory name → ID table.
#[derive(Default)]
pub struct FakeDaemon {
  images: HashMap<String, String>,
  unavailable: bool,
  queries: Mutex<Vec<String>>,
}

impl FakeDaemon {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_image(mut self, name: &str, id: &str) -> Self {
    self.images.insert(name.to_string(), id.to_string());
    self
  }

  pub fn unavailable() -> Self {
    Self {
      unavailable: true,
      ..Self::default()
    }
  }

  pub fn queries(&self) -> Vec<String> {
    self.queries.lock().unwrap().clone()
  }
}

#[async_trait]
impl LocalDaemon for FakeDaemon {
  fn name(&self) -> &str {
    "fake"
  }

  async fn image_id(&self, image: &str) -> Result<String, DaemonError> {
    self.queries.lock().unwrap().push(image.to_string());
    if self.unavailable {
      return Err(DaemonError::Unavailable {
        message: "connection refused".to_string(),
      });
    }
    self.images.get(image).cloned().ok_or_else(|| DaemonError::ImageNotFound {
      image: image.to_string(),
    })
  }
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}
