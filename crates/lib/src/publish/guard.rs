//! Scoped release of publisher handles.

use std::ops::Deref;

use tracing::{debug, warn};

use super::Publisher;

/// Owns a publisher handle and closes it when dropped.
///
/// Release happens on every exit path of the owning scope, including early
/// returns through `?` and the enclosing future being dropped mid-await.
/// Close failures are logged and never replace the scope's own result.
pub struct PublisherGuard {
  publisher: Box<dyn Publisher>,
}

impl PublisherGuard {
  pub fn new(publisher: Box<dyn Publisher>) -> Self {
    Self { publisher }
  }
}

impl Deref for PublisherGuard {
  type Target = dyn Publisher;

  fn deref(&self) -> &Self::Target {
    self.publisher.as_ref()
  }
}

impl Drop for PublisherGuard {
  fn drop(&mut self) {
    let destination = self.publisher.options().destination().to_string();
    match self.publisher.close() {
      Ok(()) => debug!(destination = %destination, "released publisher"),
      Err(e) => warn!(destination = %destination, error = %e, "failed to release publisher"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::FakePublisher;
  use tracing_test::traced_test;

  #[test]
  fn closes_on_drop() {
    let publisher = FakePublisher::returning("gcr.io/p/app:tag");
    let closes = publisher.close_counter();

    {
      let guard = PublisherGuard::new(Box::new(publisher));
      assert_eq!(guard.options().docker_repo, "gcr.io/p/app");
      assert_eq!(closes.get(), 0);
    }

    assert_eq!(closes.get(), 1);
  }

  #[test]
  fn closes_on_early_return() {
    fn scoped(publisher: FakePublisher, fail: bool) -> Result<(), &'static str> {
      let _guard = PublisherGuard::new(Box::new(publisher));
      if fail {
        return Err("step failed");
      }
      Ok(())
    }

    let publisher = FakePublisher::returning("gcr.io/p/app:tag");
    let closes = publisher.close_counter();

    assert!(scoped(publisher, true).is_err());
    assert_eq!(closes.get(), 1);
  }

  #[test]
  #[traced_test]
  fn close_failure_is_logged() {
    let publisher = FakePublisher::returning("gcr.io/p/app:tag").with_close_error("socket already closed");
    let closes = publisher.close_counter();

    drop(PublisherGuard::new(Box::new(publisher)));

    assert_eq!(closes.get(), 1);
    assert!(logs_contain("failed to release publisher"));
  }
}
