//! Child process execution.
//!
//! Both the toolchain and the daemon adapters drive external executables.
//! Processes are spawned with `kill_on_drop`, so dropping the future (for
//! example when a caller's deadline fires) terminates the child.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
  /// Exit code, `None` if the process was terminated by a signal.
  pub code: Option<i32>,
  pub success: bool,
  /// Trimmed stdout.
  pub stdout: String,
  /// Trimmed stderr.
  pub stderr: String,
}

impl CommandOutput {
  /// The last non-empty stdout line.
  pub fn last_line(&self) -> Option<&str> {
    self.stdout.lines().map(str::trim).rfind(|line| !line.is_empty())
  }
}

/// Render a program and its arguments for logs and error messages.
pub fn display_command<I, S>(program: &Path, args: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut rendered = program.display().to_string();
  for arg in args {
    rendered.push(' ');
    rendered.push_str(&arg.as_ref().to_string_lossy());
  }
  rendered
}

/// Run `program` to completion and capture its output.
///
/// Spawn failures are returned as `Err`; a non-zero exit is reported through
/// [`CommandOutput::success`] so callers can classify it.
pub async fn run_command<I, S>(
  program: &Path,
  args: I,
  envs: &[(&str, String)],
  cwd: Option<&Path>,
) -> std::io::Result<CommandOutput>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let mut command = Command::new(program);
  command
    .args(args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

  for (key, value) in envs {
    command.env(key, value);
  }
  if let Some(dir) = cwd {
    command.current_dir(dir);
  }

  debug!(program = %program.display(), cwd = ?cwd, "spawning process");

  let output = command.output().await?;

  let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
  let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

  if !stderr.is_empty() {
    debug!(stderr = %stderr, "command stderr");
  }
  if !stdout.is_empty() {
    debug!(stdout = %stdout, "command stdout");
  }

  Ok(CommandOutput {
    code: output.status.code(),
    success: output.status.success(),
    stdout,
    stderr,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn display_command_joins_args() {
    let rendered = display_command(Path::new("/usr/bin/ko"), ["build", "--bare"]);
    assert_eq!(rendered, "/usr/bin/ko build --bare");
  }

  #[test]
  fn last_line_skips_trailing_blank_lines() {
    let output = CommandOutput {
      code: Some(0),
      success: true,
      stdout: "progress\n\ngcr.io/p/app:tag\n  \n".to_string(),
      stderr: String::new(),
    };
    assert_eq!(output.last_line(), Some("gcr.io/p/app:tag"));
  }

  #[test]
  fn last_line_empty_output() {
    let output = CommandOutput {
      code: Some(0),
      success: true,
      stdout: String::new(),
      stderr: String::new(),
    };
    assert_eq!(output.last_line(), None);
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_command_captures_stdout() {
    let output = run_command(Path::new("/bin/sh"), ["-c", "echo hello"], &[], None)
      .await
      .unwrap();
    assert!(output.success);
    assert_eq!(output.stdout, "hello");
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_command_passes_env_and_cwd() {
    let temp = tempfile::TempDir::new().unwrap();
    let output = run_command(
      Path::new("/bin/sh"),
      ["-c", "echo \"$KOSHIP_TEST_VAR\"; pwd"],
      &[("KOSHIP_TEST_VAR", "value".to_string())],
      Some(temp.path()),
    )
    .await
    .unwrap();

    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines[0], "value");
    let cwd = PathBuf::from(lines[1]).canonicalize().unwrap();
    assert_eq!(cwd, temp.path().canonicalize().unwrap());
  }

  #[tokio::test]
  #[cfg(unix)]
  async fn run_command_reports_failure() {
    let output = run_command(Path::new("/bin/sh"), ["-c", "echo oops >&2; exit 3"], &[], None)
      .await
      .unwrap();
    assert!(!output.success);
    assert_eq!(output.code, Some(3));
    assert_eq!(output.stderr, "oops");
  }

  #[tokio::test]
  async fn run_command_missing_program() {
    let result = run_command(Path::new("/definitely/not/a/program"), ["x"], &[], None).await;
    assert!(result.is_err());
  }
}
