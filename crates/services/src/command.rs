//! Running short-lived external commands with a deadline.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::trace;

/// Run `program` with `args` and return its trimmed stdout.
///
/// The child is killed when `timeout` elapses. A non-zero exit is an error
/// carrying the first line of stderr.
pub async fn run(program: &str, args: &[&str], timeout: Duration) -> Result<String> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .with_context(|| format!("`{}` timed out after {:?}", program, timeout))?
        .with_context(|| format!("Failed to run `{}`", program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "`{}` exited with {}: {}",
            program,
            output.status,
            stderr.lines().next().unwrap_or_default()
        );
    }

    let stdout = String::from_utf8(output.stdout)
        .with_context(|| format!("`{}` wrote invalid UTF-8", program))?;
    trace!("`{}` -> {:?}", program, stdout);
    Ok(stdout.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_run_trims_stdout() {
        let out = run("echo", &["  hello  "], TIMEOUT).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_run_failure_is_error() {
        assert!(run("false", &[], TIMEOUT).await.is_err());
        assert!(
            run("/nonexistent/modalbar-command", &[], TIMEOUT)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let err = run("sleep", &["5"], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
