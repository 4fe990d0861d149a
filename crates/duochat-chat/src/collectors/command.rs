//! Shell-command plumbing for the device collectors.
//!
//! Camera and microphone access go through user-configured commands
//! (`fswebcam`, `arecord`, ...). Templates carry `{placeholders}` that are
//! substituted with shell-quoted values before running under `sh -c`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

/// Substitute `{key}` placeholders with shell-quoted values.
pub fn render_command(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |cmd, (key, value)| {
        cmd.replace(&format!("{{{key}}}"), &shell_quote(value))
    })
}

/// Single-quote a value for POSIX shells.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Build a `sh -c` (or `cmd /C`) invocation with all stdio detached.
pub fn shell_command(command: &str) -> Command {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd
}

/// Run a command to completion, failing on timeout or non-zero exit.
pub async fn run_with_timeout(command: &str, timeout: Duration) -> Result<(), String> {
    debug!(command = %command, "running device command");

    let child = shell_command(command)
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to spawn command: {e}"))?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "command exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ))
        }
        Ok(Err(e)) => Err(format!("command failed: {e}")),
        Err(_) => Err(format!("command timed out after {:?}", timeout)),
    }
}

/// Whether the program a command template starts with can be found.
///
/// Absolute or relative paths are checked directly; bare names are looked up
/// on `PATH`.
pub fn program_on_path(template: &str) -> bool {
    let Some(program) = template.split_whitespace().next() else {
        return false;
    };

    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        return Path::new(program).is_file();
    }

    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// A unique scratch file path under the system temp dir.
pub fn temp_output_path(kind: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("duochat-{}-{}.{}", kind, uuid::Uuid::new_v4(), extension))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_command_quotes_values() {
        let cmd = render_command(
            "fswebcam -d {device} {output}",
            &[("device", "/dev/video0"), ("output", "/tmp/my shot.jpg")],
        );
        assert_eq!(cmd, "fswebcam -d '/dev/video0' '/tmp/my shot.jpg'");
    }

    #[test]
    fn test_render_command_unknown_placeholder_left_alone() {
        assert_eq!(render_command("rec {output} {rate}", &[("output", "a")]), "rec 'a' {rate}");
    }

    #[test]
    fn test_shell_quote_escapes_single_quote() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_program_on_path() {
        assert!(program_on_path("sh -c true"));
        assert!(!program_on_path("definitely-not-a-real-binary-xyz --flag"));
        assert!(!program_on_path("   "));
        assert!(!program_on_path("/nonexistent/bin/tool"));
    }

    #[test]
    fn test_temp_output_path_unique() {
        let a = temp_output_path("capture", "jpg");
        let b = temp_output_path("capture", "jpg");
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "jpg");
    }

    #[tokio::test]
    async fn test_run_with_timeout_success_and_failure() {
        assert!(run_with_timeout("true", Duration::from_secs(5)).await.is_ok());

        let err = run_with_timeout("echo boom >&2; exit 3", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.contains("exited with 3"));
        assert!(err.contains("boom"));
    }

    #[tokio::test]
    async fn test_run_with_timeout_expires() {
        let err = run_with_timeout("sleep 5", Duration::from_millis(100)).await.unwrap_err();
        assert!(err.contains("timed out"));
    }
}
