//! Shared CLI helpers — path expansion, reply printing, version banner.

use std::path::PathBuf;

use colored::Colorize;

use duochat_chat::{Capabilities, SendError};
use duochat_core::types::{Message, ProviderKind};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print an assistant reply to stdout.
pub fn print_reply(reply: &Message, provider: ProviderKind) {
    println!();
    println!("{}", provider.display_name().cyan().bold());
    if reply.content.starts_with("Error: ") {
        println!("{}", reply.content.red());
    } else if reply.content.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", reply.content);
    }
    println!();
}

/// Turn a refused send into a user-facing error.
pub fn send_error(err: SendError) -> anyhow::Error {
    match err {
        SendError::MissingApiKey => {
            anyhow::anyhow!("no API key configured. Run `duochat setup` to add one.")
        }
        other => anyhow::anyhow!(other),
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider: ProviderKind, capabilities: Capabilities) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}  {}",
        "Duochat".cyan().bold(),
        version.dimmed(),
        format!("({})", provider.display_name()).dimmed()
    );
    println!(
        "{}",
        "Type a message, /help for commands, or \"exit\" to quit.".dimmed()
    );
    if !capabilities.camera || !capabilities.voice {
        let missing: Vec<&str> = [("camera", capabilities.camera), ("voice", capabilities.voice)]
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect();
        println!(
            "{}",
            format!("Unavailable on this machine: {}", missing.join(", ")).dimmed()
        );
    }
    println!();
}

/// Print a "thinking" placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

/// Print an error line to stderr.
pub fn print_error(message: impl std::fmt::Display) {
    eprintln!("\n{} {}\n", "✗".red(), message);
}

/// Print a one-line notice.
pub fn print_notice(message: impl std::fmt::Display) {
    println!("  {} {}", "✓".green(), message);
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_bare() {
        let result = expand_tilde("~");
        assert!(!result.to_string_lossy().contains('~'));
    }

    #[test]
    fn send_error_points_at_setup() {
        let err = send_error(SendError::MissingApiKey);
        assert!(err.to_string().contains("duochat setup"));

        let err = send_error(SendError::Busy);
        assert!(err.to_string().contains("already being sent"));
    }
}
