//! `duochat setup` — choose the provider and store its API key.
//!
//! Flags skip the prompts; anything missing is asked for interactively.
//! An empty key is refused and nothing is written.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use duochat_core::config::{get_config_path, load_config, save_config, Config};
use duochat_core::types::{ApiConfig, ProviderKind};
use duochat_core::utils::mask_secret;
use duochat_providers::registry::find_by_kind;

/// Run the setup command.
pub fn run(provider: Option<ProviderKind>, api_key: Option<String>) -> Result<()> {
    println!();
    println!("{}", "Duochat Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    let mut config = load_config(Some(&config_path));

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let provider = match provider {
        Some(p) => p,
        None => prompt_provider(&mut input, config.provider)?,
    };

    let api_key = match api_key {
        Some(k) => k,
        None => {
            let spec = find_by_kind(provider);
            println!("  Get a key at {}", spec.key_url.underline());
            prompt(&mut input, &format!("{} API key", provider.display_name()))?
        }
    };

    apply_and_save(&mut config, provider, &api_key, &config_path)?;

    println!();
    println!(
        "  {} {} configured (key {}) in {}",
        "✓".green(),
        provider.display_name(),
        mask_secret(api_key.trim()),
        config_path.display()
    );
    println!(
        "{}",
        "  Setup complete! Run `duochat chat` to start chatting.".green()
    );
    println!();

    Ok(())
}

/// Validate, update and persist the chosen provider and key.
fn apply_and_save(config: &mut Config, provider: ProviderKind, api_key: &str, path: &Path) -> Result<()> {
    if api_key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    config.set_api_config(&ApiConfig::new(provider, api_key));
    save_config(config, Some(path))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn prompt_provider(input: &mut impl BufRead, current: ProviderKind) -> Result<ProviderKind> {
    println!("  Providers:");
    for (i, kind) in ProviderKind::ALL.iter().enumerate() {
        println!("    {}. {}", i + 1, kind.display_name());
    }

    let answer = prompt(input, &format!("Provider [{}]", current.name()))?;
    parse_provider_choice(&answer, current)
}

/// Accept a number from the list, a provider name, or empty for `current`.
fn parse_provider_choice(answer: &str, current: ProviderKind) -> Result<ProviderKind> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(current);
    }
    if let Ok(n) = answer.parse::<usize>() {
        return ProviderKind::ALL
            .get(n.wrapping_sub(1))
            .copied()
            .with_context(|| format!("no provider number {n}"));
    }
    Ok(answer.parse()?)
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    print!("  {}: ", label.bold());
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("failed to read input")?;
    Ok(line.trim().to_string())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
