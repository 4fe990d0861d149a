//! `duochat status` — show configuration, provider and device status.

use anyhow::Result;
use colored::Colorize;

use duochat_chat::Capabilities;
use duochat_core::config::{get_config_path, load_config};
use duochat_core::utils::mask_secret;
use duochat_providers::registry::{find_by_kind, resolve_endpoint};

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "Duochat Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Provider
    let spec = find_by_kind(config.provider);
    let endpoint = resolve_endpoint(spec, config.providers.get(config.provider));
    println!("  {:<18} {}", "Provider:".bold(), spec.display_name);
    println!("  {:<18} {}", "Model:".bold(), endpoint.model);
    println!("  {:<18} {}", "Endpoint:".bold(), endpoint.api_base.dimmed());

    let key_status = if config.api_config().is_configured() {
        format!("{} {}", "✓".green(), mask_secret(config.api_key.trim()).dimmed())
    } else {
        format!("{} (run `duochat setup`)", "· not configured".red())
    };
    println!("  {:<18} {}", "API key:".bold(), key_status);

    // Devices
    let caps = Capabilities::probe(&config);
    println!();
    println!("  {}", "Input devices:".bold());
    println!("    {:<20} {}", "Camera", availability(caps.camera));
    println!("    {:<20} {}", "Voice", availability(caps.voice));
    if !caps.voice && config.transcription_key().is_none() {
        println!(
            "    {}",
            "voice needs an OpenAI key (voice.apiKey, or use OpenAI as provider)".dimmed()
        );
    }

    println!();

    Ok(())
}

fn availability(available: bool) -> String {
    if available {
        format!("{}", "✓ available".green())
    } else {
        format!("{}", "· unavailable".dimmed())
    }
}
