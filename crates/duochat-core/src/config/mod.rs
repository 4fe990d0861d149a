//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use duochat_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Provider: {}", cfg.provider);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{CameraConfig, Config, ProviderSettings, ProvidersConfig, VoiceConfig};
