//! Handler functions for config CLI commands.

use crate::cli::ConfigAction;
use crate::config::EarthConfig;
use libearth_core::{Error, Result};
use std::io::Write;
use std::path::PathBuf;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
pub fn handle_config_command(
    config_path: Option<&str>,
    action: ConfigAction,
    out: &mut dyn Write,
) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path, out),
        ConfigAction::Show => cmd_config_show(config_path, out),
        ConfigAction::Init { file, force } => {
            cmd_config_init(file.as_deref().or(config_path), force, out)
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let path = EarthConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    writeln!(out, "{}", path.display())?;
    if !path.exists() {
        eprintln!("(file does not exist, run `earth config init` to create it)");
    }
    Ok(())
}

/// Show the effective configuration, environment overrides included.
pub fn cmd_config_show(config_path: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let config = EarthConfig::load(config_path)?;
    write!(out, "{}", config.to_toml_string()?)?;
    Ok(())
}

/// Create a default configuration file.
pub fn cmd_config_init(file: Option<&str>, force: bool, out: &mut dyn Write) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => EarthConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_str = EarthConfig::default().to_toml_string()?;
    std::fs::write(&path, &toml_str)?;
    tracing::info!(path = %path.display(), "created config file");

    writeln!(out, "Config file created at {}", path.display())?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
