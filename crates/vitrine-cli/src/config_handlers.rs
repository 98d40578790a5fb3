//! Handler functions for the `config` subcommands.
//!
//! The configuration is rendered through `toml::Value` so any key, including
//! nested tables such as `languages`, can be addressed with a dotted path.

use std::path::Path;

use vitrine_core::EngineConfig;

use crate::cli::ConfigAction;
use crate::error::{Error, Result};

/// Handle a config subcommand against the resolved configuration.
pub fn handle_config_command(config: &EngineConfig, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", cmd_config_show(config)?);
            Ok(())
        }
        ConfigAction::Get { key } => {
            println!("{}", cmd_config_get(config, &key)?);
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            cmd_config_init(&file, force)?;
            println!("Config file created at {}", file.display());
            Ok(())
        }
    }
}

/// The configuration as a TOML document.
pub fn cmd_config_show(config: &EngineConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

/// One configuration value by dotted key.
pub fn cmd_config_get(config: &EngineConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config)?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::usage(format!("Key '{key}' not found in configuration")))
}

/// Write the default configuration to `path`.
pub fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::usage(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| vitrine_core::Error::io_with_path(e, parent))?;
    }

    let rendered = cmd_config_show(&EngineConfig::default())?;
    std::fs::write(path, rendered).map_err(|e| vitrine_core::Error::io_with_path(e, path))?;
    log::info!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
