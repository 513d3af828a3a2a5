pub mod persist;
mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    resolve_paths(&mut config, path.parent());
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./thumbforge.toml",
        "~/.config/thumbforge/config.toml",
        "/etc/thumbforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Expand `~` in configured paths and make relative ones relative to the
/// config file's directory.
fn resolve_paths(config: &mut Config, base: Option<&Path>) {
    let Some(module) = config.model.spec_module.take() else {
        return;
    };

    let module = PathBuf::from(shellexpand::tilde(&module.to_string_lossy()).into_owned());
    let module = match base.filter(|b| !b.as_os_str().is_empty()) {
        Some(base) if module.is_relative() => base.join(module),
        _ => module,
    };
    config.model.spec_module = Some(module);
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    config
        .model
        .validate()
        .context("Invalid [model] section")?;

    if config.storage.base_url.is_empty() {
        anyhow::bail!("storage.base_url cannot be empty");
    }

    if let Some(module) = &config.model.spec_module {
        if !module.exists() {
            tracing::warn!("Spec module does not exist: {:?}", module);
        }
    }

    Ok(())
}
