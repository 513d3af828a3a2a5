//! Writing configuration files with toml_edit.

use super::Config;
use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::DocumentMut;

/// Save the entire config to a TOML file
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let new_content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config")?;
    let new_doc: DocumentMut = new_content
        .parse()
        .with_context(|| "Failed to parse serialized config")?;

    write_document(path, &new_doc)
}

fn write_document(path: &Path, doc: &DocumentMut) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}
