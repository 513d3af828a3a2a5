use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::options::Options;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Spec registry options for the image model.
    #[serde(default)]
    pub model: Options,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory source images and cached artifacts are stored under
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// URL prefix stored names are served from
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_base_url() -> String {
    "/media/".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./thumbforge.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}
