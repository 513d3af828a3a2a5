//! Per-model options: where specs come from and how artifacts are named.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thumbforge_common::paths::{join_name, split_name};
use thumbforge_common::{Error, Result};

use crate::specs::ImageSpec;

fn default_cache_dir() -> String {
    "cache".to_string()
}

fn default_cache_filename_format() -> String {
    "{filename}_{specname}.{extension}".to_string()
}

fn default_admin_thumbnail_spec() -> String {
    "admin_thumbnail".to_string()
}

fn default_upload_to() -> String {
    "images".to_string()
}

/// Options attached to a model's spec registry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Options {
    /// Spec module file. `None` selects the built-in defaults.
    #[serde(default)]
    pub spec_module: Option<PathBuf>,

    /// Storage directory that holds cached artifacts.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Artifact file name template with `{filename}`, `{specname}` and
    /// `{extension}` placeholders.
    #[serde(default = "default_cache_filename_format")]
    pub cache_filename_format: String,

    /// Spec rendered by the admin thumbnail view.
    #[serde(default = "default_admin_thumbnail_spec")]
    pub admin_thumbnail_spec: String,

    /// Spec applied to the source image itself on the initial save.
    #[serde(default)]
    pub preprocessor_spec: Option<String>,

    /// Storage directory new source images are uploaded to.
    #[serde(default = "default_upload_to")]
    pub upload_to: String,

    /// Count views of specs flagged with `increment_count`.
    #[serde(default)]
    pub save_count_as: bool,

    /// Also delete the source image when its record is deleted.
    #[serde(default)]
    pub delete_source: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            spec_module: None,
            cache_dir: default_cache_dir(),
            cache_filename_format: default_cache_filename_format(),
            admin_thumbnail_spec: default_admin_thumbnail_spec(),
            preprocessor_spec: None,
            upload_to: default_upload_to(),
            save_count_as: false,
            delete_source: false,
        }
    }
}

impl Options {
    /// Check the naming options.
    ///
    /// The filename template must mention the source file name, the spec
    /// name and the extension, otherwise two artifacts could share a name.
    pub fn validate(&self) -> Result<()> {
        for placeholder in ["{filename}", "{specname}", "{extension}"] {
            if !self.cache_filename_format.contains(placeholder) {
                return Err(Error::invalid_input(format!(
                    "cache_filename_format must contain {}: {}",
                    placeholder, self.cache_filename_format
                )));
            }
        }
        if self.cache_filename_format.contains('/') {
            return Err(Error::invalid_input(
                "cache_filename_format must not contain '/'",
            ));
        }
        if self.cache_dir.trim_matches('/').is_empty() {
            // Artifacts would sit next to the sources they derive from.
            return Err(Error::invalid_input("cache_dir must not be empty"));
        }
        if self.cache_dir.split('/').any(|p| p == "..") || self.upload_to.split('/').any(|p| p == "..")
        {
            return Err(Error::invalid_input(
                "cache_dir and upload_to must stay inside the storage root",
            ));
        }
        Ok(())
    }

    /// Storage name of the artifact `spec` derives from the source `source`.
    ///
    /// `images/cat.jpg` with spec `thumbnail` becomes
    /// `cache/images/cat_thumbnail.jpg` under the default options. A spec
    /// that changes the output format keeps the source extension in
    /// `{filename}`, so `cat.jpg` and `cat.png` converted to PNG become
    /// `cat.jpg_web.png` and `cat.png_web.png`.
    pub fn artifact_name(&self, source: &str, spec: &ImageSpec) -> String {
        let parts = split_name(source);
        let (filename, extension) = match spec.format_override() {
            Some((_, ext)) => {
                let full = match parts.extension {
                    "" => parts.stem.to_string(),
                    source_ext => format!("{}.{}", parts.stem, source_ext),
                };
                (full, ext)
            }
            None => (parts.stem.to_string(), parts.extension.to_string()),
        };
        let file = self
            .cache_filename_format
            .replace("{filename}", &filename)
            .replace("{specname}", spec.name())
            .replace("{extension}", &extension);
        // A source without an extension leaves a dangling dot.
        let file = file.trim_end_matches('.');
        join_name(&[&self.cache_dir, parts.dir, file])
    }

    /// Storage name a new upload called `filename` is stored under.
    pub fn upload_name(&self, filename: &str) -> String {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        join_name(&[&self.upload_to, base])
    }
}
