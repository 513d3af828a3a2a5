//! Image spec definitions.
//!
//! A spec is a named transformation: an ordered list of [`Processor`]s plus
//! output quality and caching flags. Specs are declared in a *spec module*,
//! a TOML file of `[[spec]]` tables:
//!
//! ```toml
//! [[spec]]
//! name = "thumbnail"
//! pre_cache = true
//! quality = 80
//! processors = [
//!   { type = "resize", width = 100, height = 100, crop = true },
//! ]
//! ```

pub mod processors;

use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use thumbforge_common::Result;
use thumbforge_db::models::Record;

use crate::images::codec::{self, DecodedImage, EncodeSettings};

pub use processors::{ProcessContext, Processor, TransposeMethod};

/// The spec module embedded in the binary, used when none is configured.
pub const DEFAULT_SPEC_MODULE: &str = include_str!("defaults.toml");

fn default_quality() -> u8 {
    70
}

/// Parsed content of a spec module.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpecModule {
    #[serde(default, rename = "spec")]
    pub specs: Vec<SpecDefinition>,
}

/// A spec as declared, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpecDefinition {
    pub name: String,

    /// Generate the artifact eagerly whenever the record is saved.
    #[serde(default)]
    pub pre_cache: bool,

    /// JPEG quality, 1-100.
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Optimize non-JPEG output where the encoder supports it.
    #[serde(default)]
    pub optimize: bool,

    /// Count views of this spec on the record.
    #[serde(default)]
    pub increment_count: bool,

    #[serde(default)]
    pub processors: Vec<Processor>,
}

impl SpecDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pre_cache: false,
            quality: default_quality(),
            optimize: false,
            increment_count: false,
            processors: Vec::new(),
        }
    }

    pub fn processor(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn pre_cache(mut self, pre_cache: bool) -> Self {
        self.pre_cache = pre_cache;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }
}

/// A validated spec.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    name: String,
    pub pre_cache: bool,
    pub quality: u8,
    pub optimize: bool,
    pub increment_count: bool,
    processors: Vec<Processor>,
}

impl ImageSpec {
    /// Validate a definition, normalising its name.
    pub fn from_definition(def: SpecDefinition) -> std::result::Result<Self, String> {
        let name = normalize_spec_name(&def.name);
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!("invalid spec name: {:?}", def.name));
        }
        if !(1..=100).contains(&def.quality) {
            return Err(format!(
                "spec {}: quality must be within 1..=100, got {}",
                name, def.quality
            ));
        }
        for processor in &def.processors {
            processor
                .validate()
                .map_err(|e| format!("spec {}: {}", name, e))?;
        }

        Ok(Self {
            name,
            pre_cache: def.pre_cache,
            quality: def.quality,
            optimize: def.optimize,
            increment_count: def.increment_count,
            processors: def.processors,
        })
    }

    /// The accessor name of the spec.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    /// Format and extension chosen by the last format processor, if any.
    pub fn format_override(&self) -> Option<(ImageFormat, String)> {
        self.processors.iter().rev().find_map(Processor::output_format)
    }

    /// Run every processor over a copy of the source image.
    pub fn render(&self, source: &DecodedImage, record: &Record) -> DynamicImage {
        let ctx = ProcessContext {
            crop_horz: record.crop_horz,
            crop_vert: record.crop_vert,
            orientation: source.orientation,
        };
        self.processors
            .iter()
            .fold(source.image.clone(), |img, processor| processor.apply(img, &ctx))
    }

    /// Encoder settings for writing this spec's output in `format`.
    pub fn encode_settings(&self, format: ImageFormat) -> EncodeSettings {
        EncodeSettings::for_output(format, self.quality, self.optimize)
    }

    /// Render and encode a derived artifact.
    ///
    /// The output keeps the source format unless a format processor
    /// overrides it.
    pub fn derive(&self, source: &DecodedImage, record: &Record) -> Result<Vec<u8>> {
        let format = self
            .format_override()
            .map(|(format, _)| format)
            .unwrap_or_else(|| source.format_or_fallback());
        let img = self.render(source, record);
        codec::encode(&img, &self.encode_settings(format))
    }
}

/// Turn a CamelCase spec name into its snake_case accessor name.
///
/// Names that are already snake_case are returned unchanged.
///
/// ```
/// use thumbforge::specs::normalize_spec_name;
///
/// assert_eq!(normalize_spec_name("AdminThumbnail"), "admin_thumbnail");
/// assert_eq!(normalize_spec_name("HTTPPreview"), "http_preview");
/// assert_eq!(normalize_spec_name("display"), "display");
/// ```
pub fn normalize_spec_name(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
