//! Spec registry: the specs bound to a model.
//!
//! Loading reads the spec module named by the options, validates every
//! definition, and resolves the admin thumbnail and preprocessor roles.
//! A registry that loads successfully is internally consistent; any
//! problem with the module is reported as [`Error::SpecModule`].

use std::collections::HashSet;

use thumbforge_common::{Error, Result};

use crate::options::Options;
use crate::specs::{ImageSpec, SpecDefinition, SpecModule, DEFAULT_SPEC_MODULE};

/// The validated specs of one model plus its options.
#[derive(Debug, Clone)]
pub struct SpecRegistry {
    options: Options,
    specs: Vec<ImageSpec>,
    preprocessor: Option<usize>,
}

impl SpecRegistry {
    /// Load the spec module named by `options.spec_module`.
    ///
    /// Without a configured module the built-in defaults are used.
    pub fn load(options: Options) -> Result<Self> {
        let (content, origin) = match &options.spec_module {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::spec_module(format!("{}: {}", path.display(), e))
                })?;
                (content, path.display().to_string())
            }
            None => (DEFAULT_SPEC_MODULE.to_string(), "built-in defaults".to_string()),
        };
        Self::from_module_str(options, &content, &origin)
    }

    /// Build a registry from spec module source text.
    pub fn from_module_str(options: Options, content: &str, origin: &str) -> Result<Self> {
        let module: SpecModule = toml::from_str(content)
            .map_err(|e| Error::spec_module(format!("{}: {}", origin, e)))?;
        tracing::debug!("Loaded {} spec(s) from {}", module.specs.len(), origin);
        Self::from_specs(options, module.specs)
            .map_err(|e| match e {
                Error::SpecModule(msg) => Error::spec_module(format!("{}: {}", origin, msg)),
                other => other,
            })
    }

    /// Build a registry from definitions.
    pub fn from_specs(options: Options, definitions: Vec<SpecDefinition>) -> Result<Self> {
        options
            .validate()
            .map_err(|e| Error::spec_module(e.to_string()))?;

        let mut specs = Vec::with_capacity(definitions.len());
        let mut seen = HashSet::new();
        for def in definitions {
            let spec = ImageSpec::from_definition(def).map_err(Error::spec_module)?;
            if !seen.insert(spec.name().to_string()) {
                return Err(Error::spec_module(format!(
                    "spec {} is defined more than once",
                    spec.name()
                )));
            }
            specs.push(spec);
        }

        let preprocessor = match &options.preprocessor_spec {
            Some(name) => {
                let wanted = crate::specs::normalize_spec_name(name);
                let idx = specs
                    .iter()
                    .position(|s| s.name() == wanted)
                    .ok_or_else(|| {
                        Error::spec_module(format!("preprocessor spec {} is not defined", name))
                    })?;
                if specs[idx].format_override().is_some() {
                    tracing::warn!(
                        "Preprocessor spec {} has a format processor; sources keep their own format",
                        wanted
                    );
                }
                Some(idx)
            }
            None => None,
        };

        if !specs
            .iter()
            .any(|s| s.name() == crate::specs::normalize_spec_name(&options.admin_thumbnail_spec))
        {
            tracing::debug!(
                "Admin thumbnail spec {} is not defined",
                options.admin_thumbnail_spec
            );
        }

        Ok(Self {
            options,
            specs,
            preprocessor,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// All specs, in declaration order.
    pub fn specs(&self) -> &[ImageSpec] {
        &self.specs
    }

    /// Specs that produce cached artifacts: everything but the preprocessor.
    pub fn artifact_specs(&self) -> impl Iterator<Item = &ImageSpec> {
        self.specs
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != self.preprocessor)
            .map(|(_, spec)| spec)
    }

    /// Look up an artifact spec by accessor name.
    ///
    /// CamelCase names are accepted and normalised.
    pub fn get(&self, name: &str) -> Option<&ImageSpec> {
        let name = crate::specs::normalize_spec_name(name);
        self.artifact_specs().find(|s| s.name() == name)
    }

    /// The spec rendered by the admin thumbnail view, if defined.
    pub fn admin_thumbnail(&self) -> Option<&ImageSpec> {
        self.get(&self.options.admin_thumbnail_spec)
    }

    /// The spec applied to sources on the initial save, if configured.
    pub fn preprocessor(&self) -> Option<&ImageSpec> {
        self.preprocessor.map(|i| &self.specs[i])
    }
}
