//! Lazy per-spec access to a record's derived artifact.

use image::DynamicImage;
use thumbforge_common::{Error, Result};
use thumbforge_db::models::Record;

use super::ImageModel;
use crate::images::codec;
use crate::specs::ImageSpec;

/// The derived artifact of one spec for one record.
///
/// Reads generate the artifact on first use; later reads hit the cache.
pub struct SpecAccessor<'a> {
    model: &'a ImageModel,
    record: &'a Record,
    spec: &'a ImageSpec,
}

impl<'a> SpecAccessor<'a> {
    pub(crate) fn new(model: &'a ImageModel, record: &'a Record, spec: &'a ImageSpec) -> Self {
        Self {
            model,
            record,
            spec,
        }
    }

    pub fn spec(&self) -> &'a ImageSpec {
        self.spec
    }

    /// Storage name of the artifact, `None` when the record has no image.
    pub fn name(&self) -> Option<String> {
        let source = self.record.image.as_deref()?;
        Some(
            self.model
                .registry()
                .options()
                .artifact_name(source, self.spec),
        )
    }

    fn require_name(&self) -> Result<String> {
        self.name().ok_or_else(|| {
            Error::not_found(format!(
                "source image for spec {} (record has no image)",
                self.spec.name()
            ))
        })
    }

    /// Whether the artifact is cached.
    pub fn exists(&self) -> Result<bool> {
        match self.name() {
            Some(name) => self.model.storage().exists(&name),
            None => Ok(false),
        }
    }

    /// Generate and store the artifact unless it is already cached.
    ///
    /// Returns `true` when a new artifact was written. A record without an
    /// image has nothing to derive and returns `false`.
    pub fn create(&self) -> Result<bool> {
        let (Some(name), Some(source)) = (self.name(), self.record.image.as_deref()) else {
            return Ok(false);
        };
        let storage = self.model.storage();
        if storage.exists(&name)? {
            return Ok(false);
        }

        let decoded = codec::decode(&storage.open(source)?)?;
        let content = self.spec.derive(&decoded, self.record)?;
        storage.save(&name, &content)?;
        tracing::debug!(
            "Generated {} ({} bytes) from {}",
            name,
            content.len(),
            source
        );
        Ok(true)
    }

    /// Remove the cached artifact. Returns `true` when one was removed.
    pub fn delete(&self) -> Result<bool> {
        let Some(name) = self.name() else {
            return Ok(false);
        };
        let storage = self.model.storage();
        if !storage.exists(&name)? {
            return Ok(false);
        }
        storage.delete(&name)?;
        tracing::debug!("Deleted cached artifact {}", name);
        Ok(true)
    }

    /// Storage name of the artifact, generating it if needed.
    pub fn ensure(&self) -> Result<String> {
        let name = self.require_name()?;
        self.create()?;
        Ok(name)
    }

    /// Public URL of the artifact, generating it if needed.
    pub fn url(&self) -> Result<String> {
        let name = self.ensure()?;
        Ok(self.model.storage().url(&name))
    }

    /// Encoded artifact content, generating it if needed.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        let name = self.ensure()?;
        self.model.storage().open(&name)
    }

    /// The decoded artifact, generating it if needed.
    pub fn image(&self) -> Result<DynamicImage> {
        Ok(codec::decode(&self.bytes()?)?.image)
    }

    /// Artifact width and height in pixels.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let img = self.image()?;
        Ok((img.width(), img.height()))
    }
}
