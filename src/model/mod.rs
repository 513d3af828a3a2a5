//! Record lifecycle with derived-image caching.
//!
//! [`ImageModel`] binds a [`SpecRegistry`] to a file [`Storage`] and a
//! [`RecordStore`]. Its `save` and `delete` hooks keep every record's cached
//! artifacts consistent with the record's current source image:
//!
//! - `save` persists the record, preprocesses a new record's source if a
//!   preprocessor spec is configured, then clears and pre-caches artifacts
//!   when asked to or when the source content changed.
//! - `delete` requires an identity, evicts the artifacts, then deletes the
//!   record.

mod accessor;
mod store;

use std::sync::Arc;

use chrono::Utc;
use thumbforge_common::{Error, RecordId, Result};
use thumbforge_db::models::Record;

use crate::images::codec::{self, compute_hash};
use crate::images::Storage;
use crate::registry::SpecRegistry;
use crate::specs::ImageSpec;

pub use accessor::SpecAccessor;
pub use store::{RecordStore, SqliteRecordStore};

/// A record type with derived-image specs attached.
#[derive(Clone)]
pub struct ImageModel {
    registry: Arc<SpecRegistry>,
    storage: Arc<dyn Storage>,
    store: Arc<dyn RecordStore>,
}

impl ImageModel {
    pub fn new(
        registry: Arc<SpecRegistry>,
        storage: Arc<dyn Storage>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            registry,
            storage,
            store,
        }
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Fetch a persisted record.
    pub fn load(&self, id: RecordId) -> Result<Record> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::not_found(format!("record {}", id)))
    }

    /// Accessor for the artifact of spec `name`, if that spec exists.
    pub fn spec<'a>(&'a self, record: &'a Record, name: &str) -> Option<SpecAccessor<'a>> {
        self.registry
            .get(name)
            .map(|spec| SpecAccessor::new(self, record, spec))
    }

    /// Accessors for every artifact spec, in declaration order.
    pub fn accessors<'a>(&'a self, record: &'a Record) -> impl Iterator<Item = SpecAccessor<'a>> {
        self.registry
            .artifact_specs()
            .map(move |spec| SpecAccessor::new(self, record, spec))
    }

    /// Public URL of the record's source image.
    pub fn source_url(&self, record: &Record) -> Option<String> {
        record.image.as_deref().map(|name| self.storage.url(name))
    }

    /// Store a new source image and attach it to the record.
    ///
    /// Artifacts of the previous source are evicted first. The record is
    /// not persisted; call [`save`](Self::save) afterwards.
    pub fn set_image(&self, record: &mut Record, filename: &str, content: &[u8]) -> Result<String> {
        // Reject content the image library cannot read before storing it.
        codec::decode(content)?;

        if record.image.is_some() {
            self.clear_cache(record)?;
        }

        let options = self.registry.options();
        let name = self.storage.available_name(&options.upload_name(filename))?;
        let stored = self.storage.save(&name, content)?;
        tracing::info!("Stored source image {} ({} bytes)", stored, content.len());

        record.image = Some(stored.clone());
        Ok(stored)
    }

    /// Save hook.
    ///
    /// Persists the record first, assigning an identity on the initial
    /// save. On the initial save the preprocessor spec, if any, rewrites
    /// the stored source in place. Artifacts are then cleared and the
    /// `pre_cache` ones regenerated when `clear_cache` is set or the source
    /// content differs from the last save.
    pub fn save(&self, record: &mut Record, clear_cache: bool) -> Result<()> {
        let is_new = record.id.is_none();
        record.updated_at = Utc::now();

        if is_new {
            let id = self.store.insert(record)?;
            record.id = Some(id);
            tracing::info!("Created record {}", id);

            if let Some(spec) = self.registry.preprocessor() {
                if record.image.is_some() {
                    self.preprocess(record, spec)?;
                }
            }
        } else if !self.store.update(record)? {
            return Err(Error::not_found(format!(
                "record {}",
                record.id.map(|id| id.to_string()).unwrap_or_default()
            )));
        }

        let current_hash = match record.image.as_deref() {
            Some(name) => Some(compute_hash(&self.storage.open(name)?)),
            None => None,
        };
        let source_changed = current_hash != record.image_hash;
        if source_changed {
            record.image_hash = current_hash;
            self.store.update(record)?;
        }

        if clear_cache || source_changed {
            let cleared = self.clear_cache(record)?;
            let created = self.pre_cache(record)?;
            tracing::debug!(
                "Refreshed cache for record {:?}: {} cleared, {} pre-cached",
                record.id,
                cleared,
                created
            );
        }

        Ok(())
    }

    /// Rewrite the stored source with the preprocessor spec.
    ///
    /// The source keeps its name and format; JPEG sources are written with
    /// the spec's quality and optimize on.
    fn preprocess(&self, record: &Record, spec: &ImageSpec) -> Result<()> {
        let Some(name) = record.image.as_deref() else {
            return Ok(());
        };

        let decoded = codec::decode(&self.storage.open(name)?)?;
        let format = decoded.format_or_fallback();
        let img = spec.render(&decoded, record);
        let content = codec::encode(&img, &spec.encode_settings(format))?;

        self.storage.delete(name)?;
        self.storage.save(name, &content)?;
        tracing::info!(
            "Preprocessed {} with spec {} as {:?}",
            name,
            spec.name(),
            format
        );
        Ok(())
    }

    /// Delete hook.
    ///
    /// Fails with [`Error::MissingIdentity`] for records that were never
    /// saved. Artifacts are removed before the record itself.
    pub fn delete(&self, record: &Record) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| Error::missing_identity("Record"))?;

        self.clear_cache(record)?;

        if self.registry.options().delete_source {
            if let Some(name) = record.image.as_deref() {
                self.storage.delete(name)?;
            }
        }

        if self.store.delete(id)? {
            tracing::info!("Deleted record {}", id);
        } else {
            tracing::warn!("Record {} was already gone from the store", id);
        }
        Ok(())
    }

    /// Delete every cached artifact of the record. Returns how many existed.
    pub fn clear_cache(&self, record: &Record) -> Result<usize> {
        let mut removed = 0;
        for accessor in self.accessors(record) {
            if accessor.delete()? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Generate the artifacts of every `pre_cache` spec. Returns how many
    /// were written.
    pub fn pre_cache(&self, record: &Record) -> Result<usize> {
        let mut created = 0;
        for accessor in self.accessors(record).filter(|a| a.spec().pre_cache) {
            if accessor.create()? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// URL of a spec's artifact, counting the view when the spec asks for it.
    pub fn view(&self, record: &mut Record, name: &str) -> Result<String> {
        let (url, count) = {
            let accessor = self
                .spec(record, name)
                .ok_or_else(|| Error::not_found(format!("image spec {}", name)))?;
            (
                accessor.url()?,
                accessor.spec().increment_count && self.registry.options().save_count_as,
            )
        };

        if count && record.has_identity() {
            record.view_count += 1;
            self.save(record, false)?;
        }
        Ok(url)
    }

    /// HTML snippet linking the admin thumbnail to the record.
    ///
    /// Without an admin thumbnail spec, returns a placeholder message.
    pub fn admin_thumbnail_view(&self, record: &Record) -> Result<String> {
        let spec_name = &self.registry.options().admin_thumbnail_spec;
        let Some(accessor) = self.spec(record, spec_name) else {
            return Ok(format!(
                "An \"{}\" image spec has not been defined.",
                spec_name
            ));
        };

        let thumb = accessor.url()?;
        let link = record
            .link
            .clone()
            .or_else(|| self.source_url(record))
            .unwrap_or_default();
        Ok(format!("<a href=\"{}\"><img src=\"{}\"></a>", link, thumb))
    }
}
