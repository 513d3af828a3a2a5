//! Thumbforge - derived image caching for stored records
//!
//! Attach named image specs (thumbnails, previews, a preprocessing step) to
//! a record type and let the save and delete hooks of [`ImageModel`] keep
//! the cached artifacts in step with each record's source image.
//!
//! ```no_run
//! use std::sync::Arc;
//! use thumbforge::{FileSystemStorage, ImageModel, Options, Record, SpecRegistry, SqliteRecordStore};
//! use thumbforge_db::pool::init_pool;
//!
//! # fn main() -> thumbforge_common::Result<()> {
//! let registry = Arc::new(SpecRegistry::load(Options::default())?);
//! let storage = Arc::new(FileSystemStorage::new("./media".into(), "/media/"));
//! let store = Arc::new(SqliteRecordStore::new(init_pool("thumbforge.db")?));
//! let model = ImageModel::new(registry, storage, store);
//!
//! let mut record = Record::new();
//! model.set_image(&mut record, "cat.jpg", &std::fs::read("cat.jpg")?)?;
//! model.save(&mut record, true)?;
//! if let Some(thumb) = model.spec(&record, "thumbnail") {
//!     println!("{}", thumb.url()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod images;
pub mod model;
pub mod options;
pub mod registry;
pub mod specs;

pub use images::{FileSystemStorage, MemoryStorage, Storage};
pub use model::{ImageModel, RecordStore, SpecAccessor, SqliteRecordStore};
pub use options::Options;
pub use registry::SpecRegistry;
pub use specs::{ImageSpec, Processor, SpecDefinition};
pub use thumbforge_db::models::Record;
