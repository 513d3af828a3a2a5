//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an [`ImageModel`] to in-memory
//! storage and an in-memory database, plus helpers for generating source
//! images.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use thumbforge::{ImageModel, MemoryStorage, Options, Record, SpecDefinition, SpecRegistry, SqliteRecordStore};
use thumbforge_db::pool::{init_memory_pool, DbPool};

/// Test harness wrapping an [`ImageModel`] backed by memory storage.
pub struct TestHarness {
    pub model: ImageModel,
    pub storage: Arc<MemoryStorage>,
    pub db: DbPool,
}

impl TestHarness {
    /// Harness over the built-in spec module.
    pub fn new() -> Self {
        let registry = SpecRegistry::load(Options::default()).expect("built-in specs load");
        Self::with_registry(registry)
    }

    /// Harness over the given spec definitions.
    pub fn with_specs(options: Options, specs: Vec<SpecDefinition>) -> Self {
        let registry = SpecRegistry::from_specs(options, specs).expect("valid specs");
        Self::with_registry(registry)
    }

    pub fn with_registry(registry: SpecRegistry) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let storage = Arc::new(MemoryStorage::new("/media/"));
        let model = ImageModel::new(
            Arc::new(registry),
            storage.clone(),
            Arc::new(SqliteRecordStore::new(db.clone())),
        );
        Self { model, storage, db }
    }

    /// Create and save a record holding `content` as `filename`.
    pub fn add(&self, filename: &str, content: &[u8]) -> Record {
        let mut record = Record::new();
        self.model
            .set_image(&mut record, filename, content)
            .expect("set image");
        self.model.save(&mut record, true).expect("save record");
        record
    }

    /// Names of every cached artifact in storage.
    pub fn artifacts(&self) -> Vec<String> {
        let cache_dir = format!("{}/", self.model.registry().options().cache_dir);
        self.storage.names_with_prefix(&cache_dir)
    }
}

/// Encode a gradient image so that resampling changes its content.
pub fn gradient(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("encode test image");
    buf.into_inner()
}

/// Decode stored bytes, panicking on failure.
pub fn decode(content: &[u8]) -> DynamicImage {
    image::load_from_memory(content).expect("decode stored image")
}
