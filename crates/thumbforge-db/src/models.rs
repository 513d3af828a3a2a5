//! Internal Rust models matching the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thumbforge_common::{CropAnchor, RecordId};

/// A record owning a source image.
///
/// `id` is `None` until the record has been saved for the first time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: Option<RecordId>,
    /// Storage name of the source image.
    pub image: Option<String>,
    /// Content hash of the source image as of the last save.
    pub image_hash: Option<String>,
    pub crop_horz: CropAnchor,
    pub crop_vert: CropAnchor,
    pub view_count: i64,
    /// Detail page for the record, used as the admin thumbnail link.
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// A fresh, unsaved record without an image.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            image: None,
            image_hash: None,
            crop_horz: CropAnchor::default(),
            crop_vert: CropAnchor::default(),
            view_count: 0,
            link: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has been persisted.
    pub fn has_identity(&self) -> bool {
        self.id.is_some()
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}
