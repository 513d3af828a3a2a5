//! Thumbforge-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across thumbforge:
//!
//! - **Typed IDs**: Type-safe UUID wrapper for record identities
//! - **Core Types**: Crop anchors used when cutting derived images
//! - **Path Utilities**: Storage name validation and splitting
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use thumbforge_common::{CropAnchor, Error, RecordId, Result};
//! use thumbforge_common::paths::split_name;
//!
//! let record_id = RecordId::new();
//! let anchor = CropAnchor::default();
//! assert_eq!(anchor, CropAnchor::Center);
//!
//! assert_eq!(split_name("images/photo.jpg").stem, "photo");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("record"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
