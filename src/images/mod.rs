//! Image encoding and file storage.
//!
//! [`codec`] decodes source images and encodes derived ones with
//! per-format options. The storage backends hold the bytes of source
//! files and cached artifacts.

pub mod codec;
mod storage;

pub use storage::{FileSystemStorage, MemoryStorage, Storage};
