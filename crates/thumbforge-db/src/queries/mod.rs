//! Database query modules.
//!
//! - records: Record CRUD and listing

pub mod records;
