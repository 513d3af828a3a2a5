//! Thumbforge-DB: Database schema, migrations, and query operations
//!
//! This crate persists the records that own source images, using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use thumbforge_db::models::Record;
//! use thumbforge_db::pool::{init_pool, get_conn};
//! use thumbforge_db::queries::records;
//!
//! let pool = init_pool("/var/lib/thumbforge/db.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let mut record = Record::new();
//! record.image = Some("images/cat.jpg".to_string());
//! let id = records::insert_record(&conn, &record).unwrap();
//! println!("Created record: {}", id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
