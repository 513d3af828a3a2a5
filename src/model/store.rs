//! Record persistence used by the lifecycle hooks.

use thumbforge_common::{RecordId, Result};
use thumbforge_db::models::Record;
use thumbforge_db::pool::{get_conn, DbPool};
use thumbforge_db::queries::records;

/// Save/delete primitives for records.
pub trait RecordStore: Send + Sync {
    /// Insert a new record, returning its identity.
    fn insert(&self, record: &Record) -> Result<RecordId>;

    /// Update an existing record. `Ok(false)` when it does not exist.
    fn update(&self, record: &Record) -> Result<bool>;

    fn get(&self, id: RecordId) -> Result<Option<Record>>;

    /// Delete a record. `Ok(false)` when it did not exist.
    fn delete(&self, id: RecordId) -> Result<bool>;

    fn list(&self, limit: u32, offset: u32) -> Result<Vec<Record>>;

    fn count(&self) -> Result<i64>;
}

/// [`RecordStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for SqliteRecordStore {
    fn insert(&self, record: &Record) -> Result<RecordId> {
        let conn = get_conn(&self.pool)?;
        records::insert_record(&conn, record)
    }

    fn update(&self, record: &Record) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        records::update_record(&conn, record)
    }

    fn get(&self, id: RecordId) -> Result<Option<Record>> {
        let conn = get_conn(&self.pool)?;
        records::get_record(&conn, id)
    }

    fn delete(&self, id: RecordId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        records::delete_record(&conn, id)
    }

    fn list(&self, limit: u32, offset: u32) -> Result<Vec<Record>> {
        let conn = get_conn(&self.pool)?;
        records::list_records(&conn, limit, offset)
    }

    fn count(&self) -> Result<i64> {
        let conn = get_conn(&self.pool)?;
        records::count_records(&conn)
    }
}
