//! Record database queries.
//!
//! This module provides CRUD operations for records owning a source image.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use thumbforge_common::{CropAnchor, Error, RecordId, Result};

use crate::models::Record;

const RECORD_COLUMNS: &str =
    "id, image, image_hash, crop_horz, crop_vert, view_count, link, created_at, updated_at";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e.to_string()))
}

/// Parse a record from a database row.
///
/// Expects columns in the order of `RECORD_COLUMNS`.
fn parse_record_row(row: &rusqlite::Row) -> rusqlite::Result<Record> {
    let id: RecordId = row
        .get::<_, String>(0)?
        .parse()
        .map_err(|e: uuid::Error| conversion_error(0, e.to_string()))?;
    let crop_horz: CropAnchor = row
        .get::<_, String>(3)?
        .parse()
        .map_err(|e: String| conversion_error(3, e))?;
    let crop_vert: CropAnchor = row
        .get::<_, String>(4)?
        .parse()
        .map_err(|e: String| conversion_error(4, e))?;

    Ok(Record {
        id: Some(id),
        image: row.get(1)?,
        image_hash: row.get(2)?,
        crop_horz,
        crop_vert,
        view_count: row.get(5)?,
        link: row.get(6)?,
        created_at: parse_timestamp(7, row.get(7)?)?,
        updated_at: parse_timestamp(8, row.get(8)?)?,
    })
}

/// Insert a new record.
///
/// Uses the record's own ID when it carries one, otherwise generates a new one.
///
/// # Returns
///
/// * `Ok(RecordId)` - The ID of the inserted record
/// * `Err(Error)` - If the ID already exists or a database error occurs
pub fn insert_record(conn: &Connection, record: &Record) -> Result<RecordId> {
    let id = record.id.unwrap_or_default();

    conn.execute(
        "INSERT INTO records (id, image, image_hash, crop_horz, crop_vert, view_count, link,
                              created_at, updated_at)
         VALUES (:id, :image, :image_hash, :crop_horz, :crop_vert, :view_count, :link,
                 :created_at, :updated_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":image": &record.image,
            ":image_hash": &record.image_hash,
            ":crop_horz": record.crop_horz.to_string(),
            ":crop_vert": record.crop_vert.to_string(),
            ":view_count": record.view_count,
            ":link": &record.link,
            ":created_at": record.created_at.to_rfc3339(),
            ":updated_at": record.updated_at.to_rfc3339(),
        },
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::InvalidInput(format!("Record '{}' already exists", id))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(id)
}

/// Update every column of an existing record.
///
/// # Returns
///
/// * `Ok(true)` - If the record was updated
/// * `Ok(false)` - If no record with that ID exists
/// * `Err(Error)` - If the record has no ID or a database error occurs
pub fn update_record(conn: &Connection, record: &Record) -> Result<bool> {
    let id = record
        .id
        .ok_or_else(|| Error::invalid_input("cannot update a record without an ID"))?;

    let rows = conn
        .execute(
            "UPDATE records
             SET image = :image, image_hash = :image_hash, crop_horz = :crop_horz,
                 crop_vert = :crop_vert, view_count = :view_count, link = :link,
                 updated_at = :updated_at
             WHERE id = :id",
            rusqlite::named_params! {
                ":id": id.to_string(),
                ":image": &record.image,
                ":image_hash": &record.image_hash,
                ":crop_horz": record.crop_horz.to_string(),
                ":crop_vert": record.crop_vert.to_string(),
                ":view_count": record.view_count,
                ":link": &record.link,
                ":updated_at": record.updated_at.to_rfc3339(),
            },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows > 0)
}

/// Get a record by ID.
///
/// # Returns
///
/// * `Ok(Some(Record))` - The record if found
/// * `Ok(None)` - If the record does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_record(conn: &Connection, id: RecordId) -> Result<Option<Record>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM records WHERE id = :id", RECORD_COLUMNS),
        rusqlite::named_params! { ":id": id.to_string() },
        parse_record_row,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List records, oldest first.
pub fn list_records(conn: &Connection, limit: u32, offset: u32) -> Result<Vec<Record>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM records ORDER BY created_at, id LIMIT :limit OFFSET :offset",
            RECORD_COLUMNS
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let records = stmt
        .query_map(
            rusqlite::named_params! { ":limit": limit, ":offset": offset },
            parse_record_row,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(records)
}

/// Count all records.
pub fn count_records(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

/// Delete a record by ID.
///
/// # Returns
///
/// * `Ok(true)` - If the record was deleted
/// * `Ok(false)` - If the record did not exist
/// * `Err(Error)` - If a database error occurs
pub fn delete_record(conn: &Connection, id: RecordId) -> Result<bool> {
    let rows = conn
        .execute(
            "DELETE FROM records WHERE id = :id",
            rusqlite::named_params! { ":id": id.to_string() },
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows > 0)
}
