use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Document, DocumentStatus};

use super::DATETIME_FMT;

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, title, status, error_message, extracted_data,
         created_at, updated_at, analyzed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doc.id.to_string(),
            doc.title,
            doc.status.as_str(),
            doc.error_message,
            doc.extracted_data,
            doc.created_at.format(DATETIME_FMT).to_string(),
            doc.updated_at.format(DATETIME_FMT).to_string(),
            doc.analyzed_at.map(|t| t.format(DATETIME_FMT).to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, status, error_message, extracted_data,
                created_at, updated_at, analyzed_at
         FROM documents WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], row_to_document);
    match result {
        Ok(doc) => Ok(Some(doc)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All documents in a given status, newest first.
pub fn get_documents_by_status(
    conn: &Connection,
    status: DocumentStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, title, status, error_message, extracted_data,
                created_at, updated_at, analyzed_at
         FROM documents WHERE status = ?1
         ORDER BY created_at DESC, id",
    )?;

    let rows = stmt.query_map(params![status.as_str()], row_to_document)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Enter processing. Clears any error left by a previous attempt, so a
/// manual re-trigger starts from a clean row.
pub fn mark_document_processing(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE documents
         SET status = ?2, error_message = NULL, updated_at = ?3
         WHERE id = ?1",
        params![
            id.to_string(),
            DocumentStatus::Processing.as_str(),
            now_stamp(),
        ],
    )?;
    ensure_updated(updated, id)
}

pub fn mark_document_analyzed(
    conn: &Connection,
    id: &Uuid,
    extracted_data: &str,
) -> Result<(), DatabaseError> {
    let stamp = now_stamp();
    let updated = conn.execute(
        "UPDATE documents
         SET status = ?2, extracted_data = ?3, error_message = NULL,
             updated_at = ?4, analyzed_at = ?4
         WHERE id = ?1",
        params![
            id.to_string(),
            DocumentStatus::Analyzed.as_str(),
            extracted_data,
            stamp,
        ],
    )?;
    ensure_updated(updated, id)
}

pub fn mark_document_failed(
    conn: &Connection,
    id: &Uuid,
    message: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE documents
         SET status = ?2, error_message = ?3, updated_at = ?4
         WHERE id = ?1",
        params![
            id.to_string(),
            DocumentStatus::Failed.as_str(),
            message,
            now_stamp(),
        ],
    )?;
    ensure_updated(updated, id)
}

fn ensure_updated(rows: usize, id: &Uuid) -> Result<(), DatabaseError> {
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn now_stamp() -> String {
    Utc::now().naive_utc().format(DATETIME_FMT).to_string()
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let status = row.get::<_, String>(2)?;
    Ok(Document {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        title: row.get(1)?,
        status: DocumentStatus::from_str(&status).unwrap_or(DocumentStatus::Pending),
        error_message: row.get(3)?,
        extracted_data: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
        analyzed_at: row
            .get::<_, Option<String>>(7)?
            .map(|t| parse_datetime(&t)),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}
