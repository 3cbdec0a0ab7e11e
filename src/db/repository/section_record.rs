use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{RecordFamily, SectionRecord};
use crate::pipeline::types::Row;

use super::DATETIME_FMT;

pub fn insert_section_record(
    conn: &Connection,
    family: RecordFamily,
    record: &SectionRecord,
) -> Result<(), DatabaseError> {
    // table_name comes from the RecordFamily enum, never from input
    let sql = format!(
        "INSERT INTO {} (id, patient_id, note_id, data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        family.table_name()
    );
    conn.execute(
        &sql,
        params![
            record.id.to_string(),
            record.patient_id.to_string(),
            record.note_id.to_string(),
            record.data,
            record.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// All records of one family for a patient, newest first.
pub fn get_section_records(
    conn: &Connection,
    family: RecordFamily,
    patient_id: &Uuid,
) -> Result<Vec<SectionRecord>, DatabaseError> {
    let sql = format!(
        "SELECT id, patient_id, note_id, data, created_at
         FROM {} WHERE patient_id = ?1
         ORDER BY created_at DESC, id",
        family.table_name()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], row_to_record)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Decode a record's stored rows.
pub fn decode_rows(family: RecordFamily, record: &SectionRecord) -> Result<Vec<Row>, DatabaseError> {
    serde_json::from_str(&record.data).map_err(|e| DatabaseError::InvalidPayload {
        entity_type: family.table_name().into(),
        reason: e.to_string(),
    })
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<SectionRecord> {
    Ok(SectionRecord {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        note_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        data: row.get(3)?,
        created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(4)?, DATETIME_FMT)
            .unwrap_or_default(),
    })
}
