use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::MedicalNote;

use super::DATETIME_FMT;

pub fn insert_note(conn: &Connection, note: &MedicalNote) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notes (id, patient_id, note_number, note_type, record_number, him,
         admission_date, admission_time, discharge_date, discharge_time, hospital, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            note.id.to_string(),
            note.patient_id.to_string(),
            note.note_number,
            note.note_type,
            note.record_number,
            note.him,
            note.admission_date,
            note.admission_time,
            note.discharge_date,
            note.discharge_time,
            note.hospital,
            note.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// All notes of one patient, newest first.
pub fn get_notes_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<MedicalNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, note_number, note_type, record_number, him,
                admission_date, admission_time, discharge_date, discharge_time, hospital, created_at
         FROM notes
         WHERE patient_id = ?1
         ORDER BY created_at DESC, id",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], row_to_note)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn row_to_note(row: &rusqlite::Row) -> rusqlite::Result<MedicalNote> {
    Ok(MedicalNote {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        note_number: row.get(2)?,
        note_type: row.get(3)?,
        record_number: row.get(4)?,
        him: row.get(5)?,
        admission_date: row.get(6)?,
        admission_time: row.get(7)?,
        discharge_date: row.get(8)?,
        discharge_time: row.get(9)?,
        hospital: row.get(10)?,
        created_at: NaiveDateTime::parse_from_str(&row.get::<_, String>(11)?, DATETIME_FMT)
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::find_or_create_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Gender, Patient};
    use chrono::NaiveDate;

    fn stored_patient(conn: &Connection) -> Patient {
        let now = NaiveDate::from_ymd_opt(2024, 4, 2)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        find_or_create_patient(
            conn,
            &Patient {
                id: Uuid::new_v4(),
                him: "12345".into(),
                names: None,
                paternal_lastname: None,
                maternal_lastname: None,
                date_of_birth: None,
                gender: Gender::Male,
                age: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap()
    }

    fn sample_note(patient_id: Uuid, number: &str) -> MedicalNote {
        MedicalNote {
            id: Uuid::new_v4(),
            patient_id,
            note_number: Some(number.into()),
            note_type: Some("Nota de Evolución Médica".into()),
            record_number: Some("998877".into()),
            him: Some("12345".into()),
            admission_date: Some("28/03/2024".into()),
            admission_time: Some("14:20".into()),
            discharge_date: Some("02/04/2024".into()),
            discharge_time: Some("11:00".into()),
            hospital: Some("Hospital Infantil".into()),
            created_at: NaiveDate::from_ymd_opt(2024, 4, 2)
                .unwrap()
                .and_hms_opt(11, 5, 0)
                .unwrap(),
        }
    }

    #[test]
    fn insert_and_list_notes() {
        let conn = open_memory_database().unwrap();
        let patient = stored_patient(&conn);

        insert_note(&conn, &sample_note(patient.id, "4821")).unwrap();
        insert_note(&conn, &sample_note(patient.id, "4822")).unwrap();

        let notes = get_notes_by_patient(&conn, &patient.id).unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].him.as_deref(), Some("12345"));
        assert_eq!(notes[0].admission_date.as_deref(), Some("28/03/2024"));
    }

    #[test]
    fn note_requires_existing_patient() {
        let conn = open_memory_database().unwrap();
        let orphan = sample_note(Uuid::new_v4(), "4821");
        assert!(insert_note(&conn, &orphan).is_err());
    }
}
