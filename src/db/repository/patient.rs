use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{DoctorAssociation, DoctorVisit, Gender, Patient};

use super::{DATETIME_FMT, DATE_FMT};

/// Find the patient holding this HIM, or create it, in one statement.
///
/// The UNIQUE constraint on `him` plus the upsert closes the race between
/// concurrent reconciliations of the same patient: whichever insert lands
/// second degrades to a no-op update and reads back the winner's row.
pub fn find_or_create_patient(
    conn: &Connection,
    candidate: &Patient,
) -> Result<Patient, DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO patients (id, him, names, paternal_lastname, maternal_lastname,
                               date_of_birth, gender, age, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(him) DO UPDATE SET updated_at = excluded.updated_at
         RETURNING id, him, names, paternal_lastname, maternal_lastname,
                   date_of_birth, gender, age, created_at, updated_at",
    )?;

    let patient = stmt.query_row(
        params![
            candidate.id.to_string(),
            candidate.him,
            candidate.names,
            candidate.paternal_lastname,
            candidate.maternal_lastname,
            candidate.date_of_birth.map(|d| d.format(DATE_FMT).to_string()),
            candidate.gender.as_str(),
            candidate.age,
            candidate.created_at.format(DATETIME_FMT).to_string(),
            candidate.updated_at.format(DATETIME_FMT).to_string(),
        ],
        row_to_patient,
    )?;
    Ok(patient)
}

pub fn get_patient_by_him(conn: &Connection, him: &str) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, him, names, paternal_lastname, maternal_lastname,
                date_of_birth, gender, age, created_at, updated_at
         FROM patients WHERE him = ?1 LIMIT 1",
    )?;

    let result = stmt.query_row(params![him], row_to_patient);
    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

pub fn add_doctor_association(
    conn: &Connection,
    assoc: &DoctorAssociation,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO doctor_associations (id, patient_id, professional_certificate, sign_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            assoc.id.to_string(),
            assoc.patient_id.to_string(),
            assoc.professional_certificate,
            assoc.sign_date.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// Raw associations in signing order, newest first.
pub fn list_doctor_associations(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<DoctorAssociation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, professional_certificate, sign_date
         FROM doctor_associations
         WHERE patient_id = ?1
         ORDER BY sign_date DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(DoctorAssociation {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            professional_certificate: row.get(2)?,
            sign_date: parse_datetime(&row.get::<_, String>(3)?),
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Associations aggregated per doctor: latest signature and interaction count.
pub fn list_doctor_visits(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<DoctorVisit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT professional_certificate, MAX(sign_date), COUNT(*)
         FROM doctor_associations
         WHERE patient_id = ?1
         GROUP BY professional_certificate
         ORDER BY MAX(sign_date) DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(DoctorVisit {
            professional_certificate: row.get(0)?,
            last_sign_date: parse_datetime(&row.get::<_, String>(1)?),
            total_interactions: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn row_to_patient(row: &rusqlite::Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        him: row.get(1)?,
        names: row.get(2)?,
        paternal_lastname: row.get(3)?,
        maternal_lastname: row.get(4)?,
        date_of_birth: row
            .get::<_, Option<String>>(5)?
            .and_then(|d| NaiveDate::parse_from_str(&d, DATE_FMT).ok()),
        gender: Gender::from_str(&row.get::<_, String>(6)?).unwrap_or(Gender::Other),
        age: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_default()
}
