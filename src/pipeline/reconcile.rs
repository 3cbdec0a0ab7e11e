//! Reconciliation: merge one analyzed document into the patient history.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{
    add_doctor_association, find_or_create_patient, insert_note, insert_section_record,
    DatabaseError,
};
use crate::models::{DoctorAssociation, Gender, MedicalNote, Patient, RecordFamily, SectionRecord};

use super::types::{DoctorSummary, Row, StructuredDocument};

/// Attempts per document before a busy store is given up on.
pub const MAX_STORE_RETRIES: u32 = 3;
/// Base delay of the exponential retry backoff.
pub const RETRY_BASE_DELAY_MS: u64 = 250;

const SIGN_DATETIME_FMT: &str = "%d/%m/%Y %H:%M";
const EXTRACTED_DATE_FMT: &str = "%d/%m/%Y";

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("document carries no HIM, cannot resolve patient identity")]
    MissingHim,
    #[error("unparseable clinician sign date: {value}")]
    InvalidSignDate { value: String },
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("failed to serialize section rows: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What one reconciliation wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub patient_id: Uuid,
    pub note_id: Uuid,
    pub doctor_associated: bool,
    pub records_stored: usize,
}

/// Reconcile one structured document into the store, atomically.
///
/// The patient row is resolved by HIM through a single upsert, the note and
/// every non-empty section table are inserted under one transaction, and a
/// doctor association is appended when the document carries a sign date.
/// Any failure rolls the whole document back.
pub fn reconcile_document(
    conn: &Connection,
    document: &StructuredDocument,
) -> Result<ReconcileOutcome, ReconcileError> {
    let him = document
        .patient
        .him
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(ReconcileError::MissingHim)?;

    // parsed before the transaction so a bad date never opens one
    let signed_at = signature_timestamp(&document.doctor)?;
    let now = Utc::now().naive_utc();

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;

    let candidate = Patient {
        id: Uuid::new_v4(),
        him: him.to_string(),
        names: document.patient.names.clone(),
        paternal_lastname: document.patient.paternal_lastname.clone(),
        maternal_lastname: document.patient.maternal_lastname.clone(),
        date_of_birth: document
            .patient
            .date_of_birth
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, EXTRACTED_DATE_FMT).ok()),
        gender: Gender::from_extracted(document.patient.gender.as_deref()),
        age: document.patient.age.clone(),
        created_at: now,
        updated_at: now,
    };
    let patient = find_or_create_patient(&tx, &candidate)?;

    let note = MedicalNote {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        note_number: document.note.note_number.clone(),
        note_type: document.note.note_type.clone(),
        record_number: document.note.record_number.clone(),
        him: document.note.him.clone(),
        admission_date: document.note.admission_date.clone(),
        admission_time: document.note.admission_time.clone(),
        discharge_date: document.note.discharge_date.clone(),
        discharge_time: document.note.discharge_time.clone(),
        hospital: document.note.hospital.clone(),
        created_at: now,
    };
    insert_note(&tx, &note)?;

    let doctor_associated = match signed_at {
        Some(sign_date) => {
            add_doctor_association(
                &tx,
                &DoctorAssociation {
                    id: Uuid::new_v4(),
                    patient_id: patient.id,
                    professional_certificate: document.doctor.professional_certificate.clone(),
                    sign_date,
                },
            )?;
            true
        }
        None => false,
    };

    let tables: [(RecordFamily, &[Row]); 4] = [
        (RecordFamily::VitalSigns, document.vital_signs.table.as_slice()),
        (RecordFamily::DieteticOrders, document.dietetic_orders.table.as_slice()),
        (RecordFamily::NursingOrders, document.nursing_orders.table.as_slice()),
        (RecordFamily::Prescriptions, document.prescriptions.table.as_slice()),
    ];
    let mut records_stored = 0;
    for (family, rows) in tables {
        if rows.is_empty() {
            continue;
        }
        insert_section_record(
            &tx,
            family,
            &SectionRecord {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                note_id: note.id,
                data: serde_json::to_string(rows)?,
                created_at: now,
            },
        )?;
        records_stored += 1;
    }

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        him = %patient.him,
        patient_id = %patient.id,
        note_id = %note.id,
        doctor_associated,
        records_stored,
        "reconciled document"
    );

    Ok(ReconcileOutcome {
        patient_id: patient.id,
        note_id: note.id,
        doctor_associated,
        records_stored,
    })
}

/// Reconcile with backoff while the store reports transient lock pressure.
///
/// Runs on the blocking worker thread, so the backoff sleeps the thread.
pub fn reconcile_with_retry(
    conn: &Connection,
    document: &StructuredDocument,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut attempt = 1;
    loop {
        match reconcile_document(conn, document) {
            Ok(outcome) => return Ok(outcome),
            Err(error) if attempt < MAX_STORE_RETRIES && is_retryable_store_error(&error) => {
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << (attempt - 1));
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "store busy, retrying reconciliation"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Lock contention surfaces as SQLITE_BUSY or SQLITE_LOCKED; anything else
/// is a real failure and must not be retried.
fn is_retryable_store_error(error: &ReconcileError) -> bool {
    match error {
        ReconcileError::Database(DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _))) => {
            matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
        }
        _ => false,
    }
}

/// Combine the extracted sign date and time into one timestamp.
///
/// A date without a time signs at midnight; no date means no association.
/// A present but unparseable date is an error rather than a silent skip.
fn signature_timestamp(doctor: &DoctorSummary) -> Result<Option<NaiveDateTime>, ReconcileError> {
    match (doctor.sign_date.as_deref(), doctor.sign_time.as_deref()) {
        (Some(date), Some(time)) => {
            let joined = format!("{date} {time}");
            NaiveDateTime::parse_from_str(&joined, SIGN_DATETIME_FMT)
                .map(Some)
                .map_err(|_| ReconcileError::InvalidSignDate { value: joined })
        }
        (Some(date), None) => NaiveDate::parse_from_str(date, EXTRACTED_DATE_FMT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Some)
            .ok_or_else(|| ReconcileError::InvalidSignDate {
                value: date.to_string(),
            }),
        (None, _) => Ok(None),
    }
}
