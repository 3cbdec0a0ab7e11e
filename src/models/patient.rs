use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Gender;

/// One patient record. Identity is the hospital identity number (HIM),
/// unique across the store; every note for the same HIM accretes here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub him: String,
    pub names: Option<String>,
    pub paternal_lastname: Option<String>,
    pub maternal_lastname: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Gender,
    pub age: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// One signed note linking a doctor to a patient.
///
/// Duplicate doctors are not collapsed at write time; queries aggregate
/// associations per certificate instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAssociation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub professional_certificate: Option<String>,
    pub sign_date: NaiveDateTime,
}

/// Per-doctor aggregation of a patient's signed notes.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorVisit {
    pub professional_certificate: Option<String>,
    pub last_sign_date: NaiveDateTime,
    pub total_interactions: i64,
}
