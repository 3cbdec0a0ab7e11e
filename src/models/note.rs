use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata of one clinical note as printed on the page.
///
/// Dates and times stay in the source layout formats (`dd/mm/YYYY`,
/// `HH:MM`); absent fields were simply not found on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalNote {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub note_number: Option<String>,
    pub note_type: Option<String>,
    pub record_number: Option<String>,
    pub him: Option<String>,
    pub admission_date: Option<String>,
    pub admission_time: Option<String>,
    pub discharge_date: Option<String>,
    pub discharge_time: Option<String>,
    pub hospital: Option<String>,
    pub created_at: NaiveDateTime,
}
