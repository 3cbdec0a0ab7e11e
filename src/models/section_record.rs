use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four persisted record families, one SQLite table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFamily {
    VitalSigns,
    DieteticOrders,
    NursingOrders,
    Prescriptions,
}

impl RecordFamily {
    pub const ALL: [RecordFamily; 4] = [
        RecordFamily::VitalSigns,
        RecordFamily::DieteticOrders,
        RecordFamily::NursingOrders,
        RecordFamily::Prescriptions,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::VitalSigns => "vital_signs",
            Self::DieteticOrders => "dietetic_orders",
            Self::NursingOrders => "nursing_orders",
            Self::Prescriptions => "prescriptions",
        }
    }
}

/// One note's reconstructed table for a record family.
///
/// `data` is the JSON array of rows exactly as the analyzer produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub note_id: Uuid,
    pub data: String,
    pub created_at: NaiveDateTime,
}
