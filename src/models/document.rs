use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DocumentStatus;

/// Intake tracking row for one uploaded note.
///
/// Status moves pending → processing → analyzed | failed; a manual
/// re-trigger re-enters processing. On success `extracted_data` holds the
/// serialized structured output; on failure `error_message` holds the
/// displayable cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub extracted_data: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub analyzed_at: Option<NaiveDateTime>,
}

impl Document {
    /// A fresh pending document.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            status: DocumentStatus::Pending,
            error_message: None,
            extracted_data: None,
            created_at: now,
            updated_at: now,
            analyzed_at: None,
        }
    }
}
