//! Intake worker: drives one document through analysis and reconciliation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use uuid::Uuid;

use crate::db::{
    mark_document_analyzed, mark_document_failed, mark_document_processing, open_database,
    DatabaseError,
};

use super::analyzer::{analyze_document, AnalyzeError};
use super::reconcile::{reconcile_with_retry, ReconcileError, ReconcileOutcome};

/// Default wall-clock budget for one document.
pub const DEFAULT_BUDGET_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("failed to serialize extracted document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("processing budget of {0:?} exceeded")]
    BudgetExceeded(Duration),
    #[error("processing task panicked: {0}")]
    TaskPanicked(String),
}

/// Process one pending document within a wall-clock budget.
///
/// The document row enters `processing` first, then analysis and
/// reconciliation run on the blocking pool. Success stores the serialized
/// extraction and marks the row `analyzed`; any failure, the budget
/// included, marks it `failed` with the error message. On timeout the
/// blocking task is abandoned; its connection dies with it and the
/// transaction rolls back.
pub async fn process_document(
    db_path: &Path,
    document_id: Uuid,
    raw_text: String,
    budget: Duration,
) -> Result<ReconcileOutcome, ProcessingError> {
    {
        let conn = open_database(db_path)?;
        mark_document_processing(&conn, &document_id)?;
    }

    let worker_path: PathBuf = db_path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || {
        let conn = open_database(&worker_path)?;
        let document = analyze_document(&raw_text)?;
        let outcome = reconcile_with_retry(&conn, &document)?;
        let extracted = serde_json::to_string(&document)?;
        Ok::<_, ProcessingError>((outcome, extracted))
    });

    let result = match timeout(budget, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ProcessingError::TaskPanicked(join_error.to_string())),
        Err(_) => Err(ProcessingError::BudgetExceeded(budget)),
    };

    let conn = open_database(db_path)?;
    match result {
        Ok((outcome, extracted)) => {
            mark_document_analyzed(&conn, &document_id, &extracted)?;
            tracing::info!(
                document_id = %document_id,
                patient_id = %outcome.patient_id,
                records_stored = outcome.records_stored,
                "document analyzed"
            );
            Ok(outcome)
        }
        Err(error) => {
            mark_document_failed(&conn, &document_id, &error.to_string())?;
            tracing::warn!(document_id = %document_id, error = %error, "document processing failed");
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_document, get_patient_by_him, insert_document};
    use crate::models::{Document, DocumentStatus};

    fn sample_note() -> String {
        "\
Expediente: 5544
HIM: 12345   LOPEZ DIAZ, JUAN   Fecha de Nacimiento: 15/03/2020   Masculino (4 años)
Nota de Evolución   Derechos de Autor 2024

Signos Vitales - Últimas 24 horas
01/01/2024 08:00   18   72   120   80   98   36.5   70   170

Subjetivo
Estable.

Firmado por: GARCIA SANCHEZ PEDRO - 02/01/2024 11:30   Cedula PROF.: 1234567"
            .to_string()
    }

    fn budget() -> Duration {
        Duration::from_secs(DEFAULT_BUDGET_SECS)
    }

    #[tokio::test]
    async fn processes_document_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("notamed.db");
        let document = Document::new("nota_01.pdf");
        {
            let conn = open_database(&db_path).unwrap();
            insert_document(&conn, &document).unwrap();
        }

        let outcome = process_document(&db_path, document.id, sample_note(), budget())
            .await
            .unwrap();
        assert_eq!(outcome.records_stored, 1);
        assert!(outcome.doctor_associated);

        let conn = open_database(&db_path).unwrap();
        let stored = get_document(&conn, &document.id).unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Analyzed);
        assert!(stored.extracted_data.is_some());
        assert!(stored.analyzed_at.is_some());
        assert!(stored.error_message.is_none());

        let patient = get_patient_by_him(&conn, "12345").unwrap();
        assert_eq!(patient.map(|p| p.id), Some(outcome.patient_id));
    }

    #[tokio::test]
    async fn empty_text_marks_document_failed() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("notamed.db");
        let document = Document::new("vacia.pdf");
        {
            let conn = open_database(&db_path).unwrap();
            insert_document(&conn, &document).unwrap();
        }

        let error = process_document(&db_path, document.id, "   \n ".to_string(), budget())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ProcessingError::Analyze(AnalyzeError::EmptyDocument)
        ));

        let conn = open_database(&db_path).unwrap();
        let stored = get_document(&conn, &document.id).unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Failed);
        assert!(stored
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("empty")));
    }

    #[tokio::test]
    async fn missing_document_row_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("notamed.db");
        // create the schema without inserting any document
        drop(open_database(&db_path).unwrap());

        let error = process_document(&db_path, Uuid::new_v4(), sample_note(), budget())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ProcessingError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reprocessing_after_failure_clears_error() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("notamed.db");
        let document = Document::new("reintento.pdf");
        {
            let conn = open_database(&db_path).unwrap();
            insert_document(&conn, &document).unwrap();
        }

        process_document(&db_path, document.id, String::new(), budget())
            .await
            .unwrap_err();
        process_document(&db_path, document.id, sample_note(), budget())
            .await
            .unwrap();

        let conn = open_database(&db_path).unwrap();
        let stored = get_document(&conn, &document.id).unwrap().unwrap();
        assert_eq!(stored.status, DocumentStatus::Analyzed);
        assert!(stored.error_message.is_none());
    }
}
