//! Document analysis: raw note text into one structured document.

use thiserror::Error;

use super::header::{extract_header_fields, HeaderFields};
use super::sections::{capture_section, diagnostics_narrative, strip_page_noise, subjective_text};
use super::tables::{reconstruct_table, SectionKind};
use super::types::{
    DiagnosticsSection, DoctorSummary, NoteSummary, OrdersSection, PatientSummary,
    StructuredDocument, VitalSignsSection,
};

/// Errors from document analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("document text is empty")]
    EmptyDocument,
}

/// Analyze the raw OCR text of one clinical note.
///
/// Pure and deterministic: header fields are extracted from the full text,
/// then each tabular section is captured and reconstructed from the
/// noise-filtered line stream. Missing fields and absent sections resolve
/// to empty values; only text with no content at all is an error.
pub fn analyze_document(raw: &str) -> Result<StructuredDocument, AnalyzeError> {
    if raw.trim().is_empty() {
        return Err(AnalyzeError::EmptyDocument);
    }

    let fields = extract_header_fields(raw);
    let lines: Vec<&str> = raw.split('\n').collect();
    let filtered = strip_page_noise(&lines);

    let table_for = |kind: SectionKind| {
        let captured = capture_section(&filtered, kind.label());
        reconstruct_table(kind, &captured)
    };

    let narrative = diagnostics_narrative(raw);
    let subjective = subjective_text(raw).trim().to_string();

    let HeaderFields {
        note_number,
        note_type,
        record_number,
        him,
        names,
        paternal_lastname,
        maternal_lastname,
        date_of_birth,
        gender,
        age,
        admission_date,
        admission_time,
        discharge_date,
        discharge_time,
        doctor_name,
        professional_certificate,
        sign_date,
        sign_time,
        hospital,
    } = fields;

    let document = StructuredDocument {
        patient: PatientSummary {
            him: him.clone(),
            names,
            paternal_lastname,
            maternal_lastname,
            date_of_birth,
            gender,
            age,
        },
        doctor: DoctorSummary {
            name: doctor_name,
            professional_certificate,
            sign_date,
            sign_time,
        },
        note: NoteSummary {
            note_number,
            note_type,
            record_number,
            him,
            admission_date,
            admission_time,
            discharge_date,
            discharge_time,
            hospital,
        },
        vital_signs: VitalSignsSection {
            table: table_for(SectionKind::VitalSigns),
            subjective_text: subjective,
        },
        active_diagnostics: DiagnosticsSection {
            table: table_for(SectionKind::ActiveDiagnostics),
            physical_exam: narrative.physical_exam,
            notes: narrative.notes,
            analysis: narrative.analysis,
            studies: narrative.studies,
            treatment_plan: narrative.treatment_plan,
        },
        dietetic_orders: OrdersSection {
            table: table_for(SectionKind::DieteticOrders),
        },
        nursing_orders: OrdersSection {
            table: table_for(SectionKind::NursingOrders),
        },
        prescriptions: OrdersSection {
            table: table_for(SectionKind::Prescriptions),
        },
    };

    tracing::debug!(
        him = document.patient.him.as_deref().unwrap_or(""),
        vital_rows = document.vital_signs.table.len(),
        diagnostic_rows = document.active_diagnostics.table.len(),
        prescription_rows = document.prescriptions.table.len(),
        "analyzed document"
    );
    Ok(document)
}
