//! Line segmentation: page-noise removal, section capture, narrative slicing.

use std::sync::LazyLock;

use regex::Regex;

/// Timestamp every table row carries: `dd/mm/YYYY HH:MM`.
pub(crate) static ROW_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}").unwrap());

const RECORD_MARKER: &str = "Expediente:";
const COPYRIGHT_MARKER: &str = "Derechos de Autor";

const VITAL_SIGNS_REGION_START: &str = "Signos Vitales - Últimas 24 horas";
const SUBJECTIVE_LABEL: &str = "Subjetivo";
const DIAGNOSTICS_REGION_START: &str = "Diagnósticos Activos";
const DIAGNOSTICS_REGION_END: &str = "Órdenes de Dietéticas Activas";

/// Diagnostics narrative labels, in page order. Each field runs from its
/// label to the next present label; `Notas` is located after `Examen Físico`
/// so the table's column-header row cannot satisfy it.
const NARRATIVE_LABELS: [&str; 5] = [
    "Examen Físico",
    "Notas",
    "Análisis/Condición",
    "Comentar estudio(s)",
    "Plan de Tratamiento",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusion {
    Including,
    Excluding,
}

impl Inclusion {
    fn toggled(self) -> Self {
        match self {
            Self::Including => Self::Excluding,
            Self::Excluding => Self::Including,
        }
    }
}

/// Remove the per-page header/footer block.
///
/// Each page reprints a block running from its `Expediente:` line through
/// the copyright line. Marker lines toggle the inclusion state; on
/// well-formed input the whole block, markers included, is dropped.
pub fn strip_page_noise<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut state = Inclusion::Including;
    let mut kept = Vec::with_capacity(lines.len());

    for &line in lines {
        let copyright = line.contains(COPYRIGHT_MARKER);
        let keep = if copyright || line.starts_with(RECORD_MARKER) {
            state = state.toggled();
            // the copyright marker closes a span and is itself dropped; a
            // record marker follows the state it just switched to
            if copyright {
                state == Inclusion::Excluding
            } else {
                state == Inclusion::Including
            }
        } else {
            state == Inclusion::Including
        };
        if keep {
            kept.push(line);
        }
    }
    kept
}

/// Section capture states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Seeking,
    Capturing,
    Done,
}

/// Collect the table lines of one section from the noise-filtered lines.
///
/// A line starting with the label opens capture; the label line itself is
/// not captured. A blank line closes capture, and a repeated label reopens
/// it, which is how multi-page tables come through. Captured lines must
/// carry a row timestamp; a timestamp-less line whose immediate neighbors
/// both carry timestamps is a wrapped cell and is merged into the previous
/// captured row. Anything else inside a section is dropped.
pub fn capture_section(lines: &[&str], label: &str) -> Vec<String> {
    let mut captured: Vec<String> = Vec::new();
    let mut state = CaptureState::Seeking;
    let mut index = 0;

    while state != CaptureState::Done {
        let Some(&line) = lines.get(index) else {
            state = CaptureState::Done;
            continue;
        };
        state = match state {
            CaptureState::Seeking if line.starts_with(label) => CaptureState::Capturing,
            CaptureState::Seeking => CaptureState::Seeking,
            CaptureState::Capturing => {
                if line.trim().is_empty() {
                    CaptureState::Seeking
                } else {
                    if ROW_TIMESTAMP.is_match(line) {
                        captured.push(line.to_string());
                    } else if is_wrapped_continuation(lines, index) {
                        if let Some(previous) = captured.last_mut() {
                            previous.push(' ');
                            previous.push_str(line.trim());
                        }
                    }
                    CaptureState::Capturing
                }
            }
            CaptureState::Done => CaptureState::Done,
        };
        index += 1;
    }
    captured
}

// A wrapped cell sits between two timestamped lines; checked by index, so
// duplicate line content cannot confuse the lookup.
fn is_wrapped_continuation(lines: &[&str], index: usize) -> bool {
    let before = index.checked_sub(1).and_then(|i| lines.get(i));
    let after = lines.get(index + 1);
    matches!((before, after), (Some(b), Some(a))
        if ROW_TIMESTAMP.is_match(b) && ROW_TIMESTAMP.is_match(a))
}

/// Slice from `start` (label included) up to the next occurrence of `end`
/// after it, or to the end of the text when `end` is absent.
fn label_bounded<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let Some(begin) = text.find(start) else {
        return "";
    };
    let region = &text[begin..];
    match region[start.len()..].find(end) {
        Some(offset) => &region[..start.len() + offset],
        None => region,
    }
}

fn from_label<'a>(text: &'a str, start: &str) -> &'a str {
    match text.find(start) {
        Some(begin) => &text[begin..],
        None => "",
    }
}

/// The vital-signs narrative region. Falls back to the `Subjetivo` label
/// when the section heading is missing.
pub fn vital_signs_region(text: &str) -> &str {
    let start = if text.contains(VITAL_SIGNS_REGION_START) {
        VITAL_SIGNS_REGION_START
    } else {
        SUBJECTIVE_LABEL
    };
    label_bounded(text, start, DIAGNOSTICS_REGION_START)
}

/// The subjective narrative: from `Subjetivo` to the end of the
/// vital-signs region.
pub fn subjective_text(text: &str) -> &str {
    from_label(vital_signs_region(text), SUBJECTIVE_LABEL)
}

/// The active-diagnostics region, table and narrative included.
pub fn diagnostics_region(text: &str) -> &str {
    label_bounded(text, DIAGNOSTICS_REGION_START, DIAGNOSTICS_REGION_END)
}

/// Narrative free-text fields of the active-diagnostics region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsNarrative {
    pub physical_exam: String,
    pub notes: String,
    pub analysis: String,
    pub studies: String,
    pub treatment_plan: String,
}

/// Slice the diagnostics narrative fields out of the raw text.
///
/// Labels are searched in page order, each from the position of the last
/// label found; a missing label yields an empty field.
pub fn diagnostics_narrative(text: &str) -> DiagnosticsNarrative {
    let region = diagnostics_region(text);

    let mut found: [Option<usize>; 5] = [None; 5];
    let mut cursor = 0;
    for (i, label) in NARRATIVE_LABELS.iter().enumerate() {
        if let Some(offset) = region[cursor..].find(label) {
            let at = cursor + offset;
            found[i] = Some(at);
            cursor = at;
        }
    }

    let slice = |i: usize| -> String {
        let Some(start) = found[i] else {
            return String::new();
        };
        let end = found[i + 1..]
            .iter()
            .flatten()
            .next()
            .copied()
            .unwrap_or(region.len());
        region[start..end].trim().to_string()
    };

    DiagnosticsNarrative {
        physical_exam: slice(0),
        notes: slice(1),
        analysis: slice(2),
        studies: slice(3),
        treatment_plan: slice(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_block_removed_markers_included() {
        let lines = vec![
            "01/04/2024 10:30   18   120",
            "Expediente: 998877   HIM: 12345",
            "pie de página",
            "Hospital Infantil   Derechos de Autor 2024",
            "01/04/2024 11:30   20   118",
        ];
        let kept = strip_page_noise(&lines);
        assert_eq!(
            kept,
            vec!["01/04/2024 10:30   18   120", "01/04/2024 11:30   20   118"]
        );
    }

    #[test]
    fn noise_filter_handles_multiple_pages() {
        let lines = vec![
            "fila 1",
            "Expediente: 1",
            "Derechos de Autor",
            "fila 2",
            "Expediente: 2",
            "Derechos de Autor",
            "fila 3",
        ];
        assert_eq!(strip_page_noise(&lines), vec!["fila 1", "fila 2", "fila 3"]);
    }

    #[test]
    fn capture_opens_on_label_and_closes_on_blank() {
        let lines = vec![
            "Signos Vitales - Últimas 24 horas",
            "Fecha/Hora   FR   FC",
            "01/04/2024 10:30   18   120",
            "01/04/2024 11:30   20   118",
            " ",
            "01/04/2024 12:30   21   110",
        ];
        let captured = capture_section(&lines, "Signos Vitales");
        assert_eq!(
            captured,
            vec![
                "01/04/2024 10:30   18   120".to_string(),
                "01/04/2024 11:30   20   118".to_string(),
            ]
        );
    }

    #[test]
    fn capture_resumes_on_repeated_label() {
        let lines = vec![
            "Órdenes de Medicamentos Hospitalarios",
            "01/04/2024 10:30   Paracetamol",
            "",
            "otra cosa",
            "Órdenes de Medicamentos Hospitalarios",
            "02/04/2024 09:00   Ibuprofeno",
        ];
        let captured = capture_section(&lines, "Órdenes de Medicamentos Hospitalarios");
        assert_eq!(captured.len(), 2);
        assert!(captured[1].starts_with("02/04/2024"));
    }

    #[test]
    fn wrapped_line_merges_into_previous_row() {
        let lines = vec![
            "Diagnósticos Activos",
            "01/04/2024 09:00   Neumonía adquirida en",
            "la comunidad   Principal",
            "01/04/2024 09:05   Asma   Secundario",
        ];
        let captured = capture_section(&lines, "Diagnósticos Activos");
        assert_eq!(captured.len(), 2);
        assert_eq!(
            captured[0],
            "01/04/2024 09:00   Neumonía adquirida en la comunidad   Principal"
        );
    }

    #[test]
    fn stray_line_without_timestamped_neighbors_is_dropped() {
        let lines = vec![
            "Diagnósticos Activos",
            "01/04/2024 09:00   Neumonía   Principal",
            "texto suelto",
            "más texto suelto",
        ];
        let captured = capture_section(&lines, "Diagnósticos Activos");
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0], "01/04/2024 09:00   Neumonía   Principal");
    }

    #[test]
    fn lines_before_label_are_ignored() {
        let lines = vec![
            "01/04/2024 08:00   fila de otra sección",
            "Órdenes de Enfermería Activas",
            "01/04/2024 09:00   curación",
        ];
        let captured = capture_section(&lines, "Órdenes de Enfermería Activas");
        assert_eq!(captured, vec!["01/04/2024 09:00   curación".to_string()]);
    }

    #[test]
    fn label_absent_captures_nothing() {
        let lines = vec!["01/04/2024 10:30   18"];
        assert!(capture_section(&lines, "Signos Vitales").is_empty());
    }

    #[test]
    fn vital_region_bounded_by_diagnostics() {
        let text = "Signos Vitales - Últimas 24 horas\ntabla\nSubjetivo\nestable\nDiagnósticos Activos\nresto";
        let region = vital_signs_region(text);
        assert!(region.starts_with("Signos Vitales"));
        assert!(region.contains("estable"));
        assert!(!region.contains("Diagnósticos"));
        assert_eq!(subjective_text(text), "Subjetivo\nestable\n");
    }

    #[test]
    fn vital_region_falls_back_to_subjective() {
        let text = "encabezado\nSubjetivo\npaciente estable\nDiagnósticos Activos\nresto";
        let region = vital_signs_region(text);
        assert!(region.starts_with("Subjetivo"));
        assert!(region.contains("paciente estable"));
    }

    #[test]
    fn narrative_fields_bounded_by_next_label() {
        let text = "Diagnósticos Activos\n\
                    Fecha Ingresada   Descripción   Tipo   Médico   Notas\n\
                    01/04/2024 09:00   Neumonía   Principal   DR PEREZ   ninguna\n\
                    Examen Físico\ncampos limpios\n\
                    Notas\nsin novedades\n\
                    Análisis/Condición\nestable\n\
                    Comentar estudio(s)\nradiografía\n\
                    Plan de Tratamiento\nalta\n\
                    Órdenes de Dietéticas Activas\nresto";
        let narrative = diagnostics_narrative(text);
        assert_eq!(narrative.physical_exam, "Examen Físico\ncampos limpios");
        // the table header also says Notas; the narrative label must win
        assert_eq!(narrative.notes, "Notas\nsin novedades");
        assert_eq!(narrative.analysis, "Análisis/Condición\nestable");
        assert_eq!(narrative.studies, "Comentar estudio(s)\nradiografía");
        assert_eq!(narrative.treatment_plan, "Plan de Tratamiento\nalta");
    }

    #[test]
    fn missing_narrative_labels_yield_empty_fields() {
        let text = "Diagnósticos Activos\nExamen Físico\ntodo normal\nPlan de Tratamiento\nalta\nÓrdenes de Dietéticas Activas";
        let narrative = diagnostics_narrative(text);
        assert_eq!(narrative.physical_exam, "Examen Físico\ntodo normal");
        assert_eq!(narrative.notes, "");
        assert_eq!(narrative.analysis, "");
        assert_eq!(narrative.studies, "");
        assert_eq!(narrative.treatment_plan, "Plan de Tratamiento\nalta");
    }

    #[test]
    fn missing_region_yields_default_narrative() {
        assert_eq!(diagnostics_narrative("sin secciones"), DiagnosticsNarrative::default());
    }
}
