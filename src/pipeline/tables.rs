//! Table reconstruction: captured section lines into schema-checked rows.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Row;

/// Leading row timestamp plus the spaces that pad it from the first cell.
static LEADING_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2}/\d{2}/\d{4} \d{2}:\d{2}) *").unwrap());

/// Cells inside a rendered row are padded with at least three spaces.
const SEGMENT_DELIMITER: &str = "   ";

/// The tabular sections a note renders, with their labels and schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    VitalSigns,
    DieteticOrders,
    ActiveDiagnostics,
    NursingOrders,
    Prescriptions,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::VitalSigns,
        SectionKind::DieteticOrders,
        SectionKind::ActiveDiagnostics,
        SectionKind::NursingOrders,
        SectionKind::Prescriptions,
    ];

    /// Section heading as printed in the note.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::VitalSigns => "Signos Vitales",
            SectionKind::DieteticOrders => "Órdenes de Dietéticas Activas",
            SectionKind::ActiveDiagnostics => "Diagnósticos Activos",
            SectionKind::NursingOrders => "Órdenes de Enfermería Activas",
            SectionKind::Prescriptions => "Órdenes de Medicamentos Hospitalarios",
        }
    }

    /// Column names, in render order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            SectionKind::VitalSigns => &[
                "Fecha/Hora",
                "FR",
                "FC",
                "PAS",
                "PAD",
                "SAT O2",
                "Temp °C",
                "Peso",
                "Talla",
            ],
            SectionKind::DieteticOrders => {
                &["Fecha Ingresada", "Tipo", "Tipo Terapéutico", "Notas"]
            }
            SectionKind::ActiveDiagnostics => {
                &["Fecha Ingresada", "Descripción", "Tipo", "Médico", "Notas"]
            }
            SectionKind::NursingOrders => &["Fecha Ingresada", "Orden", "Médico"],
            SectionKind::Prescriptions => &[
                "Inicio",
                "Medicamento",
                "Frecuencia",
                "Via",
                "Dosis",
                "UDM",
                "Cantidad",
                "Tipo",
                "Médico",
                "Tasa de Flujo",
            ],
        }
    }

    /// First token of the section's rendered column-header line, used to
    /// skip that line when it survives capture.
    fn header_prefix(&self) -> &'static str {
        match self {
            SectionKind::VitalSigns => "Fecha/Hora",
            SectionKind::Prescriptions => "Inicio",
            _ => "Fecha",
        }
    }
}

/// Split one captured line into its leading timestamp and padded cells.
///
/// Returns `None` when the line does not start with a row timestamp. The
/// rendered rows end with delimiter padding, so the final empty segment is
/// popped; a non-empty tail is a real cell and stays.
fn split_line(line: &str) -> Option<(String, Vec<String>)> {
    let captures = LEADING_TIMESTAMP.captures(line)?;
    let timestamp = captures.get(1)?.as_str().to_string();
    let rest = &line[captures.get(0)?.end()..];

    let mut segments: Vec<String> = rest
        .split(SEGMENT_DELIMITER)
        .map(|s| s.trim().to_string())
        .collect();
    if segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    Some((timestamp, segments))
}

/// Assemble the cells of one row from its timestamp and split segments.
///
/// Vital signs, dietetic orders and nursing orders are positional. In
/// diagnostics and prescriptions the physician cell can itself contain the
/// delimiter, so those sections pin the fixed cells, rejoin the over-split
/// middle run into the physician column and take the tail as the last
/// column. Degenerate lines assemble short and are caught by the arity
/// check in [`reconstruct_table`].
fn assemble(kind: SectionKind, timestamp: String, segments: Vec<String>) -> Vec<String> {
    let mut cells = vec![timestamp];
    match kind {
        SectionKind::VitalSigns | SectionKind::DieteticOrders | SectionKind::NursingOrders => {
            cells.extend(segments);
        }
        SectionKind::ActiveDiagnostics => {
            // description and type are pinned; physician spans 2..n-1
            let n = segments.len();
            if let Some(first) = segments.first() {
                cells.push(first.clone());
            }
            if let Some(second) = segments.get(1) {
                cells.push(second.clone());
            }
            cells.push(
                segments
                    .get(2..n.saturating_sub(1))
                    .unwrap_or(&[])
                    .join(" "),
            );
            if let Some(last) = segments.last() {
                cells.push(last.clone());
            }
        }
        SectionKind::Prescriptions => {
            // seven fixed cells, then physician spans 7..n-1, then flow rate
            let n = segments.len();
            cells.extend(segments.iter().take(7).cloned());
            cells.push(
                segments
                    .get(7..n.saturating_sub(1))
                    .unwrap_or(&[])
                    .join(" "),
            );
            if let Some(last) = segments.last() {
                cells.push(last.clone());
            }
        }
    }
    cells
}

/// Rebuild a section table from its captured lines.
///
/// Header-reprint lines are skipped and timestamp-less lines dropped with a
/// debug trace. The whole table is discarded when any assembled row does
/// not match the section schema, so a malformed render can never shift
/// values into the wrong columns.
pub fn reconstruct_table(kind: SectionKind, lines: &[String]) -> Vec<Row> {
    let columns = kind.columns();
    let mut raw_rows: Vec<Vec<String>> = Vec::new();

    for line in lines {
        if line.trim_start().starts_with(kind.header_prefix()) {
            continue;
        }
        let Some((timestamp, segments)) = split_line(line) else {
            tracing::debug!(section = kind.label(), line = %line, "dropping non-row line");
            continue;
        };
        raw_rows.push(assemble(kind, timestamp, segments));
    }

    if raw_rows.iter().any(|cells| cells.len() != columns.len()) {
        tracing::warn!(
            section = kind.label(),
            expected = columns.len(),
            "row arity mismatch, discarding section table"
        );
        return Vec::new();
    }

    raw_rows
        .into_iter()
        .map(|cells| Row::from_values(columns, cells))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(kind: SectionKind, lines: &[&str]) -> Vec<Row> {
        let owned: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        reconstruct_table(kind, &owned)
    }

    #[test]
    fn vital_signs_row_maps_by_position() {
        let table = rows(
            SectionKind::VitalSigns,
            &["01/04/2024 10:30   18   120   90   60   98   36.5   12.5   90   "],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Fecha/Hora"), Some("01/04/2024 10:30"));
        assert_eq!(table[0].get("FR"), Some("18"));
        assert_eq!(table[0].get("FC"), Some("120"));
        assert_eq!(table[0].get("Talla"), Some("90"));
    }

    #[test]
    fn trailing_non_empty_segment_is_kept() {
        // no trailing padding: the last split piece is a real cell
        let table = rows(
            SectionKind::NursingOrders,
            &["01/04/2024 08:00   Curación de herida   DR PEREZ LOPEZ"],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Médico"), Some("DR PEREZ LOPEZ"));
    }

    #[test]
    fn header_reprint_is_skipped() {
        let table = rows(
            SectionKind::VitalSigns,
            &[
                "Fecha/Hora   FR   FC   PAS   PAD   SAT O2   Temp °C   Peso   Talla",
                "01/04/2024 10:30   18   120   90   60   98   36.5   12.5   90   ",
            ],
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn arity_mismatch_discards_whole_table() {
        let table = rows(
            SectionKind::VitalSigns,
            &[
                "01/04/2024 10:30   18   120   90   60   98   36.5   12.5   90   ",
                "01/04/2024 11:30   18   120   ",
            ],
        );
        assert!(table.is_empty());
    }

    #[test]
    fn timestampless_line_is_dropped_not_fatal() {
        let table = rows(
            SectionKind::NursingOrders,
            &[
                "línea sin fecha",
                "01/04/2024 08:00   Curación   DR PEREZ   ",
            ],
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn diagnostics_physician_rejoins_split_segments() {
        let table = rows(
            SectionKind::ActiveDiagnostics,
            &["01/04/2024 09:00   Neumonía   Principal   DRA MARIA   GOMEZ   ninguna   "],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Fecha Ingresada"), Some("01/04/2024 09:00"));
        assert_eq!(table[0].get("Descripción"), Some("Neumonía"));
        assert_eq!(table[0].get("Tipo"), Some("Principal"));
        assert_eq!(table[0].get("Médico"), Some("DRA MARIA GOMEZ"));
        assert_eq!(table[0].get("Notas"), Some("ninguna"));
    }

    #[test]
    fn diagnostics_three_segments_leave_physician_empty() {
        let table = rows(
            SectionKind::ActiveDiagnostics,
            &["01/04/2024 09:00   Asma   Principal   sin notas   "],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Descripción"), Some("Asma"));
        assert_eq!(table[0].get("Tipo"), Some("Principal"));
        assert_eq!(table[0].get("Médico"), Some(""));
        assert_eq!(table[0].get("Notas"), Some("sin notas"));
    }

    #[test]
    fn diagnostics_single_segment_fails_arity() {
        let table = rows(
            SectionKind::ActiveDiagnostics,
            &["01/04/2024 09:00   Asma   "],
        );
        assert!(table.is_empty());
    }

    #[test]
    fn prescriptions_physician_rejoins_and_flow_rate_is_tail() {
        let line = "01/04/2024 10:00   Paracetamol   Cada 8 horas   Oral   500   mg   30   \
                    Programado   DR GARCIA   SANCHEZ   20 ml/h   ";
        let table = rows(SectionKind::Prescriptions, &[line]);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Inicio"), Some("01/04/2024 10:00"));
        assert_eq!(table[0].get("Medicamento"), Some("Paracetamol"));
        assert_eq!(table[0].get("Médico"), Some("DR GARCIA SANCHEZ"));
        assert_eq!(table[0].get("Tasa de Flujo"), Some("20 ml/h"));
    }

    #[test]
    fn prescriptions_eight_segments_park_physician_in_flow_rate() {
        // without a flow-rate cell the tail rule still applies
        let line = "01/04/2024 10:00   Paracetamol   Cada 8 horas   Oral   500   mg   30   \
                    Programado   DR GARCIA   ";
        let table = rows(SectionKind::Prescriptions, &[line]);
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Médico"), Some(""));
        assert_eq!(table[0].get("Tasa de Flujo"), Some("DR GARCIA"));
    }

    #[test]
    fn timestamp_padding_is_consumed() {
        let table = rows(
            SectionKind::NursingOrders,
            &["01/04/2024 08:00      Curación   DR PEREZ   "],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].get("Orden"), Some("Curación"));
    }
}
