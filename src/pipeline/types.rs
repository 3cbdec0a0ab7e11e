//! Output types of the structuring pipeline.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One reconstructed table row: an ordered column → value mapping.
///
/// Column order follows the section schema and survives JSON round-trips,
/// so serializing the same document twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    /// Build a row by zipping schema columns with their values.
    ///
    /// Callers validate arity first; zipping truncates to the shorter side.
    pub fn from_values(columns: &[&str], values: Vec<String>) -> Self {
        let fields = columns
            .iter()
            .map(|c| c.to_string())
            .zip(values)
            .collect();
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RowVisitor;

impl<'de> Visitor<'de> for RowVisitor {
    type Value = Row;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a map of column names to cell values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
        let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((column, value)) = access.next_entry::<String, String>()? {
            fields.push((column, value));
        }
        Ok(Row { fields })
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Row, D::Error> {
        deserializer.deserialize_map(RowVisitor)
    }
}

/// Patient identity subset of the extracted header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub him: Option<String>,
    pub names: Option<String>,
    pub paternal_lastname: Option<String>,
    pub maternal_lastname: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
}

/// Signing doctor subset of the extracted footer fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub name: Option<String>,
    pub professional_certificate: Option<String>,
    pub sign_date: Option<String>,
    pub sign_time: Option<String>,
}

/// Note metadata subset of the extracted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub note_number: Option<String>,
    pub note_type: Option<String>,
    pub record_number: Option<String>,
    pub him: Option<String>,
    pub admission_date: Option<String>,
    pub admission_time: Option<String>,
    pub discharge_date: Option<String>,
    pub discharge_time: Option<String>,
    pub hospital: Option<String>,
}

/// Vital-signs section: the table plus the subjective narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalSignsSection {
    pub table: Vec<Row>,
    pub subjective_text: String,
}

/// Active-diagnostics section: the table plus its narrative sub-sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSection {
    pub table: Vec<Row>,
    pub physical_exam: String,
    pub notes: String,
    pub analysis: String,
    pub studies: String,
    pub treatment_plan: String,
}

/// A plain tabular section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersSection {
    pub table: Vec<Row>,
}

/// The full structured output for one note. Field order here is the JSON
/// key order consumers see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub patient: PatientSummary,
    pub doctor: DoctorSummary,
    pub note: NoteSummary,
    pub vital_signs: VitalSignsSection,
    pub active_diagnostics: DiagnosticsSection,
    pub dietetic_orders: OrdersSection,
    pub nursing_orders: OrdersSection,
    pub prescriptions: OrdersSection,
}
