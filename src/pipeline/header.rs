//! Header and footer field extraction.
//!
//! The note layout prints its metadata around the page edges on fixed
//! labels, so every pattern here is anchored on a literal label. Extraction
//! is total: an unmatched field is `None`, never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NOTE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^No\.\s*(\d+)").unwrap());
static NOTE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+)Derechos de Autor").unwrap());
static RECORD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Expediente:\s*(\d+)").unwrap());
static HIM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"HIM:\s*(\d+)").unwrap());
// the full name sits between the HIM value and the next `Fecha` label
static FULL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"HIM:\s*\d+\s*(.*?)\s*Fecha").unwrap());
static BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Fecha de Nacimiento:\s*(\d{2}/\d{2}/\d{4})").unwrap());
static GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(Femenino|Masculino)\b").unwrap());
static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Femenino|Masculino)\s*\((\d+)\s*(años?|mes(?:es)?|días?)\)").unwrap()
});
static ADMISSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Fecha de Ingreso:\s*(\d{2}/\d{2}/\d{4})\s*(\d{2}:\d{2})").unwrap()
});
static DISCHARGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Dado de Alta:\s*(\d{2}/\d{2}/\d{4})\s*(\d{2}:\d{2})").unwrap()
});
static DOCTOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Firmado por:\s*(.*?)-").unwrap());
static CERTIFICATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PROF\.:\s*(\d+)").unwrap());
// the signing timestamp carries no label of its own: it follows the dash
// that closes the signer name, and the time may be absent
static SIGNED_AT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Firmado por:.*?-\s*(\d{2}/\d{2}/\d{4})(?:\s*(\d{2}:\d{2}))?").unwrap()
});
// `\b` so that section headings printing `Hospitalarios` never match
static HOSPITAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Hospital\b\s*([^\n]*)").unwrap());

/// All metadata extracted from one note. Unmatched fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub note_number: Option<String>,
    pub note_type: Option<String>,
    pub record_number: Option<String>,
    pub him: Option<String>,
    pub names: Option<String>,
    pub paternal_lastname: Option<String>,
    pub maternal_lastname: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub admission_date: Option<String>,
    pub admission_time: Option<String>,
    pub discharge_date: Option<String>,
    pub discharge_time: Option<String>,
    pub doctor_name: Option<String>,
    pub professional_certificate: Option<String>,
    pub sign_date: Option<String>,
    pub sign_time: Option<String>,
    pub hospital: Option<String>,
}

/// Extract every header/footer field of a note. Total: never fails.
pub fn extract_header_fields(text: &str) -> HeaderFields {
    let (admission_date, admission_time) = date_time_capture(&ADMISSION, text);
    let (discharge_date, discharge_time) = date_time_capture(&DISCHARGE, text);
    let (sign_date, sign_time) = date_time_capture(&SIGNED_AT, text);
    let (paternal_lastname, maternal_lastname, names) =
        split_full_name(first_capture(&FULL_NAME, text).as_deref());

    HeaderFields {
        note_number: first_capture(&NOTE_NUMBER, text),
        note_type: first_capture(&NOTE_TYPE, text),
        record_number: first_capture(&RECORD_NUMBER, text),
        him: first_capture(&HIM, text),
        names,
        paternal_lastname,
        maternal_lastname,
        date_of_birth: first_capture(&BIRTH_DATE, text),
        gender: first_capture(&GENDER, text),
        age: age_capture(text),
        admission_date,
        admission_time,
        discharge_date,
        discharge_time,
        doctor_name: first_capture(&DOCTOR_NAME, text).map(|name| title_case(&name)),
        professional_certificate: first_capture(&CERTIFICATE, text),
        sign_date,
        sign_time,
        hospital: hospital_capture(text),
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn date_time_capture(re: &Regex, text: &str) -> (Option<String>, Option<String>) {
    match re.captures(text) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    }
}

fn age_capture(text: &str) -> Option<String> {
    AGE.captures(text).map(|caps| format!("{} {}", &caps[1], &caps[2]))
}

fn hospital_capture(text: &str) -> Option<String> {
    HOSPITAL
        .captures(text)
        .map(|caps| format!("Hospital {}", caps[1].trim()).trim_end().to_string())
}

/// Split the raw name line: token 0 is the paternal lastname, token 1 the
/// maternal lastname (printed with a trailing comma), the rest the given
/// names. Missing tokens stay `None`.
fn split_full_name(
    raw: Option<&str>,
) -> (Option<String>, Option<String>, Option<String>) {
    let Some(raw) = raw else {
        return (None, None, None);
    };
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let paternal = tokens.first().map(|t| title_case(t));
    let maternal = tokens.get(1).map(|t| title_case(&t.replace(',', "")));
    let given = if tokens.len() > 2 {
        Some(title_case(&tokens[2..].join(" ")))
    } else {
        None
    };
    (paternal, maternal, given)
}

/// Title-case every whitespace-separated word: first char upper, rest lower.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
