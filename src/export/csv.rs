use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::debug;

use super::ExportError;
use crate::engine::Evaluation;
use crate::models::{MetricName, RawMeasurement};

/// Header spellings accepted for each raw field
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("gender", &["gender", "sex"]),
    ("age", &["age", "age_years"]),
    ("weight", &["weight", "weight_kg", "mass"]),
    ("height", &["height", "height_cm", "stature"]),
    ("waist", &["waist", "waist_cm", "waist_circumference"]),
    ("hip", &["hip", "hip_cm", "hips", "hip_circumference"]),
    ("chest_fold", &["chest_fold", "chest", "pectoral"]),
    ("abdomen_fold", &["abdomen_fold", "abdomen", "abdominal"]),
    ("thigh_fold", &["thigh_fold", "thigh"]),
    ("triceps_fold", &["triceps_fold", "triceps"]),
    ("subscapular_fold", &["subscapular_fold", "subscapular"]),
    ("suprailiac_fold", &["suprailiac_fold", "suprailiac", "iliac_crest"]),
];

fn column_mapping() -> HashMap<String, &'static str> {
    let mut mapping = HashMap::new();
    for (field, aliases) in COLUMN_ALIASES {
        for alias in *aliases {
            mapping.insert(alias.to_string(), *field);
        }
    }
    mapping
}

fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Read raw measurement records from CSV with a header row.
///
/// Cells stay strings; the validator parses them. Empty cells are left unset
/// and unrecognised columns are ignored.
pub fn read_measurements<R: Read>(reader: R) -> Result<Vec<RawMeasurement>, ExportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mapping = column_mapping();
    let columns: Vec<Option<&'static str>> = rdr
        .headers()?
        .iter()
        .map(|h| mapping.get(&normalize_column_name(h)).copied())
        .collect();

    if columns.iter().all(Option::is_none) {
        return Err(ExportError::InvalidInput(
            "no recognised measurement columns in CSV header".to_string(),
        ));
    }

    let mut records = Vec::new();
    for row in rdr.records() {
        records.push(record_from_row(&columns, &row?));
    }

    debug!(rows = records.len(), "read measurement CSV");
    Ok(records)
}

fn record_from_row(columns: &[Option<&'static str>], row: &StringRecord) -> RawMeasurement {
    let mut raw = RawMeasurement::default();
    for (field, cell) in columns.iter().zip(row.iter()) {
        if let Some(field) = field {
            if !cell.is_empty() {
                raw.set_field(field, serde_json::Value::String(cell.to_string()));
            }
        }
    }
    raw
}

fn header() -> Vec<String> {
    let mut header = vec!["row".to_string(), "success".to_string(), "gender".to_string()];
    header.extend(MetricName::ALL.iter().map(|m| m.as_str().to_string()));
    header.extend(
        MetricName::CLASSIFIED
            .iter()
            .map(|m| format!("{}_status", m.as_str())),
    );
    header.push("suggested_goal".to_string());
    header.push("errors".to_string());
    header
}

/// One row per evaluation: metric values, statuses, then suggestion or errors
pub fn write_evaluations<W: Write>(evaluations: &[Evaluation], writer: W) -> Result<(), ExportError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(header())?;

    for (index, evaluation) in evaluations.iter().enumerate() {
        let mut row = vec![(index + 1).to_string()];

        match evaluation {
            Evaluation::Assessed(result) => {
                row.push("true".to_string());
                row.push(result.gender.code().to_string());
                row.extend(
                    MetricName::ALL
                        .iter()
                        .map(|m| result.metrics.get(*m).map_or(String::new(), |v| v.to_string())),
                );
                row.extend(
                    MetricName::CLASSIFIED
                        .iter()
                        .map(|m| result.status(*m).as_str().to_string()),
                );
                row.push(
                    result
                        .suggested_goal
                        .as_ref()
                        .map_or(String::new(), |s| s.primary_goal.as_str().to_string()),
                );
                row.push(String::new());
            }
            Evaluation::Rejected(errors) => {
                row.push("false".to_string());
                let blanks = 1 + MetricName::ALL.len() + MetricName::CLASSIFIED.len() + 1;
                row.extend(std::iter::repeat(String::new()).take(blanks));
                row.push(errors.to_string());
            }
        }

        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
