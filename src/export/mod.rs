//! Reading measurement files and rendering assessment results

use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::engine::Evaluation;
use crate::models::RawMeasurement;

pub mod csv;
pub mod json;
pub mod text;

/// Output formats for batch results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// Read raw measurement records from a CSV or JSON file
pub fn read_measurements<P: AsRef<Path>>(path: P) -> Result<Vec<RawMeasurement>, ExportError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;

    match ExportFormat::from_path(path)? {
        ExportFormat::Csv => csv::read_measurements(file),
        ExportFormat::Json => json::read_measurements(file),
        ExportFormat::Text => Err(ExportError::UnsupportedFormat(
            "text files cannot be read as measurements".to_string(),
        )),
    }
}

/// Write batch evaluations in the given format
pub fn write_evaluations<W: Write>(
    evaluations: &[Evaluation],
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => csv::write_evaluations(evaluations, writer),
        ExportFormat::Json => json::write_json(&evaluations, writer),
        ExportFormat::Text => text::write_evaluations(evaluations, writer),
    }
}

/// Write batch evaluations to a file
pub fn export_evaluations<P: AsRef<Path>>(
    evaluations: &[Evaluation],
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(output_path)?;
    write_evaluations(evaluations, format, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("clients/week1.json")).unwrap(),
            ExportFormat::Json
        );
        assert!(ExportFormat::from_path(Path::new("clients")).is_err());
    }
}
