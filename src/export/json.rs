use serde::Serialize;
use std::io::{Read, Write};
use std::path::Path;

use super::ExportError;
use crate::models::RawMeasurement;

/// Pretty-print any serializable value, followed by a newline
pub fn write_json<T, W>(data: &T, mut writer: W) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer_pretty(&mut writer, data)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Export any serializable data structure to a JSON file
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let file = std::fs::File::create(output_path)?;
    write_json(data, std::io::BufWriter::new(file))
}

/// Parse one record or an array of records
pub fn read_measurements<R: Read>(reader: R) -> Result<Vec<RawMeasurement>, ExportError> {
    let value: serde_json::Value = serde_json::from_reader(reader)?;

    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ExportError::from))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(value)?]),
        _ => Err(ExportError::InvalidInput(
            "expected a measurement object or an array of them".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_single_and_array() {
        let single = r#"{"gender": "M", "weight": "80", "hip": ""}"#;
        let records = read_measurements(single.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("weight"), Some(&serde_json::json!("80")));

        let array = r#"[{"gender": "F"}, {"gender": "M", "age": 40}]"#;
        let records = read_measurements(array.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].field("age"), Some(&serde_json::json!(40)));
    }

    #[test]
    fn test_read_rejects_scalars() {
        assert!(matches!(
            read_measurements("42".as_bytes()),
            Err(ExportError::InvalidInput(_))
        ));
        assert!(read_measurements("{not json".as_bytes()).is_err());
    }

    #[test]
    fn test_export_json_generic() {
        #[derive(Serialize)]
        struct Sample {
            name: String,
            value: u32,
        }

        let data = Sample {
            name: "test".to_string(),
            value: 42,
        };

        let temp_file = NamedTempFile::new().unwrap();
        export_json(&data, temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("\"name\": \"test\""));
        assert!(content.contains("\"value\": 42"));
    }
}
