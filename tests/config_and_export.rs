use anthropometry::export::{self, ExportFormat};
use anthropometry::{
    AssessmentEngine, BatchConfig, BatchRunner, EngineConfig, MetricName, RawMeasurement, Status,
};
use rust_decimal_macros::dec;
use std::fs;
use tempfile::tempdir;

const CLIENTS_CSV: &str = "\
sex,age,weight_kg,height_cm,waist,hip,chest,abdomen,thigh,triceps,suprailiac
M,30,80,180,85,95,10,15,12,,
F,28,60,165,70,95,,,25,18,15
M,45,92,176,104,99,22,34,21,,
F,52,20,160,80,100,,,,,
";

fn quiet_batch() -> BatchConfig {
    BatchConfig {
        threads: Some(2),
        show_progress: false,
    }
}

#[test]
fn test_config_round_trip_drives_engine() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");

    fs::write(
        &path,
        r#"
[logging]
level = "info"

[batch]
threads = 2
show_progress = false

[thresholds.waist_height_ratio.optimal]
min = 0.0
max = 0.45

[thresholds.waist_height_ratio.warning]
min = 0.45
max = 0.55
"#,
    )
    .unwrap();

    let config = EngineConfig::load_from_file(&path).unwrap();
    let engine = AssessmentEngine::from_config(&config).unwrap();

    let raw = RawMeasurement::default()
        .with("gender", "M")
        .with("age", 30)
        .with("weight", 80)
        .with("height", 180)
        .with("waist", 85)
        .with("hip", 95);

    // WHtR 0.47: optimal under the built-in table, warning under the override
    let default_result = AssessmentEngine::new().evaluate(&raw).into_result().unwrap();
    assert_eq!(default_result.status(MetricName::WaistHeightRatio), Status::Optimal);

    let tuned = engine.evaluate(&raw).into_result().unwrap();
    assert_eq!(tuned.metrics.waist_height_ratio, dec!(0.47));
    assert_eq!(tuned.status(MetricName::WaistHeightRatio), Status::Warning);
    assert_eq!(tuned.status(MetricName::Bmi), Status::Optimal);

    let saved = dir.path().join("saved").join("config.toml");
    config.save_to_file(&saved).unwrap();
    assert_eq!(EngineConfig::load_from_file(&saved).unwrap(), config);
}

#[test]
fn test_csv_batch_to_csv_and_json() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clients.csv");
    fs::write(&input, CLIENTS_CSV).unwrap();

    let records = export::read_measurements(&input).unwrap();
    assert_eq!(records.len(), 4);

    let engine = AssessmentEngine::new();
    let (evaluations, summary) = BatchRunner::new(&engine, quiet_batch()).run(&records).unwrap();

    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.assessed, 3);
    assert_eq!(summary.rejected, 1);
    assert!(!summary.is_fully_successful());

    assert!(evaluations[0].is_success());
    let female = evaluations[1].assessment().unwrap();
    assert_eq!(female.metrics.body_fat_percentage, Some(dec!(23.3)));
    let heavy = evaluations[2].assessment().unwrap();
    assert_eq!(heavy.status(MetricName::WaistHipRatio), Status::Alert);
    assert!(evaluations[3].errors().unwrap().contains_key("weight"));

    let csv_out = dir.path().join("results.csv");
    export::export_evaluations(&evaluations, ExportFormat::from_path(&csv_out).unwrap(), &csv_out).unwrap();
    let csv_text = fs::read_to_string(&csv_out).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[4].starts_with("4,false,"));

    let json_out = dir.path().join("results.json");
    export::export_evaluations(&evaluations, ExportFormat::Json, &json_out).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(items[0]["success"], serde_json::json!(true));
    assert_eq!(items[3]["success"], serde_json::json!(false));
    assert!(items[3]["errors"]["weight"].is_string());
}

#[test]
fn test_json_measurement_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("client.json");
    fs::write(
        &input,
        r#"{
            "gender": "F",
            "age": "28",
            "weight": 60,
            "height": "165",
            "waist": 70,
            "hip": 95,
            "triceps_fold": 18,
            "suprailiac_fold": 15,
            "thigh_fold": 25
        }"#,
    )
    .unwrap();

    let records = export::read_measurements(&input).unwrap();
    assert_eq!(records.len(), 1);

    let result = AssessmentEngine::new().evaluate(&records[0]).into_result().unwrap();
    assert_eq!(result.metrics.waist_hip_ratio, dec!(0.74));
    assert!(result.body_composition.is_some());
}

#[test]
fn test_unreadable_inputs() {
    let dir = tempdir().unwrap();

    let text_input = dir.path().join("notes.txt");
    fs::write(&text_input, "gender M").unwrap();
    assert!(export::read_measurements(&text_input).is_err());

    assert!(export::read_measurements(dir.path().join("missing.csv")).is_err());
}
