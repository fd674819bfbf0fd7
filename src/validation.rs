//! Measurement validation
//!
//! Normalizes a [`RawMeasurement`] into a typed [`MeasurementInput`],
//! range-checking every field against its physiological domain. All
//! violations are collected in one pass so a caller can report every
//! offending field at once.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use statrs::statistics::Statistics;
use std::str::FromStr;
use tracing::debug;

use crate::error::ValidationError;
use crate::metrics::round_to;
use crate::models::{Gender, MeasurementInput, RawMeasurement, SkinfoldSite, Skinfolds};

/// Inclusive numeric domain of an input field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDomain {
    pub min: Decimal,
    pub max: Decimal,
    pub unit: &'static str,
}

impl FieldDomain {
    const fn new(min: Decimal, max: Decimal, unit: &'static str) -> Self {
        Self { min, max, unit }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }

    fn out_of_range_message(&self, field: &str) -> String {
        format!(
            "{} must be between {} and {} {}",
            field, self.min, self.max, self.unit
        )
    }
}

pub const AGE_DOMAIN: FieldDomain = FieldDomain::new(dec!(10), dec!(120), "years");
pub const WEIGHT_DOMAIN: FieldDomain = FieldDomain::new(dec!(30), dec!(300), "kg");
pub const HEIGHT_DOMAIN: FieldDomain = FieldDomain::new(dec!(100), dec!(250), "cm");
pub const WAIST_DOMAIN: FieldDomain = FieldDomain::new(dec!(50), dec!(200), "cm");
pub const HIP_DOMAIN: FieldDomain = FieldDomain::new(dec!(60), dec!(200), "cm");
pub const SKINFOLD_DOMAIN: FieldDomain = FieldDomain::new(dec!(3), dec!(70), "mm");

/// Weight/height combinations outside this BMI range are flagged, never rejected
pub const COHERENT_BMI: FieldDomain = FieldDomain::new(dec!(12), dec!(60), "kg/m²");

/// Maximum coefficient of variation (%) accepted between repeated measurements (ISAK)
pub const MAX_ACCEPTABLE_CV: Decimal = dec!(5);

/// Validate a raw record, returning either a typed input or every violation found
pub fn validate(raw: &RawMeasurement) -> Result<MeasurementInput, ValidationError> {
    let mut errors = ValidationError::new();

    let gender = parse_gender(raw.gender.as_ref(), &mut errors);
    let age = parse_age(raw.age.as_ref(), &mut errors);
    let weight = required_in_domain(raw, "weight", &WEIGHT_DOMAIN, &mut errors);
    let height = required_in_domain(raw, "height", &HEIGHT_DOMAIN, &mut errors);
    let waist = required_in_domain(raw, "waist", &WAIST_DOMAIN, &mut errors);
    let hip = required_in_domain(raw, "hip", &HIP_DOMAIN, &mut errors);

    let mut skinfolds = Skinfolds::default();
    for site in SkinfoldSite::ALL {
        if let Some(value) = optional_in_domain(raw, site.field_name(), &SKINFOLD_DOMAIN, &mut errors) {
            skinfolds = skinfolds.with(site, value);
        }
    }

    match (gender, age, weight, height, waist, hip) {
        (Some(gender), Some(age), Some(weight), Some(height), Some(waist), Some(hip))
            if errors.is_empty() =>
        {
            log_partial_triplet(gender, &skinfolds);
            Ok(MeasurementInput {
                gender,
                age,
                weight,
                height,
                waist,
                hip,
                skinfolds,
            })
        }
        _ => {
            debug!(fields = errors.len(), "Measurement record rejected");
            Err(errors)
        }
    }
}

/// Plausibility notes for a validated record.
///
/// Every field is already inside its domain, so these never reject the
/// record; they are reported next to the assessment.
pub fn coherence_warnings(input: &MeasurementInput) -> BTreeMap<String, String> {
    let mut warnings = BTreeMap::new();

    let height_m = input.height / dec!(100);
    let bmi = input.weight / (height_m * height_m);
    if !COHERENT_BMI.contains(bmi) {
        debug!("weight and height imply an implausible BMI");
        warnings.insert(
            "bmi_coherence".to_string(),
            format!(
                "weight and height imply a BMI outside {} to {} {}",
                COHERENT_BMI.min, COHERENT_BMI.max, COHERENT_BMI.unit
            ),
        );
    }

    warnings
}

/// A partial triplet is not an error, but body fat will be omitted
fn log_partial_triplet(gender: Gender, skinfolds: &Skinfolds) {
    let protocol = gender.skinfold_protocol();
    let present = protocol
        .sites()
        .iter()
        .filter(|site| skinfolds.get(**site).is_some())
        .count();

    if present > 0 && present < 3 {
        debug!(
            ?protocol,
            present, "Incomplete skinfold triplet, body fat will not be estimated"
        );
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Interpret a JSON number or numeric string as a decimal
fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_gender(value: Option<&Value>, errors: &mut ValidationError) -> Option<Gender> {
    match value {
        Some(value) if !is_blank(value) => {
            let parsed = value.as_str().and_then(|s| s.parse::<Gender>().ok());
            if parsed.is_none() {
                errors.add("gender", "gender must be 'M' or 'F'");
            }
            parsed
        }
        _ => {
            errors.add("gender", "gender is required");
            None
        }
    }
}

fn parse_age(value: Option<&Value>, errors: &mut ValidationError) -> Option<u32> {
    let value = match value {
        Some(value) if !is_blank(value) => value,
        _ => {
            errors.add("age", "age is required");
            return None;
        }
    };

    let Some(age) = parse_decimal(value) else {
        errors.add("age", "age must be a number");
        return None;
    };

    if !age.fract().is_zero() {
        errors.add("age", "age must be a whole number of years");
        return None;
    }

    if !AGE_DOMAIN.contains(age) {
        errors.add("age", AGE_DOMAIN.out_of_range_message("age"));
        return None;
    }

    age.to_u32()
}

fn required_in_domain(
    raw: &RawMeasurement,
    field: &str,
    domain: &FieldDomain,
    errors: &mut ValidationError,
) -> Option<Decimal> {
    match raw.field(field) {
        Some(value) if !is_blank(value) => check_domain(value, field, domain, errors),
        _ => {
            errors.add(field, format!("{} is required", field));
            None
        }
    }
}

fn optional_in_domain(
    raw: &RawMeasurement,
    field: &str,
    domain: &FieldDomain,
    errors: &mut ValidationError,
) -> Option<Decimal> {
    match raw.field(field) {
        Some(value) if !is_blank(value) => check_domain(value, field, domain, errors),
        _ => None,
    }
}

fn check_domain(
    value: &Value,
    field: &str,
    domain: &FieldDomain,
    errors: &mut ValidationError,
) -> Option<Decimal> {
    let Some(parsed) = parse_decimal(value) else {
        errors.add(field, format!("{} must be a number", field));
        return None;
    };

    if !domain.contains(parsed) {
        errors.add(field, domain.out_of_range_message(field));
        return None;
    }

    Some(parsed)
}

/// Technical error of repeated measurements at one site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repeatability {
    /// Coefficient of variation in percent, 2 decimals
    #[serde(with = "rust_decimal::serde::float")]
    pub coefficient_of_variation: Decimal,

    /// Whether the CV is within the ISAK tolerance
    pub acceptable: bool,
}

/// Coefficient of variation of repeated measurements of the same site.
///
/// Uses the sample standard deviation. Returns None for fewer than two
/// measurements or a non-positive mean.
pub fn repeatability(measurements: &[Decimal]) -> Option<Repeatability> {
    if measurements.len() < 2 {
        return None;
    }

    let values: Vec<f64> = measurements.iter().filter_map(|m| m.to_f64()).collect();
    if values.len() != measurements.len() {
        return None;
    }

    let mean = values.iter().mean();
    if mean <= 0.0 {
        return None;
    }
    let std_dev = values.iter().std_dev();

    let cv = Decimal::from_f64(std_dev / mean * 100.0)?;
    let cv = round_to(cv, 2);

    Some(Repeatability {
        coefficient_of_variation: cv,
        acceptable: cv <= MAX_ACCEPTABLE_CV,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_record() -> RawMeasurement {
        RawMeasurement::default()
            .with("gender", "M")
            .with("age", 30)
            .with("weight", 80)
            .with("height", 180)
            .with("waist", 85)
            .with("hip", 95)
    }

    #[test]
    fn test_valid_record() {
        let input = validate(&base_record()).unwrap();

        assert_eq!(input.gender, Gender::Male);
        assert_eq!(input.age, 30);
        assert_eq!(input.weight, dec!(80));
        assert_eq!(input.height, dec!(180));
        assert_eq!(input.skinfolds.recorded(), 0);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let raw = base_record().with("weight", "80.5").with("chest_fold", " 10 ");
        let input = validate(&raw).unwrap();

        assert_eq!(input.weight, dec!(80.5));
        assert_eq!(input.skinfolds.chest, Some(dec!(10)));
    }

    #[test]
    fn test_blank_skinfolds_are_absent() {
        let raw = base_record()
            .with("triceps_fold", "")
            .with("subscapular_fold", Value::Null);
        let input = validate(&raw).unwrap();

        assert_eq!(input.skinfolds.recorded(), 0);
    }

    #[test]
    fn test_collects_all_violations() {
        let raw = RawMeasurement::default()
            .with("gender", "X")
            .with("age", 5)
            .with("weight", 20)
            .with("height", "tall")
            .with("hip", 95)
            .with("thigh_fold", 90);

        let errors = validate(&raw).unwrap_err();

        assert!(errors.contains("gender"));
        assert!(errors.contains("age"));
        assert!(errors.contains("weight"));
        assert!(errors.contains("height"));
        assert!(errors.contains("waist"));
        assert!(errors.contains("thigh_fold"));
        assert!(!errors.contains("hip"));
        assert_eq!(errors.message("waist"), Some("waist is required"));
        assert_eq!(errors.message("height"), Some("height must be a number"));
        assert_eq!(
            errors.message("weight"),
            Some("weight must be between 30 and 300 kg")
        );
    }

    #[test]
    fn test_domain_bounds_are_inclusive() {
        let raw = base_record()
            .with("age", 10)
            .with("weight", 40)
            .with("height", 150)
            .with("waist", 50)
            .with("hip", 60)
            .with("chest_fold", 3)
            .with("abdomen_fold", 70);

        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_fractional_age_rejected() {
        let raw = base_record().with("age", 30.5);
        let errors = validate(&raw).unwrap_err();

        assert_eq!(
            errors.message("age"),
            Some("age must be a whole number of years")
        );
    }

    #[test]
    fn test_implausible_bmi_is_a_warning_not_an_error() {
        // 300 kg at 100 cm is BMI 300; 30 kg at 250 cm is BMI 4.8
        for (weight, height) in [(300, 100), (30, 250), (300, 150), (35, 190)] {
            let raw = base_record().with("weight", weight).with("height", height);
            let input = validate(&raw).unwrap();

            let warnings = coherence_warnings(&input);
            assert!(warnings.contains_key("bmi_coherence"), "{} kg / {} cm", weight, height);
        }

        let input = validate(&base_record()).unwrap();
        assert!(coherence_warnings(&input).is_empty());
    }

    #[test]
    fn test_partial_triplet_is_not_an_error() {
        let raw = base_record().with("chest_fold", 10).with("thigh_fold", 12);
        let input = validate(&raw).unwrap();

        assert_eq!(input.skinfolds.recorded(), 2);
    }

    #[test]
    fn test_gender_aliases() {
        let raw = base_record().with("gender", "female");
        assert_eq!(validate(&raw).unwrap().gender, Gender::Female);

        let raw = base_record().with("gender", json!(1));
        assert!(validate(&raw).unwrap_err().contains("gender"));
    }

    #[test]
    fn test_repeatability() {
        let result = repeatability(&[dec!(10.0), dec!(10.2), dec!(9.8)]).unwrap();
        assert_eq!(result.coefficient_of_variation, dec!(2.00));
        assert!(result.acceptable);

        let result = repeatability(&[dec!(10), dec!(14)]).unwrap();
        assert!(!result.acceptable);

        assert!(repeatability(&[dec!(10)]).is_none());
    }
}
