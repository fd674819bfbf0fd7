use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::IncompleteDataError;

/// Biological sex used to select gender-specific formulas and threshold tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Wire code ("M" or "F")
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    /// The canonical 3-site skinfold protocol for this gender
    pub fn skinfold_protocol(&self) -> SkinfoldProtocol {
        match self {
            Gender::Male => SkinfoldProtocol::JacksonPollockMale,
            Gender::Female => SkinfoldProtocol::JacksonPollockFemale,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

/// Anatomical skinfold measurement sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkinfoldSite {
    Chest,
    Abdomen,
    Thigh,
    Triceps,
    Subscapular,
    Suprailiac,
}

impl SkinfoldSite {
    pub const ALL: [SkinfoldSite; 6] = [
        SkinfoldSite::Chest,
        SkinfoldSite::Abdomen,
        SkinfoldSite::Thigh,
        SkinfoldSite::Triceps,
        SkinfoldSite::Subscapular,
        SkinfoldSite::Suprailiac,
    ];

    /// Field name of this site in a raw measurement record
    pub fn field_name(&self) -> &'static str {
        match self {
            SkinfoldSite::Chest => "chest_fold",
            SkinfoldSite::Abdomen => "abdomen_fold",
            SkinfoldSite::Thigh => "thigh_fold",
            SkinfoldSite::Triceps => "triceps_fold",
            SkinfoldSite::Subscapular => "subscapular_fold",
            SkinfoldSite::Suprailiac => "suprailiac_fold",
        }
    }
}

impl fmt::Display for SkinfoldSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Jackson-Pollock 3-site regression coefficients
///
/// density = intercept - linear × S + quadratic × S² - age_factor × age
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityCoefficients {
    pub intercept: Decimal,
    pub linear: Decimal,
    pub quadratic: Decimal,
    pub age_factor: Decimal,
}

/// Skinfold protocol selecting which three sites feed the body density regression
///
/// This is the single place deciding which sites a gender requires; both the
/// validator and the metric calculator go through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinfoldProtocol {
    /// Chest, abdomen, thigh
    JacksonPollockMale,
    /// Triceps, suprailiac, thigh
    JacksonPollockFemale,
}

impl SkinfoldProtocol {
    pub fn sites(&self) -> [SkinfoldSite; 3] {
        match self {
            SkinfoldProtocol::JacksonPollockMale => {
                [SkinfoldSite::Chest, SkinfoldSite::Abdomen, SkinfoldSite::Thigh]
            }
            SkinfoldProtocol::JacksonPollockFemale => {
                [SkinfoldSite::Triceps, SkinfoldSite::Suprailiac, SkinfoldSite::Thigh]
            }
        }
    }

    pub fn coefficients(&self) -> DensityCoefficients {
        match self {
            SkinfoldProtocol::JacksonPollockMale => DensityCoefficients {
                intercept: dec!(1.10938),
                linear: dec!(0.0008267),
                quadratic: dec!(0.0000016),
                age_factor: dec!(0.0002574),
            },
            SkinfoldProtocol::JacksonPollockFemale => DensityCoefficients {
                intercept: dec!(1.0994921),
                linear: dec!(0.0009929),
                quadratic: dec!(0.0000023),
                age_factor: dec!(0.0001392),
            },
        }
    }

    /// Collect the protocol's three skinfolds, or report which sites are missing.
    ///
    /// A partial triplet is never used: if any site is absent the whole
    /// triplet is unavailable.
    pub fn triplet(&self, skinfolds: &Skinfolds) -> Result<[Decimal; 3], IncompleteDataError> {
        let sites = self.sites();
        let missing: Vec<SkinfoldSite> = sites
            .iter()
            .copied()
            .filter(|site| skinfolds.get(*site).is_none())
            .collect();

        if !missing.is_empty() {
            return Err(IncompleteDataError {
                metric: MetricName::BodyFatPercentage,
                missing_sites: missing,
            });
        }

        let mut values = [Decimal::ZERO; 3];
        for (slot, site) in values.iter_mut().zip(sites.iter()) {
            *slot = skinfolds.get(*site).unwrap_or_default();
        }
        Ok(values)
    }
}

/// Validated skinfold thicknesses in millimetres
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skinfolds {
    pub chest: Option<Decimal>,
    pub abdomen: Option<Decimal>,
    pub thigh: Option<Decimal>,
    pub triceps: Option<Decimal>,
    pub subscapular: Option<Decimal>,
    pub suprailiac: Option<Decimal>,
}

impl Skinfolds {
    pub fn get(&self, site: SkinfoldSite) -> Option<Decimal> {
        match site {
            SkinfoldSite::Chest => self.chest,
            SkinfoldSite::Abdomen => self.abdomen,
            SkinfoldSite::Thigh => self.thigh,
            SkinfoldSite::Triceps => self.triceps,
            SkinfoldSite::Subscapular => self.subscapular,
            SkinfoldSite::Suprailiac => self.suprailiac,
        }
    }

    /// Builder-style setter, used by the validator and tests
    pub fn with(mut self, site: SkinfoldSite, value: Decimal) -> Self {
        let slot = match site {
            SkinfoldSite::Chest => &mut self.chest,
            SkinfoldSite::Abdomen => &mut self.abdomen,
            SkinfoldSite::Thigh => &mut self.thigh,
            SkinfoldSite::Triceps => &mut self.triceps,
            SkinfoldSite::Subscapular => &mut self.subscapular,
            SkinfoldSite::Suprailiac => &mut self.suprailiac,
        };
        *slot = Some(value);
        self
    }

    /// Number of sites with a recorded value
    pub fn recorded(&self) -> usize {
        SkinfoldSite::ALL
            .iter()
            .filter(|site| self.get(**site).is_some())
            .count()
    }
}

/// Raw measurement record as submitted by a client form.
///
/// Every field is optional and loosely typed: numbers may arrive as JSON
/// numbers or numeric strings, and empty strings mean "not provided".
/// Nothing here is trusted until it passes [`crate::validation::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMeasurement {
    pub gender: Option<serde_json::Value>,
    pub age: Option<serde_json::Value>,
    pub weight: Option<serde_json::Value>,
    pub height: Option<serde_json::Value>,
    pub waist: Option<serde_json::Value>,
    pub hip: Option<serde_json::Value>,
    pub chest_fold: Option<serde_json::Value>,
    pub abdomen_fold: Option<serde_json::Value>,
    pub thigh_fold: Option<serde_json::Value>,
    pub triceps_fold: Option<serde_json::Value>,
    pub subscapular_fold: Option<serde_json::Value>,
    pub suprailiac_fold: Option<serde_json::Value>,
}

impl RawMeasurement {
    /// Field names recognised in a raw record, in wire order
    pub const FIELDS: [&'static str; 12] = [
        "gender",
        "age",
        "weight",
        "height",
        "waist",
        "hip",
        "chest_fold",
        "abdomen_fold",
        "thigh_fold",
        "triceps_fold",
        "subscapular_fold",
        "suprailiac_fold",
    ];

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        match name {
            "gender" => self.gender.as_ref(),
            "age" => self.age.as_ref(),
            "weight" => self.weight.as_ref(),
            "height" => self.height.as_ref(),
            "waist" => self.waist.as_ref(),
            "hip" => self.hip.as_ref(),
            "chest_fold" => self.chest_fold.as_ref(),
            "abdomen_fold" => self.abdomen_fold.as_ref(),
            "thigh_fold" => self.thigh_fold.as_ref(),
            "triceps_fold" => self.triceps_fold.as_ref(),
            "subscapular_fold" => self.subscapular_fold.as_ref(),
            "suprailiac_fold" => self.suprailiac_fold.as_ref(),
            _ => None,
        }
    }

    /// Set a field by wire name. Returns false for unknown names.
    pub fn set_field(&mut self, name: &str, value: serde_json::Value) -> bool {
        let slot = match name {
            "gender" => &mut self.gender,
            "age" => &mut self.age,
            "weight" => &mut self.weight,
            "height" => &mut self.height,
            "waist" => &mut self.waist,
            "hip" => &mut self.hip,
            "chest_fold" => &mut self.chest_fold,
            "abdomen_fold" => &mut self.abdomen_fold,
            "thigh_fold" => &mut self.thigh_fold,
            "triceps_fold" => &mut self.triceps_fold,
            "subscapular_fold" => &mut self.subscapular_fold,
            "suprailiac_fold" => &mut self.suprailiac_fold,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Chainable variant of [`RawMeasurement::set_field`]
    pub fn with(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.set_field(name, value.into());
        self
    }
}

/// Validated, immutable measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    pub gender: Gender,

    /// Age in whole years
    pub age: u32,

    /// Body weight in kilograms
    pub weight: Decimal,

    /// Standing height in centimetres
    pub height: Decimal,

    /// Waist circumference in centimetres
    pub waist: Decimal,

    /// Hip circumference in centimetres
    pub hip: Decimal,

    pub skinfolds: Skinfolds,
}

/// Names of the derived indices, used as keys for classification and categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Bmi,
    WaistHipRatio,
    WaistHeightRatio,
    BodyRoundnessIndex,
    BodyFatPercentage,
    FatMass,
    FatFreeMass,
    FatFreeMassIndex,
}

impl MetricName {
    pub const ALL: [MetricName; 8] = [
        MetricName::Bmi,
        MetricName::WaistHipRatio,
        MetricName::WaistHeightRatio,
        MetricName::BodyRoundnessIndex,
        MetricName::BodyFatPercentage,
        MetricName::FatMass,
        MetricName::FatFreeMass,
        MetricName::FatFreeMassIndex,
    ];

    /// Indices that receive a risk status in an assessment
    pub const CLASSIFIED: [MetricName; 6] = [
        MetricName::Bmi,
        MetricName::WaistHipRatio,
        MetricName::WaistHeightRatio,
        MetricName::BodyRoundnessIndex,
        MetricName::BodyFatPercentage,
        MetricName::FatFreeMassIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Bmi => "bmi",
            MetricName::WaistHipRatio => "waist_hip_ratio",
            MetricName::WaistHeightRatio => "waist_height_ratio",
            MetricName::BodyRoundnessIndex => "body_roundness_index",
            MetricName::BodyFatPercentage => "body_fat_percentage",
            MetricName::FatMass => "fat_mass",
            MetricName::FatFreeMass => "fat_free_mass",
            MetricName::FatFreeMassIndex => "fat_free_mass_index",
        }
    }

    /// Human-readable label for terminal output
    pub fn label(&self) -> &'static str {
        match self {
            MetricName::Bmi => "BMI (kg/m²)",
            MetricName::WaistHipRatio => "Waist-hip ratio",
            MetricName::WaistHeightRatio => "Waist-height ratio",
            MetricName::BodyRoundnessIndex => "Body roundness index",
            MetricName::BodyFatPercentage => "Body fat (%)",
            MetricName::FatMass => "Fat mass (kg)",
            MetricName::FatFreeMass => "Fat-free mass (kg)",
            MetricName::FatFreeMassIndex => "FFMI (kg/m²)",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown metric: {}", s))
    }
}

/// Indices computed from one validated measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Body mass index in kg/m², 2 decimals
    #[serde(with = "rust_decimal::serde::float")]
    pub bmi: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub waist_hip_ratio: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub waist_height_ratio: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub body_roundness_index: Decimal,

    /// Jackson-Pollock 3-site estimate; absent without the gender's skinfold triplet
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub body_fat_percentage: Option<Decimal>,

    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub fat_mass: Option<Decimal>,

    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub fat_free_mass: Option<Decimal>,

    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub fat_free_mass_index: Option<Decimal>,
}

impl DerivedMetrics {
    pub fn get(&self, metric: MetricName) -> Option<Decimal> {
        match metric {
            MetricName::Bmi => Some(self.bmi),
            MetricName::WaistHipRatio => Some(self.waist_hip_ratio),
            MetricName::WaistHeightRatio => Some(self.waist_height_ratio),
            MetricName::BodyRoundnessIndex => Some(self.body_roundness_index),
            MetricName::BodyFatPercentage => self.body_fat_percentage,
            MetricName::FatMass => self.fat_mass,
            MetricName::FatFreeMass => self.fat_free_mass,
            MetricName::FatFreeMassIndex => self.fat_free_mass_index,
        }
    }
}

/// Risk status assigned by the threshold classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Optimal,
    Warning,
    Alert,
    /// Value or threshold table unavailable
    Neutral,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Optimal => "optimal",
            Status::Warning => "warning",
            Status::Alert => "alert",
            Status::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric value paired with its status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedMetric {
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub value: Option<Decimal>,
    pub status: Status,
}

/// Fat / fat-free decomposition of total body weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyComposition {
    /// Fat mass in kg, 1 decimal
    #[serde(rename = "fatMass", with = "rust_decimal::serde::float")]
    pub fat_mass: Decimal,

    /// Fat-free mass in kg; always `weight - fat_mass`
    #[serde(rename = "fatFreeMass", with = "rust_decimal::serde::float")]
    pub fat_free_mass: Decimal,
}

/// A metric left out of the assessment because its inputs were not supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmittedMetric {
    pub metric: MetricName,
    pub reason: String,
}

/// Complete result of assessing one measurement record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub gender: Gender,

    pub metrics: DerivedMetrics,

    /// Status for each classified index
    pub classifications: BTreeMap<MetricName, Status>,

    #[serde(rename = "bodyComposition", skip_serializing_if = "Option::is_none")]
    pub body_composition: Option<BodyComposition>,

    /// Descriptive category label for each index that has one
    pub categories: BTreeMap<MetricName, String>,

    /// Goal suggested from the metrics, when body composition is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_goal: Option<crate::goals::GoalSuggestion>,

    /// Recommendation bundle for a goal selected by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<crate::goals::RecommendationOutcome>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted: Vec<OmittedMetric>,

    /// Non-blocking plausibility notes, keyed like validation errors
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub warnings: BTreeMap<String, String>,
}

impl AssessmentResult {
    /// Value and status of a single metric
    pub fn classified(&self, metric: MetricName) -> ClassifiedMetric {
        ClassifiedMetric {
            value: self.metrics.get(metric),
            status: self
                .classifications
                .get(&metric)
                .copied()
                .unwrap_or(Status::Neutral),
        }
    }

    pub fn status(&self, metric: MetricName) -> Status {
        self.classified(metric).status
    }
}
