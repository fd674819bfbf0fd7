//! Threshold tables and risk classification
//!
//! Each classified metric maps to an optimal band and a warning band, shared
//! across genders or split by gender. The tables are plain data: they can be
//! replaced from configuration without touching [`ThresholdTables::classify`].
//!
//! Classification order (first match wins):
//! 1. value or table entry unavailable → neutral
//! 2. inside the optimal band, both ends inclusive → optimal
//! 3. inside the warning band, both ends inclusive → warning
//! 4. otherwise → alert
//!
//! A value sitting exactly on a bound shared by the optimal and warning
//! bands is therefore optimal.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::AnthropometryError;
use crate::models::{Gender, MetricName, Status};

/// Closed interval where either bound may be absent (unbounded on that side)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Band {
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub min: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub max: Option<Decimal>,
}

impl Band {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// At or above `min`, no upper limit
    pub const fn at_least(min: Decimal) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// At or below `max`, no lower limit
    pub const fn at_most(max: Decimal) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn is_well_formed(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{} to {}", min, max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, Some(max)) => write!(f, "<= {}", max),
            (None, None) => f.write_str("any"),
        }
    }
}

/// Optimal and warning bands for one metric (and gender)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub optimal: Band,
    pub warning: Band,
}

impl Bands {
    pub const fn new(optimal: Band, warning: Band) -> Self {
        Self { optimal, warning }
    }

    pub fn classify(&self, value: Decimal) -> Status {
        if self.optimal.contains(value) {
            Status::Optimal
        } else if self.warning.contains(value) {
            Status::Warning
        } else {
            Status::Alert
        }
    }
}

/// Bands for one metric, either gender-independent or per gender
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricThresholds {
    Shared(Bands),
    ByGender {
        #[serde(rename = "M")]
        male: Bands,
        #[serde(rename = "F")]
        female: Bands,
    },
}

impl MetricThresholds {
    /// Bands for a gender. Gender-split metrics have none without a gender.
    pub fn for_gender(&self, gender: Option<Gender>) -> Option<&Bands> {
        match (self, gender) {
            (MetricThresholds::Shared(bands), _) => Some(bands),
            (MetricThresholds::ByGender { male, .. }, Some(Gender::Male)) => Some(male),
            (MetricThresholds::ByGender { female, .. }, Some(Gender::Female)) => Some(female),
            (MetricThresholds::ByGender { .. }, None) => None,
        }
    }

    pub fn is_gender_specific(&self) -> bool {
        matches!(self, MetricThresholds::ByGender { .. })
    }

    fn all_bands(&self) -> Vec<&Bands> {
        match self {
            MetricThresholds::Shared(bands) => vec![bands],
            MetricThresholds::ByGender { male, female } => vec![male, female],
        }
    }
}

/// Threshold tables keyed by metric name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTables {
    tables: BTreeMap<MetricName, MetricThresholds>,
}

impl Default for ThresholdTables {
    fn default() -> Self {
        Self::standard().clone()
    }
}

impl ThresholdTables {
    /// The built-in reference tables
    pub fn standard() -> &'static ThresholdTables {
        static STANDARD: OnceLock<ThresholdTables> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut tables = BTreeMap::new();

            tables.insert(
                MetricName::Bmi,
                MetricThresholds::Shared(Bands::new(
                    Band::new(dec!(18.5), dec!(24.9)),
                    Band::new(dec!(25), dec!(29.9)),
                )),
            );
            tables.insert(
                MetricName::WaistHipRatio,
                MetricThresholds::ByGender {
                    male: Bands::new(
                        Band::new(dec!(0), dec!(0.90)),
                        Band::new(dec!(0.90), dec!(1.0)),
                    ),
                    female: Bands::new(
                        Band::new(dec!(0), dec!(0.85)),
                        Band::new(dec!(0.85), dec!(0.95)),
                    ),
                },
            );
            tables.insert(
                MetricName::WaistHeightRatio,
                MetricThresholds::Shared(Bands::new(
                    Band::new(dec!(0), dec!(0.5)),
                    Band::new(dec!(0.5), dec!(0.6)),
                )),
            );
            tables.insert(
                MetricName::BodyFatPercentage,
                MetricThresholds::ByGender {
                    male: Bands::new(Band::new(dec!(8), dec!(19)), Band::new(dec!(20), dec!(24))),
                    female: Bands::new(Band::new(dec!(15), dec!(25)), Band::new(dec!(26), dec!(31))),
                },
            );
            tables.insert(
                MetricName::FatFreeMassIndex,
                MetricThresholds::ByGender {
                    male: Bands::new(Band::new(dec!(19), dec!(25)), Band::new(dec!(17), dec!(18.9))),
                    female: Bands::new(Band::new(dec!(15), dec!(22)), Band::new(dec!(13), dec!(14.9))),
                },
            );

            ThresholdTables { tables }
        })
    }

    pub fn empty() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: MetricName) -> Option<&MetricThresholds> {
        self.tables.get(&metric)
    }

    /// Replace or add the entry for one metric
    pub fn set(&mut self, metric: MetricName, thresholds: MetricThresholds) {
        self.tables.insert(metric, thresholds);
    }

    /// Overlay another set of tables; entries in `other` win
    pub fn merged_with(&self, other: &ThresholdTables) -> ThresholdTables {
        let mut tables = self.tables.clone();
        tables.extend(other.tables.iter().map(|(k, v)| (*k, *v)));
        ThresholdTables { tables }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricName, &MetricThresholds)> {
        self.tables.iter()
    }

    pub fn bands(&self, metric: MetricName, gender: Option<Gender>) -> Option<&Bands> {
        self.get(metric).and_then(|t| t.for_gender(gender))
    }

    /// Classify a metric value for a gender
    pub fn classify(&self, metric: MetricName, value: Option<Decimal>, gender: Option<Gender>) -> Status {
        match (value, self.bands(metric, gender)) {
            (Some(value), Some(bands)) => bands.classify(value),
            _ => Status::Neutral,
        }
    }

    /// Check every band has `min <= max`
    pub fn validate(&self) -> Result<(), AnthropometryError> {
        for (metric, thresholds) in &self.tables {
            for bands in thresholds.all_bands() {
                if !bands.optimal.is_well_formed() || !bands.warning.is_well_formed() {
                    return Err(AnthropometryError::Configuration(format!(
                        "threshold band for {} has min greater than max",
                        metric
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Classify against the built-in reference tables
pub fn classify(metric: MetricName, value: Option<Decimal>, gender: Option<Gender>) -> Status {
    ThresholdTables::standard().classify(metric, value, gender)
}
