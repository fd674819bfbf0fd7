//! Descriptive categories for derived indices.
//!
//! These labels are independent of the status bands in [`crate::thresholds`]:
//! the status drives risk colouring, the category names where on the
//! reference scale a value sits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{DerivedMetrics, Gender, MetricName};

/// WHO adult BMI classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    SevereThinness,
    ModerateThinness,
    MildThinness,
    Normal,
    Overweight,
    ObesityClassI,
    ObesityClassII,
    ObesityClassIII,
}

impl BmiCategory {
    pub fn from_bmi(bmi: Decimal) -> Self {
        match bmi {
            b if b < dec!(16) => BmiCategory::SevereThinness,
            b if b < dec!(17) => BmiCategory::ModerateThinness,
            b if b < dec!(18.5) => BmiCategory::MildThinness,
            b if b < dec!(25) => BmiCategory::Normal,
            b if b < dec!(30) => BmiCategory::Overweight,
            b if b < dec!(35) => BmiCategory::ObesityClassI,
            b if b < dec!(40) => BmiCategory::ObesityClassII,
            _ => BmiCategory::ObesityClassIII,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::SevereThinness => "Severe thinness",
            BmiCategory::ModerateThinness => "Moderate thinness",
            BmiCategory::MildThinness => "Mild thinness",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::ObesityClassI => "Obesity class I",
            BmiCategory::ObesityClassII => "Obesity class II",
            BmiCategory::ObesityClassIII => "Obesity class III",
        }
    }
}

/// Body-fat ranges (essential fat through elevated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFatCategory {
    Essential,
    Athletic,
    Fitness,
    Acceptable,
    Elevated,
}

impl BodyFatCategory {
    pub fn from_percentage(pct: Decimal, gender: Gender) -> Self {
        let (essential, athletic, fitness, acceptable) = match gender {
            Gender::Male => (dec!(6), dec!(13), dec!(19), dec!(24)),
            Gender::Female => (dec!(13), dec!(20), dec!(25), dec!(31)),
        };

        if pct < essential {
            BodyFatCategory::Essential
        } else if pct <= athletic {
            BodyFatCategory::Athletic
        } else if pct <= fitness {
            BodyFatCategory::Fitness
        } else if pct <= acceptable {
            BodyFatCategory::Acceptable
        } else {
            BodyFatCategory::Elevated
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BodyFatCategory::Essential => "Essential",
            BodyFatCategory::Athletic => "Athletic",
            BodyFatCategory::Fitness => "Fitness",
            BodyFatCategory::Acceptable => "Acceptable",
            BodyFatCategory::Elevated => "Elevated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FfmiCategory {
    Low,
    Moderate,
    Optimal,
    VeryHigh,
}

impl FfmiCategory {
    pub fn from_ffmi(ffmi: Decimal, gender: Gender) -> Self {
        let (low, moderate, optimal) = match gender {
            Gender::Male => (dec!(17), dec!(19), dec!(25)),
            Gender::Female => (dec!(13), dec!(15), dec!(22)),
        };

        if ffmi < low {
            FfmiCategory::Low
        } else if ffmi < moderate {
            FfmiCategory::Moderate
        } else if ffmi <= optimal {
            FfmiCategory::Optimal
        } else {
            FfmiCategory::VeryHigh
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FfmiCategory::Low => "Low",
            FfmiCategory::Moderate => "Moderate",
            FfmiCategory::Optimal => "Optimal",
            FfmiCategory::VeryHigh => "Very high",
        }
    }
}

/// Cardiometabolic risk implied by a waist-based ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentralRiskCategory {
    Healthy,
    ModerateRisk,
    HighRisk,
}

impl CentralRiskCategory {
    pub fn from_waist_hip_ratio(ratio: Decimal, gender: Gender) -> Self {
        let (healthy, moderate) = match gender {
            Gender::Male => (dec!(0.90), dec!(1.0)),
            Gender::Female => (dec!(0.85), dec!(0.95)),
        };
        Self::from_cuts(ratio, healthy, moderate)
    }

    pub fn from_waist_height_ratio(ratio: Decimal) -> Self {
        Self::from_cuts(ratio, dec!(0.5), dec!(0.6))
    }

    fn from_cuts(ratio: Decimal, healthy: Decimal, moderate: Decimal) -> Self {
        if ratio <= healthy {
            CentralRiskCategory::Healthy
        } else if ratio <= moderate {
            CentralRiskCategory::ModerateRisk
        } else {
            CentralRiskCategory::HighRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CentralRiskCategory::Healthy => "Healthy",
            CentralRiskCategory::ModerateRisk => "Moderate risk",
            CentralRiskCategory::HighRisk => "High risk",
        }
    }
}

/// Category label for every metric that has a reference scale
pub fn categorize(metrics: &DerivedMetrics, gender: Gender) -> BTreeMap<MetricName, String> {
    let mut labels = BTreeMap::new();

    labels.insert(
        MetricName::Bmi,
        BmiCategory::from_bmi(metrics.bmi).label().to_string(),
    );
    labels.insert(
        MetricName::WaistHipRatio,
        CentralRiskCategory::from_waist_hip_ratio(metrics.waist_hip_ratio, gender)
            .label()
            .to_string(),
    );
    labels.insert(
        MetricName::WaistHeightRatio,
        CentralRiskCategory::from_waist_height_ratio(metrics.waist_height_ratio)
            .label()
            .to_string(),
    );

    if let Some(pct) = metrics.body_fat_percentage {
        labels.insert(
            MetricName::BodyFatPercentage,
            BodyFatCategory::from_percentage(pct, gender).label().to_string(),
        );
    }

    if let Some(ffmi) = metrics.fat_free_mass_index {
        labels.insert(
            MetricName::FatFreeMassIndex,
            FfmiCategory::from_ffmi(ffmi, gender).label().to_string(),
        );
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_categories() {
        assert_eq!(BmiCategory::from_bmi(dec!(15.9)), BmiCategory::SevereThinness);
        assert_eq!(BmiCategory::from_bmi(dec!(18.49)), BmiCategory::MildThinness);
        assert_eq!(BmiCategory::from_bmi(dec!(24.69)), BmiCategory::Normal);
        // categories are half-open, unlike the status bands
        assert_eq!(BmiCategory::from_bmi(dec!(24.95)), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(dec!(30)), BmiCategory::ObesityClassI);
        assert_eq!(BmiCategory::from_bmi(dec!(41)), BmiCategory::ObesityClassIII);
    }

    #[test]
    fn test_body_fat_categories_by_gender() {
        assert_eq!(
            BodyFatCategory::from_percentage(dec!(12), Gender::Male),
            BodyFatCategory::Athletic
        );
        assert_eq!(
            BodyFatCategory::from_percentage(dec!(12), Gender::Female),
            BodyFatCategory::Essential
        );
        assert_eq!(
            BodyFatCategory::from_percentage(dec!(28), Gender::Female),
            BodyFatCategory::Acceptable
        );
        assert_eq!(
            BodyFatCategory::from_percentage(dec!(28), Gender::Male),
            BodyFatCategory::Elevated
        );
    }

    #[test]
    fn test_ffmi_categories() {
        assert_eq!(FfmiCategory::from_ffmi(dec!(18), Gender::Male), FfmiCategory::Moderate);
        assert_eq!(FfmiCategory::from_ffmi(dec!(18), Gender::Female), FfmiCategory::Optimal);
        assert_eq!(FfmiCategory::from_ffmi(dec!(26), Gender::Male), FfmiCategory::VeryHigh);
    }

    #[test]
    fn test_central_risk() {
        assert_eq!(
            CentralRiskCategory::from_waist_hip_ratio(dec!(0.92), Gender::Male),
            CentralRiskCategory::ModerateRisk
        );
        assert_eq!(
            CentralRiskCategory::from_waist_hip_ratio(dec!(0.97), Gender::Female),
            CentralRiskCategory::HighRisk
        );
        assert_eq!(
            CentralRiskCategory::from_waist_height_ratio(dec!(0.47)),
            CentralRiskCategory::Healthy
        );
    }
}
