//! Assessment engine: validate → compute → classify → decompose → recommend
//!
//! [`AssessmentEngine`] owns the active threshold tables and is the only
//! entry point the CLI and the batch runner use. Every outcome is data:
//! rejected input becomes [`Evaluation::Rejected`], an unknown goal becomes
//! [`RecommendationOutcome::Unavailable`].

use rayon::prelude::*;
use serde::ser::Serializer;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::categories;
use crate::config::EngineConfig;
use crate::error::{AnthropometryError, ValidationError};
use crate::goals::{self, GoalId, RecommendationOutcome};
use crate::metrics;
use crate::models::{
    AssessmentResult, BodyComposition, MeasurementInput, MetricName, OmittedMetric, RawMeasurement,
};
use crate::thresholds::ThresholdTables;
use crate::validation;

/// Outcome of evaluating one raw record.
///
/// Serializes as `{"success": true, ...assessment}` or
/// `{"success": false, "errors": {field: message}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Assessed(Box<AssessmentResult>),
    Rejected(ValidationError),
}

impl Evaluation {
    pub fn is_success(&self) -> bool {
        matches!(self, Evaluation::Assessed(_))
    }

    pub fn assessment(&self) -> Option<&AssessmentResult> {
        match self {
            Evaluation::Assessed(result) => Some(&**result),
            Evaluation::Rejected(_) => None,
        }
    }

    pub fn errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Evaluation::Assessed(_) => None,
            Evaluation::Rejected(err) => Some(&err.errors),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`
    pub fn into_result(self) -> Result<AssessmentResult, AnthropometryError> {
        match self {
            Evaluation::Assessed(result) => Ok(*result),
            Evaluation::Rejected(err) => Err(err.into()),
        }
    }
}

impl Serialize for Evaluation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Assessed<'a> {
            success: bool,
            #[serde(flatten)]
            result: &'a AssessmentResult,
        }

        #[derive(Serialize)]
        struct Rejected<'a> {
            success: bool,
            errors: &'a BTreeMap<String, String>,
        }

        match self {
            Evaluation::Assessed(result) => Assessed {
                success: true,
                result,
            }
            .serialize(serializer),
            Evaluation::Rejected(err) => Rejected {
                success: false,
                errors: &err.errors,
            }
            .serialize(serializer),
        }
    }
}

/// Runs the assessment pipeline against a set of threshold tables
#[derive(Debug, Clone, Default)]
pub struct AssessmentEngine {
    thresholds: ThresholdTables,
}

impl AssessmentEngine {
    /// Engine using the built-in reference tables
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ThresholdTables) -> Self {
        Self { thresholds }
    }

    /// Engine using the configured tables, overlaid on the built-in ones
    pub fn from_config(config: &EngineConfig) -> Result<Self, AnthropometryError> {
        let thresholds = config.threshold_tables();
        thresholds.validate()?;
        Ok(Self::with_thresholds(thresholds))
    }

    pub fn thresholds(&self) -> &ThresholdTables {
        &self.thresholds
    }

    /// Validate and assess one raw record
    pub fn evaluate(&self, raw: &RawMeasurement) -> Evaluation {
        self.assess(raw, None)
    }

    /// Validate and assess one raw record, optionally attaching a goal bundle
    pub fn assess(&self, raw: &RawMeasurement, goal: Option<&str>) -> Evaluation {
        match validation::validate(raw) {
            Ok(input) => {
                let mut result = self.assess_input(&input);
                if let Some(goal) = goal {
                    result.recommendation = Some(self.recommend_for(goal, &result));
                }
                Evaluation::Assessed(Box::new(result))
            }
            Err(errors) => {
                debug!(fields = errors.len(), "measurement rejected");
                Evaluation::Rejected(errors)
            }
        }
    }

    /// Assess an already validated record
    pub fn assess_input(&self, input: &MeasurementInput) -> AssessmentResult {
        let (derived, incomplete) = metrics::compute(input);

        let classifications: BTreeMap<MetricName, _> = MetricName::CLASSIFIED
            .iter()
            .map(|metric| {
                let status = self
                    .thresholds
                    .classify(*metric, derived.get(*metric), Some(input.gender));
                (*metric, status)
            })
            .collect();

        let mut omitted = Vec::new();
        if let Some(err) = incomplete {
            debug!(
                metric = %err.metric,
                missing = err.missing_sites.len(),
                "skinfold-dependent metrics omitted"
            );
            let reason = err.to_string();
            for metric in [
                MetricName::BodyFatPercentage,
                MetricName::FatMass,
                MetricName::FatFreeMass,
                MetricName::FatFreeMassIndex,
            ] {
                omitted.push(OmittedMetric {
                    metric,
                    reason: reason.clone(),
                });
            }
        }

        let body_composition = derived
            .fat_mass
            .zip(derived.fat_free_mass)
            .map(|(fat_mass, fat_free_mass)| BodyComposition {
                fat_mass,
                fat_free_mass,
            });

        let result = AssessmentResult {
            gender: input.gender,
            warnings: validation::coherence_warnings(input),
            body_composition,
            categories: categories::categorize(&derived, input.gender),
            suggested_goal: goals::suggest_goal(input.gender, &derived),
            recommendation: None,
            classifications,
            metrics: derived,
            omitted,
        };

        debug!(
            gender = %result.gender,
            omitted = result.omitted.len(),
            "measurement assessed"
        );

        result
    }

    /// Goal bundle for an identifier, at zero excess
    pub fn recommend(&self, goal: &str) -> RecommendationOutcome {
        let outcome = RecommendationOutcome::from(goals::resolve(goal));
        if !outcome.is_found() {
            debug!(goal, "no recommendation for goal");
        }
        outcome
    }

    /// Goal bundle scaled by an assessment's metrics
    fn recommend_for(&self, goal: &str, result: &AssessmentResult) -> RecommendationOutcome {
        match goal.parse::<GoalId>() {
            Ok(id) => RecommendationOutcome::Found(goals::resolve_for(id, result.gender, &result.metrics)),
            Err(err) => {
                debug!(goal, "no recommendation for goal");
                RecommendationOutcome::Unavailable(err)
            }
        }
    }

    /// Evaluate independent records in parallel; output order matches input order
    pub fn evaluate_batch(&self, records: &[RawMeasurement]) -> Vec<Evaluation> {
        let evaluations: Vec<Evaluation> = records.par_iter().map(|raw| self.evaluate(raw)).collect();

        let rejected = evaluations.iter().filter(|e| !e.is_success()).count();
        info!(
            total = evaluations.len(),
            rejected,
            "batch evaluation complete"
        );

        evaluations
    }
}

/// Evaluate against the built-in tables
pub fn evaluate(raw: &RawMeasurement) -> Evaluation {
    AssessmentEngine::new().evaluate(raw)
}

/// Recommendation bundle for a goal identifier
pub fn recommend(goal: &str) -> RecommendationOutcome {
    AssessmentEngine::new().recommend(goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::thresholds::{Band, Bands, MetricThresholds};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn male_record() -> RawMeasurement {
        RawMeasurement::default()
            .with("gender", "M")
            .with("age", 30)
            .with("weight", 80)
            .with("height", 180)
            .with("waist", 85)
            .with("hip", 95)
    }

    #[test]
    fn test_evaluate_without_skinfolds() {
        let evaluation = evaluate(&male_record());
        let result = evaluation.assessment().unwrap();

        assert_eq!(result.metrics.bmi, dec!(24.69));
        assert_eq!(result.status(MetricName::Bmi), Status::Optimal);
        assert_eq!(result.status(MetricName::WaistHipRatio), Status::Optimal);
        assert_eq!(result.status(MetricName::BodyFatPercentage), Status::Neutral);
        assert!(result.body_composition.is_none());
        assert!(result.suggested_goal.is_none());
        assert_eq!(result.omitted.len(), 4);
    }

    #[test]
    fn test_evaluate_with_skinfolds() {
        let raw = male_record()
            .with("chest_fold", 10)
            .with("abdomen_fold", 15)
            .with("thigh_fold", 12);

        let evaluation = evaluate(&raw);
        let result = evaluation.assessment().unwrap();

        assert_eq!(result.metrics.body_fat_percentage, Some(dec!(11.2)));
        assert_eq!(result.status(MetricName::FatFreeMassIndex), Status::Optimal);
        let composition = result.body_composition.unwrap();
        assert_eq!(composition.fat_mass + composition.fat_free_mass, dec!(80));
        assert!(result.omitted.is_empty());
        assert!(result.suggested_goal.is_some());
    }

    #[test]
    fn test_composition_matches_metrics() {
        let raw = male_record()
            .with("chest_fold", 20)
            .with("abdomen_fold", 30)
            .with("thigh_fold", 20);

        let result = evaluate(&raw).into_result().unwrap();
        let composition = result.body_composition.unwrap();

        assert_eq!(Some(composition.fat_mass), result.metrics.fat_mass);
        assert_eq!(Some(composition.fat_free_mass), result.metrics.fat_free_mass);
    }

    #[test]
    fn test_extreme_build_is_assessed_with_warning() {
        for (weight, height) in [(30, 250), (300, 150), (35, 190), (250, 200)] {
            let raw = male_record().with("weight", weight).with("height", height);
            let evaluation = evaluate(&raw);

            let result = evaluation.assessment().expect("in-domain record is assessed");
            assert!(result.warnings.contains_key("bmi_coherence"));
            assert_eq!(result.status(MetricName::Bmi), Status::Alert);
        }

        let json = serde_json::to_value(evaluate(&male_record())).unwrap();
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_bri_is_neutral_with_standard_tables() {
        let evaluation = evaluate(&male_record());
        assert_eq!(
            evaluation.assessment().unwrap().status(MetricName::BodyRoundnessIndex),
            Status::Neutral
        );
    }

    #[test]
    fn test_rejected_record_shape() {
        let raw = male_record().with("weight", 20);
        let evaluation = evaluate(&raw);

        assert!(!evaluation.is_success());
        let json = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(json["success"], json!(false));
        assert!(json["errors"]["weight"].is_string());
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_assessed_record_shape() {
        let json = serde_json::to_value(evaluate(&male_record())).unwrap();

        assert_eq!(json["success"], json!(true));
        assert_eq!(json["gender"], json!("M"));
        assert_eq!(json["metrics"]["bmi"], json!(24.69));
        assert_eq!(json["classifications"]["bmi"], json!("optimal"));
        assert!(json.get("bodyComposition").is_none());
    }

    #[test]
    fn test_assess_with_unknown_goal() {
        let evaluation = AssessmentEngine::new().assess(&male_record(), Some("unknown_goal"));
        let result = evaluation.assessment().unwrap();

        assert!(matches!(
            result.recommendation,
            Some(RecommendationOutcome::Unavailable(_))
        ));
    }

    #[test]
    fn test_recommend() {
        assert!(recommend("Hipertrofia").is_found());
        assert!(!recommend("unknown_goal").is_found());
    }

    #[test]
    fn test_custom_thresholds() {
        let mut tables = ThresholdTables::standard().clone();
        tables.set(
            MetricName::BodyRoundnessIndex,
            MetricThresholds::Shared(Bands::new(Band::at_most(dec!(4)), Band::new(dec!(4), dec!(6)))),
        );

        let engine = AssessmentEngine::with_thresholds(tables);
        let evaluation = engine.evaluate(&male_record());
        assert_eq!(
            evaluation.assessment().unwrap().status(MetricName::BodyRoundnessIndex),
            Status::Optimal
        );
    }

    #[test]
    fn test_batch_preserves_order() {
        let records = vec![
            male_record(),
            male_record().with("weight", 20),
            male_record().with("weight", 95),
        ];

        let evaluations = AssessmentEngine::new().evaluate_batch(&records);

        assert_eq!(evaluations.len(), 3);
        assert!(evaluations[0].is_success());
        assert!(!evaluations[1].is_success());
        assert_eq!(
            evaluations[2].assessment().unwrap().metrics.bmi,
            dec!(29.32)
        );
    }
}
