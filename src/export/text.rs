use std::io::Write;

use super::ExportError;
use crate::engine::Evaluation;
use crate::goals::{GoalRecommendation, RecommendationOutcome};
use crate::models::{AssessmentResult, MetricName};

const RULE: &str = "========================================";
const THIN_RULE: &str = "----------------------------------------";

/// Human-readable assessment report
pub fn write_report<W: Write>(result: &AssessmentResult, mut out: W) -> Result<(), ExportError> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "ANTHROPOMETRIC ASSESSMENT")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Gender: {}", result.gender)?;
    writeln!(out)?;

    writeln!(out, "INDICES")?;
    writeln!(out, "{}", THIN_RULE)?;
    for metric in MetricName::ALL {
        let Some(value) = result.metrics.get(metric) else {
            continue;
        };

        let status = result
            .classifications
            .get(&metric)
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        let category = result
            .categories
            .get(&metric)
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();

        writeln!(out, "{:<22} {:>8}{}{}", metric.label(), value, status, category)?;
    }
    writeln!(out)?;

    if let Some(composition) = &result.body_composition {
        let (fat_share, lean_share) = composition.shares();
        writeln!(out, "BODY COMPOSITION")?;
        writeln!(out, "{}", THIN_RULE)?;
        writeln!(out, "Fat mass:      {} kg ({}%)", composition.fat_mass, fat_share)?;
        writeln!(out, "Fat-free mass: {} kg ({}%)", composition.fat_free_mass, lean_share)?;
        writeln!(out)?;
    }

    if !result.omitted.is_empty() {
        writeln!(out, "NOT COMPUTED")?;
        writeln!(out, "{}", THIN_RULE)?;
        for omitted in &result.omitted {
            writeln!(out, "• {}: {}", omitted.metric.label(), omitted.reason)?;
        }
        writeln!(out)?;
    }

    if !result.warnings.is_empty() {
        writeln!(out, "WARNINGS")?;
        writeln!(out, "{}", THIN_RULE)?;
        for (field, message) in &result.warnings {
            writeln!(out, "! {}: {}", field, message)?;
        }
        writeln!(out)?;
    }

    if let Some(suggestion) = &result.suggested_goal {
        writeln!(out, "SUGGESTED GOAL")?;
        writeln!(out, "{}", THIN_RULE)?;
        writeln!(out, "{}: {}", suggestion.primary_goal, suggestion.description)?;
        writeln!(out, "Caloric target: {}", suggestion.caloric)?;
        writeln!(out, "Training focus: {}", suggestion.training_focus)?;
        writeln!(out)?;
    }

    if let Some(outcome) = &result.recommendation {
        write_outcome(outcome, &mut out)?;
    }

    out.flush()?;
    Ok(())
}

/// Recommendation bundle, or the reason there is none
pub fn write_outcome<W: Write>(outcome: &RecommendationOutcome, mut out: W) -> Result<(), ExportError> {
    match outcome {
        RecommendationOutcome::Found(rec) => write_recommendation(rec, &mut out)?,
        RecommendationOutcome::Unavailable(err) => writeln!(out, "{}", err)?,
    }
    out.flush()?;
    Ok(())
}

pub fn write_recommendation<W: Write>(rec: &GoalRecommendation, mut out: W) -> Result<(), ExportError> {
    writeln!(out, "RECOMMENDATIONS: {}", rec.primary_goal)?;
    writeln!(out, "{}", THIN_RULE)?;
    writeln!(out, "{}", rec.description)?;
    writeln!(out, "Caloric target: {}", rec.caloric)?;
    writeln!(out, "Training focus: {}", rec.training_focus)?;

    for (title, items) in [
        ("Nutrition", &rec.nutrition),
        ("Training", &rec.training),
        ("Supplements", &rec.supplements),
    ] {
        writeln!(out)?;
        writeln!(out, "{}:", title)?;
        for item in items {
            writeln!(out, "  • {}", item)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Batch report: one section per record
pub fn write_evaluations<W: Write>(evaluations: &[Evaluation], mut out: W) -> Result<(), ExportError> {
    for (index, evaluation) in evaluations.iter().enumerate() {
        writeln!(out, "Record {}", index + 1)?;
        match evaluation {
            Evaluation::Assessed(result) => write_report(result, &mut out)?,
            Evaluation::Rejected(errors) => {
                for (field, message) in &errors.errors {
                    writeln!(out, "  ✗ {}: {}", field, message)?;
                }
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
