// Library interface for the anthropometric assessment engine.
// The CLI in main.rs and the integration tests both go through it.

pub mod batch;
pub mod body_composition;
pub mod categories;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod goals;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod thresholds;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use batch::{BatchRunner, BatchSummary};
pub use config::{BatchConfig, EngineConfig};
pub use engine::{evaluate, recommend, AssessmentEngine, Evaluation};
pub use error::{AnthropometryError, IncompleteDataError, Result, UnknownGoalError, ValidationError};
pub use goals::{CaloricStrategy, GoalId, GoalRecommendation, GoalSuggestion, RecommendationOutcome};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use thresholds::{Band, Bands, MetricThresholds, ThresholdTables};
pub use validation::{repeatability, validate, Repeatability};
