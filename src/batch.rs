//! Parallel evaluation of many measurement records
//!
//! Records are independent, so they are spread over a rayon pool. Output
//! order always matches input order.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::engine::{AssessmentEngine, Evaluation};
use crate::models::RawMeasurement;

/// Counts and timing for one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_records: usize,
    pub assessed: usize,
    pub rejected: usize,
    pub duration_ms: u128,
}

impl BatchSummary {
    fn from_evaluations(evaluations: &[Evaluation], duration_ms: u128) -> Self {
        let assessed = evaluations.iter().filter(|e| e.is_success()).count();
        Self {
            total_records: evaluations.len(),
            assessed,
            rejected: evaluations.len() - assessed,
            duration_ms,
        }
    }

    /// Records per second
    pub fn throughput(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.total_records as f64 / self.duration_ms as f64 * 1000.0
    }

    pub fn is_fully_successful(&self) -> bool {
        self.rejected == 0
    }

    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Summary\n  \
             Records: {}\n  \
             Assessed: {}\n  \
             Rejected: {}\n  \
             Total Time: {:.2}s\n  \
             Throughput: {:.0} records/sec",
            self.total_records,
            self.assessed,
            self.rejected,
            self.duration_ms as f64 / 1000.0,
            self.throughput()
        )
    }
}

/// Runs an [`AssessmentEngine`] over a batch with optional progress display
pub struct BatchRunner<'a> {
    engine: &'a AssessmentEngine,
    config: BatchConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(engine: &'a AssessmentEngine, config: BatchConfig) -> Self {
        Self { engine, config }
    }

    pub fn run(&self, records: &[RawMeasurement]) -> Result<(Vec<Evaluation>, BatchSummary)> {
        let start = Instant::now();
        info!("Evaluating {} records", records.len());

        let progress = self.progress_bar(records.len())?;

        let evaluations = match self.config.threads {
            Some(threads) => {
                debug!(threads, "using dedicated thread pool");
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;
                pool.install(|| self.evaluate_all(records, progress.as_ref()))
            }
            None => self.evaluate_all(records, progress.as_ref()),
        };

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        let summary = BatchSummary::from_evaluations(&evaluations, start.elapsed().as_millis());
        info!(
            total = summary.total_records,
            assessed = summary.assessed,
            rejected = summary.rejected,
            "batch complete"
        );

        Ok((evaluations, summary))
    }

    fn progress_bar(&self, len: usize) -> Result<Option<ProgressBar>> {
        if !self.config.show_progress {
            return Ok(None);
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")?
                .progress_chars("#>-"),
        );
        pb.set_message("evaluating");
        Ok(Some(pb))
    }

    fn evaluate_all(&self, records: &[RawMeasurement], progress: Option<&ProgressBar>) -> Vec<Evaluation> {
        records
            .par_iter()
            .map(|raw| {
                let evaluation = self.engine.evaluate(raw);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                evaluation
            })
            .collect()
    }
}
