// Stage scheduler — runs the independent classification stages over one
// sanitized batch.
//
// Two modes: sequential (baseline, total latency = sum of stages) and
// concurrent (bounded worker pool, total latency ≈ the slowest stage).
// Concurrency is stage-level: each worker runs one whole stage over the
// full batch, which is where a model call's internal batching pays off.
//
// A failed stage never aborts the others. Its declared whole-batch
// fallback is substituted, with the same shape as a success, so assembly
// proceeds uniformly; the failure is logged but the run continues.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::classify::stages::{ClassificationStage, StageOutput};
use crate::sanitize::SanitizedBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    Concurrent { workers: usize },
}

pub struct StageScheduler {
    mode: ExecutionMode,
}

impl StageScheduler {
    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
        }
    }

    pub fn concurrent(workers: usize) -> Self {
        Self {
            mode: ExecutionMode::Concurrent {
                workers: workers.max(1),
            },
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run every stage over the batch, returning stage name → output.
    /// Every output has exactly one entry per batch position, regardless of
    /// mode or completion order.
    pub async fn run_stages(
        &self,
        batch: &SanitizedBatch,
        stages: &[Arc<dyn ClassificationStage>],
        batch_size: usize,
    ) -> HashMap<&'static str, StageOutput> {
        match self.mode {
            ExecutionMode::Sequential => {
                let mut outputs = HashMap::with_capacity(stages.len());
                for stage in stages {
                    let output = run_or_fallback(stage.as_ref(), batch, batch_size).await;
                    outputs.insert(stage.name(), output);
                }
                outputs
            }
            ExecutionMode::Concurrent { workers } => {
                // Stage-level worker pool: up to `workers` stages in flight
                // at once, each an independent unit of work. Results are
                // keyed by stage name, so completion order doesn't matter.
                stream::iter(stages.iter().map(|stage| async move {
                    let output = run_or_fallback(stage.as_ref(), batch, batch_size).await;
                    (stage.name(), output)
                }))
                .buffer_unordered(workers)
                .collect()
                .await
            }
        }
    }

    /// Single-item mode: run every stage over one nullable text. Stage
    /// failures are absorbed into fallbacks (the stages' own single-item
    /// contract), so this never fails.
    pub async fn run_single(
        &self,
        text: Option<&str>,
        stages: &[Arc<dyn ClassificationStage>],
    ) -> HashMap<&'static str, StageOutput> {
        let mut outputs = HashMap::with_capacity(stages.len());
        for stage in stages {
            outputs.insert(stage.name(), stage.run_one(text).await);
        }
        outputs
    }
}

async fn run_or_fallback(
    stage: &dyn ClassificationStage,
    batch: &SanitizedBatch,
    batch_size: usize,
) -> StageOutput {
    match stage.run_batch(batch, batch_size).await {
        Ok(output) => output,
        Err(e) => {
            warn!(
                stage = stage.name(),
                records = batch.len(),
                error = %e,
                "Stage failed for whole batch, substituting fallback"
            );
            stage.fallback(batch.len())
        }
    }
}
