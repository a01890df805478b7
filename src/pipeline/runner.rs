// Chunked batch runner — drives the pipeline over the full record set.
//
// Splits the records into fixed-size chunks and runs each through
// sanitize → schedule → assemble, so peak memory is bounded by the chunk
// size rather than the run size, and each chunk boundary is a natural
// checkpoint. Chunks run in input order; the aggregated result preserves
// global input order.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::classify::stages::ClassificationStage;
use crate::db::models::{CommentRecord, Insight};
use crate::pipeline::assemble::assemble;
use crate::pipeline::scheduler::StageScheduler;
use crate::sanitize::sanitize;
use crate::scoring::risk::RiskWeights;

/// The outcome of one pipeline run. `analyzed_records` can be lower than
/// `total_records` when individual records were skipped during assembly;
/// that difference is how callers detect a degraded run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub total_records: usize,
    pub analyzed_records: usize,
    #[serde(rename = "results")]
    pub insights: Vec<Insight>,
}

/// Run the enrichment pipeline over every record, chunk by chunk.
///
/// Classification failures degrade to fallbacks inside the scheduler and
/// assembler, so this never fails. Persistence, the one fatal path, is
/// the caller's job.
pub async fn run(
    records: &[CommentRecord],
    stages: &[Arc<dyn ClassificationStage>],
    scheduler: &StageScheduler,
    chunk_size: usize,
    batch_size: usize,
    weights: &RiskWeights,
) -> RunReport {
    let chunk_size = chunk_size.max(1);

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Enriching [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let mut insights: Vec<Insight> = Vec::with_capacity(records.len());

    for (chunk_index, chunk) in records.chunks(chunk_size).enumerate() {
        let texts: Vec<Option<&str>> = chunk.iter().map(|r| r.comment.as_deref()).collect();
        let batch = sanitize(&texts);

        let outputs = scheduler.run_stages(&batch, stages, batch_size).await;
        let assembled = assemble(chunk, outputs, weights);

        info!(
            chunk = chunk_index,
            records = chunk.len(),
            valid = batch.valid_count(),
            assembled = assembled.len(),
            "Chunk enriched"
        );

        insights.extend(assembled);
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();

    RunReport {
        total_records: records.len(),
        analyzed_records: insights.len(),
        insights,
    }
}
