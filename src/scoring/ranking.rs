use std::any::Any;
use std::cmp::Ordering;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SyncError;
use crate::pipeline::traits::OverlapScorer;
use crate::types::{ActivityTimeline, CandidateFailure, DialogueSet, RankingResult, ScoreRecord};

/// Scores every candidate on a dedicated worker pool and orders the results.
pub struct RankingOrchestrator {
    scorer: Box<dyn OverlapScorer>,
    pool: ThreadPool,
}

impl RankingOrchestrator {
    pub fn new(scorer: Box<dyn OverlapScorer>, worker_threads: usize) -> Result<Self, SyncError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|idx| format!("subsync-score-{idx}"))
            .build()
            .map_err(SyncError::worker_pool)?;
        Ok(Self { scorer, pool })
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Blocks until every candidate is scored.
    ///
    /// Candidates whose scoring fails (error or panic) are left out of the
    /// ranking and listed in `failures`; the others are unaffected.
    pub fn rank(&self, reference: &ActivityTimeline, candidates: &[DialogueSet]) -> RankingResult {
        let scorer = self.scorer.as_ref();
        let outcomes: Vec<Result<f64, String>> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| score_isolated(scorer, reference, candidate))
                .collect()
        });
        let result = collect_ranking(candidates, outcomes, reference.total_duration());

        tracing::debug!(
            candidates = candidates.len(),
            ranked = result.ranked.len(),
            failed = result.failures.len(),
            reference_secs = result.reference_secs,
            workers = self.worker_threads(),
            "ranking: all candidates scored"
        );
        result
    }
}

fn score_isolated(
    scorer: &dyn OverlapScorer,
    reference: &ActivityTimeline,
    candidate: &DialogueSet,
) -> Result<f64, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| scorer.score(reference, candidate))) {
        Ok(Ok(score)) if score.is_nan() => Err("scorer returned NaN".to_string()),
        Ok(Ok(score)) => Ok(score),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(format!("scorer panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// `outcomes[i]` belongs to `candidates[i]`. The sort is stable, so ties keep input order.
fn collect_ranking(
    candidates: &[DialogueSet],
    outcomes: Vec<Result<f64, String>>,
    reference_secs: f64,
) -> RankingResult {
    let mut ranked = Vec::with_capacity(candidates.len());
    let mut failures = Vec::new();
    for (candidate, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            Ok(score) => ranked.push(ScoreRecord {
                id: candidate.id.clone(),
                score,
            }),
            Err(reason) => {
                tracing::warn!(
                    candidate = candidate.id.as_str(),
                    reason = reason.as_str(),
                    "ranking: candidate excluded"
                );
                failures.push(CandidateFailure {
                    id: candidate.id.clone(),
                    reason,
                });
            }
        }
    }
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    RankingResult {
        ranked,
        failures,
        reference_secs,
    }
}
