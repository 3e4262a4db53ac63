use chrono::Utc;
use serde::Serialize;

use crate::config::SyncConfig;
use crate::types::{CandidateFailure, RankingResult};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RankingReport {
    pub schema_version: u32,
    pub meta: ReportMeta,
    pub ranked: Vec<RankedEntry>,
    /// Candidates that were loaded but could not be scored.
    pub failures: Vec<CandidateFailure>,
    /// Subtitle files that never became candidates.
    pub skipped: Vec<CandidateFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub generated_at: String,
    pub reference: ReferenceSource,
    pub classifier: String,
    pub frame_duration_ms: u32,
    pub activity_threshold: f64,
    pub worker_threads: usize,
    pub active_seconds: f64,
    pub counts: ReportCounts,
}

/// Where the reference activity timeline came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSource {
    Audio { path: String, sample_rate_hz: u32 },
    SyncedSubtitle { path: String },
    TimelineCache { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub candidates: usize,
    pub scored: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 1-based.
    pub rank: usize,
    pub id: String,
    pub score: f64,
}

impl RankingReport {
    pub fn new(
        reference: ReferenceSource,
        classifier: &str,
        config: &SyncConfig,
        worker_threads: usize,
        result: &RankingResult,
        skipped: &[CandidateFailure],
    ) -> Self {
        let ranked = result
            .ranked
            .iter()
            .enumerate()
            .map(|(idx, record)| RankedEntry {
                rank: idx + 1,
                id: record.id.clone(),
                score: record.score,
            })
            .collect::<Vec<_>>();

        let counts = ReportCounts {
            candidates: result.ranked.len() + result.failures.len(),
            scored: result.ranked.len(),
            failed: result.failures.len(),
            skipped: skipped.len(),
        };

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            meta: ReportMeta {
                generated_at: Utc::now().to_rfc3339(),
                reference,
                classifier: classifier.to_string(),
                frame_duration_ms: config.frame_duration_ms,
                activity_threshold: config.activity_threshold,
                worker_threads,
                active_seconds: result.reference_secs,
                counts,
            },
            ranked,
            failures: result.failures.clone(),
            skipped: skipped.to_vec(),
        }
    }

    /// Plain-text table of the ranking, one candidate per line.
    pub fn summary_table(&self) -> String {
        let id_width = self
            .ranked
            .iter()
            .map(|entry| entry.id.chars().count())
            .max()
            .unwrap_or(0)
            .max("subtitle".len());

        let mut out = format!("{:>4}  {:<id_width$}  {:>7}\n", "rank", "subtitle", "score");
        for entry in &self.ranked {
            out.push_str(&format!(
                "{:>4}  {:<id_width$}  {:>6.2}%\n",
                entry.rank,
                entry.id,
                entry.score * 100.0
            ));
        }
        for failure in self.failures.iter().chain(&self.skipped) {
            out.push_str(&format!("   -  {:<id_width$}  {}\n", failure.id, failure.reason));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoreRecord;

    fn sample_result() -> RankingResult {
        RankingResult {
            ranked: vec![
                ScoreRecord {
                    id: "good.srt".to_string(),
                    score: 0.75,
                },
                ScoreRecord {
                    id: "late.srt".to_string(),
                    score: 0.125,
                },
            ],
            failures: vec![CandidateFailure {
                id: "broken.srt".to_string(),
                reason: "invalid dialogue interval".to_string(),
            }],
            reference_secs: 8.0,
        }
    }

    #[test]
    fn ranks_are_one_based_and_counts_add_up() {
        let skipped = vec![CandidateFailure {
            id: "latin1.srt".to_string(),
            reason: "not UTF-8".to_string(),
        }];
        let report = RankingReport::new(
            ReferenceSource::SyncedSubtitle {
                path: "synced.srt".to_string(),
            },
            "webrtc",
            &SyncConfig::default(),
            4,
            &sample_result(),
            &skipped,
        );

        assert_eq!(report.schema_version, REPORT_SCHEMA_VERSION);
        assert_eq!(report.ranked[0].rank, 1);
        assert_eq!(report.ranked[1].rank, 2);
        assert_eq!(report.ranked[1].id, "late.srt");
        assert_eq!(
            report.meta.counts,
            ReportCounts {
                candidates: 3,
                scored: 2,
                failed: 1,
                skipped: 1,
            }
        );
        assert_eq!(report.meta.active_seconds, 8.0);
    }

    #[test]
    fn serializes_reference_with_kind_tag() {
        let report = RankingReport::new(
            ReferenceSource::Audio {
                path: "movie.wav".to_string(),
                sample_rate_hz: 16_000,
            },
            "energy",
            &SyncConfig::default(),
            1,
            &sample_result(),
            &[],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["meta"]["reference"]["kind"], "audio");
        assert_eq!(value["meta"]["reference"]["sample_rate_hz"], 16_000);
        assert_eq!(value["meta"]["frame_duration_ms"], 20);
        assert_eq!(value["ranked"][0]["score"], 0.75);
        assert!(value["meta"]["generated_at"].as_str().is_some());
    }

    #[test]
    fn summary_lists_ranked_then_failed() {
        let report = RankingReport::new(
            ReferenceSource::TimelineCache {
                path: "t.json".to_string(),
            },
            "webrtc",
            &SyncConfig::default(),
            1,
            &sample_result(),
            &[],
        );
        let table = report.summary_table();
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("good.srt") && lines[1].contains("75.00%"));
        assert!(lines[2].contains("late.srt") && lines[2].contains("12.50%"));
        assert!(lines[3].contains("broken.srt"));
    }
}
