pub mod activity;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod types;

pub use activity::sample_rate::{
    normalize_sample_rate, resolve_sample_rate, RateDecision, SUPPORTED_SAMPLE_RATES_HZ,
};
pub use activity::segmenter::{segment_activity, StreamingSegmenter};
pub use config::SyncConfig;
pub use error::SyncError;
pub use media::pcm::{load_pcm, probe_sample_rate};
pub use media::resample::conform_sample_rate;
pub use media::subtitles::{load_subtitle_dir, parse_srt, SubtitleBatch};
pub use pipeline::builder::SyncRankerBuilder;
pub use pipeline::runtime::SyncRanker;
pub use pipeline::traits::{ClassifierKind, OverlapScorer, VoiceClassifier};
pub use report::{RankingReport, ReferenceSource};
pub use scoring::overlap::score_overlap;
pub use scoring::ranking::RankingOrchestrator;
pub use types::{
    ActivityTimeline, CandidateFailure, DialogueSet, PcmAudio, RankingResult, ScoreRecord,
    TimeInterval,
};
