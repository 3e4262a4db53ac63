use crate::activity::segmenter::{segment_activity, StreamingSegmenter};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::pipeline::traits::VoiceClassifier;
use crate::scoring::ranking::RankingOrchestrator;
use crate::types::{ActivityTimeline, DialogueSet, PcmAudio, RankingResult};

pub struct SyncRanker {
    config: SyncConfig,
    classifier: Box<dyn VoiceClassifier>,
    orchestrator: RankingOrchestrator,
}

pub(crate) struct SyncRankerParts {
    pub config: SyncConfig,
    pub classifier: Box<dyn VoiceClassifier>,
    pub orchestrator: RankingOrchestrator,
}

impl SyncRanker {
    pub(crate) fn from_parts(parts: SyncRankerParts) -> Self {
        Self {
            config: parts.config,
            classifier: parts.classifier,
            orchestrator: parts.orchestrator,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn classifier_label(&self) -> &'static str {
        self.classifier.label()
    }

    pub fn worker_threads(&self) -> usize {
        self.orchestrator.worker_threads()
    }

    pub fn segment(&mut self, audio: &PcmAudio) -> Result<ActivityTimeline, SyncError> {
        segment_activity(audio, self.classifier.as_mut(), &self.config)
    }

    /// Segmenter fed incrementally, for audio that arrives in chunks.
    pub fn segment_stream(
        &mut self,
        sample_rate_hz: u32,
    ) -> Result<StreamingSegmenter<'_>, SyncError> {
        StreamingSegmenter::new(self.classifier.as_mut(), sample_rate_hz, &self.config)
    }

    pub fn rank(&self, reference: &ActivityTimeline, candidates: &[DialogueSet]) -> RankingResult {
        self.orchestrator.rank(reference, candidates)
    }

    pub fn rank_audio(
        &mut self,
        audio: &PcmAudio,
        candidates: &[DialogueSet],
    ) -> Result<(ActivityTimeline, RankingResult), SyncError> {
        let timeline = self.segment(audio)?;
        if timeline.is_empty() {
            tracing::warn!(
                duration_secs = audio.duration_secs(),
                "no speech detected; every candidate scores 0"
            );
        }
        let result = self.rank(&timeline, candidates);
        Ok((timeline, result))
    }
}
