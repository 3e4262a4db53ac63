use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::pipeline::defaults::{build_classifier, PairwiseOverlapScorer};
use crate::pipeline::runtime::{SyncRanker, SyncRankerParts};
use crate::pipeline::traits::{ClassifierKind, OverlapScorer, VoiceClassifier};
use crate::scoring::ranking::RankingOrchestrator;

pub struct SyncRankerBuilder {
    config: SyncConfig,
    classifier_kind: ClassifierKind,
    classifier: Option<Box<dyn VoiceClassifier>>,
    scorer: Option<Box<dyn OverlapScorer>>,
}

impl SyncRankerBuilder {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            classifier_kind: ClassifierKind::default(),
            classifier: None,
            scorer: None,
        }
    }

    pub fn with_classifier_kind(mut self, classifier_kind: ClassifierKind) -> Self {
        self.classifier_kind = classifier_kind;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn VoiceClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn OverlapScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn build(self) -> Result<SyncRanker, SyncError> {
        self.config.validate()?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => build_classifier(self.classifier_kind)?,
        };
        if !classifier.supports_frame_duration_ms(self.config.frame_duration_ms) {
            return Err(SyncError::invalid_config(format!(
                "{} classifier does not accept {} ms frames",
                classifier.label(),
                self.config.frame_duration_ms
            )));
        }

        let scorer = self
            .scorer
            .unwrap_or_else(|| Box::new(PairwiseOverlapScorer));
        let orchestrator =
            RankingOrchestrator::new(scorer, self.config.resolved_worker_threads())?;

        Ok(SyncRanker::from_parts(SyncRankerParts {
            config: self.config,
            classifier,
            orchestrator,
        }))
    }
}
