use crate::activity::energy::EnergyClassifier;
use crate::error::SyncError;
use crate::pipeline::traits::{ClassifierKind, OverlapScorer, VoiceClassifier};
use crate::scoring::overlap::score_overlap;
use crate::types::{ActivityTimeline, DialogueSet};

pub struct PairwiseOverlapScorer;

impl OverlapScorer for PairwiseOverlapScorer {
    fn score(
        &self,
        reference: &ActivityTimeline,
        candidate: &DialogueSet,
    ) -> Result<f64, SyncError> {
        score_overlap(reference, candidate)
    }
}

pub(crate) fn build_classifier(
    kind: ClassifierKind,
) -> Result<Box<dyn VoiceClassifier>, SyncError> {
    match kind {
        ClassifierKind::Energy => Ok(Box::new(EnergyClassifier::default())),
        ClassifierKind::WebRtc => build_webrtc_classifier(),
    }
}

fn build_webrtc_classifier() -> Result<Box<dyn VoiceClassifier>, SyncError> {
    #[cfg(feature = "webrtc")]
    {
        Ok(Box::new(crate::activity::webrtc::WebRtcClassifier::new()))
    }

    #[cfg(not(feature = "webrtc"))]
    {
        Err(SyncError::invalid_config(
            "WebRTC voice activity support is disabled; enable the `webrtc` cargo feature",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairwise_scorer_delegates_to_overlap() {
        let reference = ActivityTimeline::from_active_seconds(&[0, 5, 9]).unwrap();
        let candidate = DialogueSet::from_pairs("a", &[(0.0, 1.0), (5.0, 6.0)]);
        let score = PairwiseOverlapScorer.score(&reference, &candidate).unwrap();
        assert_eq!(score, score_overlap(&reference, &candidate).unwrap());
    }

    #[test]
    fn energy_classifier_is_always_available() {
        let classifier = build_classifier(ClassifierKind::Energy).unwrap();
        assert_eq!(classifier.label(), "energy");
    }

    #[cfg(feature = "webrtc")]
    #[test]
    fn webrtc_classifier_builds_with_feature() {
        let classifier = build_classifier(ClassifierKind::WebRtc).unwrap();
        assert_eq!(classifier.label(), "webrtc");
    }

    #[cfg(not(feature = "webrtc"))]
    #[test]
    fn webrtc_classifier_requires_feature() {
        assert!(build_classifier(ClassifierKind::WebRtc).is_err());
    }
}
